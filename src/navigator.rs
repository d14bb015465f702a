//! 导航器
//!
//! 驱动一次完整导航：进度条 -> 守卫（重定向 / 延迟重试）-> 路由解析 -> 后置钩子
//! （文档标题、页面滚动开关、进度条结束）。

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use crate::config::RouterConfig;
use crate::error::{RouteError, RouteResult};
use crate::feedback::ProgressIndicator;
use crate::guard::{GuardOutcome, NavigationGuard, NavigationState};
use crate::router::{LiveRouter, Location, MatchedRoute, RouteDefinition, resolve_sidebar_routes};
use crate::store::AuthStore;

/// 单次导航允许的最大跳转次数
pub const MAX_REDIRECTS: usize = 10;

/// 一次已完成的导航
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedNavigation {
    pub id: Uuid,
    pub location: Location,
    /// 从根到叶子的匹配链
    pub matched: Vec<MatchedRoute>,
    pub document_title: String,
    pub page_scrollable: bool,
}

impl ResolvedNavigation {
    pub fn leaf(&self) -> Option<&MatchedRoute> {
        self.matched.last()
    }
}

pub struct Navigator {
    config: Rc<RouterConfig>,
    guard: NavigationGuard,
    auth: AuthStore,
    router: Rc<dyn LiveRouter>,
    progress: Rc<dyn ProgressIndicator>,
    state: Cell<NavigationState>,
    current: RefCell<Option<ResolvedNavigation>>,
}

impl Navigator {
    pub fn new(
        config: Rc<RouterConfig>,
        guard: NavigationGuard,
        auth: AuthStore,
        router: Rc<dyn LiveRouter>,
        progress: Rc<dyn ProgressIndicator>,
    ) -> Self {
        Self {
            config,
            guard,
            auth,
            router,
            progress,
            state: Cell::new(NavigationState::Unchecked),
            current: RefCell::new(None),
        }
    }

    pub fn auth(&self) -> &AuthStore {
        &self.auth
    }

    /// 最近一次守卫求值的状态
    pub fn state(&self) -> NavigationState {
        self.state.get()
    }

    pub fn current(&self) -> Option<ResolvedNavigation> {
        self.current.borrow().clone()
    }

    /// 当前文档标题，尚未导航时为应用标题
    pub fn document_title(&self) -> String {
        self.current
            .borrow()
            .as_ref()
            .map(|nav| nav.document_title.clone())
            .unwrap_or_else(|| self.config.app_title.clone())
    }

    pub fn page_scrollable(&self) -> bool {
        self.current
            .borrow()
            .as_ref()
            .is_some_and(|nav| nav.page_scrollable)
    }

    /// 静态路由模式：注册固定路由表并同步侧边栏
    pub fn install_static_routes(&self, routes: Vec<RouteDefinition>) {
        let registry = self.auth.registry();
        registry.install(self.router.as_ref(), &routes);
        registry.set_static_sidebar(resolve_sidebar_routes(&routes));
        info!(count = routes.len(), "static routes installed");
    }

    /// 导航到目标位置
    pub async fn push(&self, target: impl Into<Location>) -> RouteResult<ResolvedNavigation> {
        let target = target.into();
        let id = Uuid::new_v4();
        let span = info_span!("navigation", %id, to = %target);
        self.navigate(id, target).instrument(span).await
    }

    async fn navigate(&self, id: Uuid, target: Location) -> RouteResult<ResolvedNavigation> {
        self.state.set(NavigationState::Unchecked);
        self.progress.start();

        match self.resolve(id, target).await {
            Ok(nav) => {
                // 后置钩子
                debug!(
                    path = %nav.location.path,
                    title = %nav.document_title,
                    scrollable = nav.page_scrollable,
                    "navigation finished"
                );
                *self.current.borrow_mut() = Some(nav.clone());
                self.progress.finish();
                Ok(nav)
            }
            Err(e) => {
                warn!(error = %e, "navigation failed");
                self.state.set(NavigationState::DeniedError);
                self.progress.error();
                Err(e)
            }
        }
    }

    /// 循环求值守卫直到放行并解析出匹配链
    async fn resolve(&self, id: Uuid, mut to: Location) -> RouteResult<ResolvedNavigation> {
        let mut retried = false;

        for _ in 0..MAX_REDIRECTS {
            let outcome = self.guard.before_each(&to, retried).await;
            self.state.set(outcome.state());
            debug!(to = %to, state = %outcome.state(), "guard evaluated");

            match outcome {
                GuardOutcome::Allowed => match self.router.resolve(&to.path) {
                    Some(matched) => {
                        if let Some(redirect) = matched.last().and_then(|m| m.redirect.clone()) {
                            to = Location::parse(&redirect).replaced();
                            retried = false;
                            continue;
                        }
                        return Ok(self.resolved(id, to, matched));
                    }
                    None if to.path == self.config.not_found_path => {
                        return Ok(self.resolved(id, to, Vec::new()));
                    }
                    None => {
                        debug!(path = %to.path, "no route matched");
                        to = Location::new(self.config.not_found_path.as_str()).replaced();
                        retried = false;
                    }
                },
                GuardOutcome::Redirected(next) => {
                    to = next;
                    retried = false;
                }
                GuardOutcome::DeferredRetry(next) => {
                    to = next;
                    retried = true;
                }
                GuardOutcome::DeniedError(e) => return Err(e),
            }
        }

        Err(RouteError::RedirectLoop(MAX_REDIRECTS))
    }

    fn resolved(&self, id: Uuid, location: Location, matched: Vec<MatchedRoute>) -> ResolvedNavigation {
        ResolvedNavigation {
            id,
            document_title: self.document_title_for(&matched),
            page_scrollable: page_scrollable(&matched),
            location,
            matched,
        }
    }

    /// `<标题> - <应用标题>`，没有标题时只用应用标题
    fn document_title_for(&self, matched: &[MatchedRoute]) -> String {
        let title = matched
            .iter()
            .rev()
            .find_map(|m| m.meta.as_ref().and_then(|meta| meta.title.as_deref()))
            .filter(|t| !t.is_empty());
        match title {
            Some(title) => format!("{} - {}", title, self.config.app_title),
            None => self.config.app_title.clone(),
        }
    }
}

/// 从最具体的匹配项向上找第一个显式声明的 scrollable，默认不可滚动
fn page_scrollable(matched: &[MatchedRoute]) -> bool {
    matched
        .iter()
        .rev()
        .find_map(|m| m.meta.as_ref().and_then(|meta| meta.scrollable))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuthMode;
    use crate::router::{ComponentRef, RouteMeta};
    use crate::testing::{TestApp, static_routes};

    fn navigator(app: &TestApp) -> Navigator {
        Navigator::new(
            app.config.clone(),
            app.guard(),
            app.auth.clone(),
            app.table.clone(),
            app.feedback.clone(),
        )
    }

    fn matched(name: &str, meta: Option<RouteMeta>) -> MatchedRoute {
        MatchedRoute {
            name: name.into(),
            full_path: format!("/{}", name),
            component: Some(ComponentRef::Layout),
            redirect: None,
            meta,
            params: Default::default(),
        }
    }

    #[tokio::test]
    async fn test_dynamic_first_visit_builds_once_and_lands() {
        let app = TestApp::new(AuthMode::Dynamic);
        app.login().await;
        let nav = navigator(&app);

        let resolved = nav.push("/system/user").await.unwrap();
        assert_eq!(resolved.location.path, "/system/user");
        assert!(resolved.location.replace);
        assert_eq!(resolved.leaf().unwrap().name, "User");
        assert_eq!(nav.state(), NavigationState::Allowed);
        assert_eq!(app.perm_api.route_calls.get(), 1);

        nav.push("/system/role").await.unwrap();
        assert_eq!(app.perm_api.route_calls.get(), 1);
        assert_eq!(
            app.feedback.events(),
            vec!["progress:start", "progress:finish", "progress:start", "progress:finish"]
        );
    }

    #[tokio::test]
    async fn test_root_follows_synthesized_redirect() {
        let app = TestApp::new(AuthMode::Dynamic);
        app.login().await;
        let nav = navigator(&app);

        let resolved = nav.push("/").await.unwrap();
        assert_eq!(resolved.location.path, "/dashboard");
    }

    #[tokio::test]
    async fn test_anonymous_visit_lands_on_login() {
        let app = TestApp::new(AuthMode::Dynamic);
        let nav = navigator(&app);

        let resolved = nav.push("/system/user").await.unwrap();
        assert_eq!(resolved.location.path, "/login");
        assert_eq!(resolved.location.query_value("redirect"), Some("/system/user"));
        assert_eq!(resolved.document_title, format!("登录 - {}", app.config.app_title));
    }

    #[tokio::test]
    async fn test_unknown_path_goes_to_not_found() {
        let app = TestApp::new(AuthMode::Dynamic);
        app.login().await;
        let nav = navigator(&app);

        let resolved = nav.push("/no/such/page").await.unwrap();
        assert_eq!(resolved.location.path, "/404");
        assert_eq!(resolved.leaf().unwrap().name, "NotFound");
    }

    #[tokio::test]
    async fn test_static_mode_uses_fixed_table() {
        let app = TestApp::new(AuthMode::Static);
        app.login().await;
        let nav = navigator(&app);
        nav.install_static_routes(static_routes());

        assert_eq!(app.auth.registry().sidebar_routes().len(), 1);
        assert!(app.table.has_route("Dashboard"));
        // 静态路由不登记为动态路由名，注销时不会被卸载
        assert!(app.auth.registry().registered_route_names().is_empty());

        let resolved = nav.push("/").await.unwrap();
        assert_eq!(resolved.location.path, "/dashboard");
        assert_eq!(app.perm_api.route_calls.get(), 0);

        app.auth.clear_auth();
        assert!(app.table.has_route("Dashboard"));
        assert_eq!(app.auth.registry().sidebar_routes().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_menu_tree_lands_on_not_found() {
        let app = TestApp::new(AuthMode::Dynamic);
        app.login().await;
        // 构建成功但不产出任何路由：重试时已标记安装，不会再次拉取
        *app.perm_api.menus.borrow_mut() = Ok(Vec::new());
        let nav = navigator(&app);

        let resolved = nav.push("/system/user").await.unwrap();
        assert_eq!(resolved.location.path, "/404");
        assert_eq!(app.perm_api.route_calls.get(), 1);
    }

    #[tokio::test]
    async fn test_route_fetch_failure_lands_on_login() {
        let app = TestApp::new(AuthMode::Dynamic);
        app.login().await;
        app.perm_api.fail_menus(RouteError::Transport("offline".into()));
        let nav = navigator(&app);

        let resolved = nav.push("/system/user").await.unwrap();
        assert_eq!(resolved.location.path, "/login");
        assert_eq!(resolved.location.query_value("redirect"), Some("/system/user"));
        assert!(!nav.auth().is_logged_in());
    }

    #[tokio::test]
    async fn test_redirect_loop_is_bounded() {
        let app = TestApp::new(AuthMode::Dynamic);
        app.login().await;
        let nav = navigator(&app);
        app.table.add_route(&RouteDefinition::new("/a", "A").with_redirect("/b"));
        app.table.add_route(&RouteDefinition::new("/b", "B").with_redirect("/a"));
        app.auth.registry().build_routes().await.unwrap();

        let err = nav.push("/a").await.unwrap_err();
        assert_eq!(err, RouteError::RedirectLoop(MAX_REDIRECTS));
        assert_eq!(nav.state(), NavigationState::DeniedError);
        assert_eq!(app.feedback.events().last().map(String::as_str), Some("progress:error"));
    }

    #[tokio::test]
    async fn test_title_falls_back_to_app_title() {
        let app = TestApp::new(AuthMode::Dynamic);
        app.login().await;
        let nav = navigator(&app);
        assert_eq!(nav.document_title(), app.config.app_title);

        let resolved = nav.push("/system/user").await.unwrap();
        assert_eq!(resolved.document_title, app.config.app_title);
        assert!(!nav.page_scrollable());
    }

    #[test]
    fn test_scrollable_prefers_most_specific_declaration() {
        let scroll = |value| {
            Some(RouteMeta {
                scrollable: Some(value),
                ..Default::default()
            })
        };

        let chain = vec![matched("layout", scroll(true)), matched("page", None)];
        assert!(page_scrollable(&chain));

        let chain = vec![matched("layout", scroll(true)), matched("page", scroll(false))];
        assert!(!page_scrollable(&chain));

        let chain = vec![matched("layout", None), matched("page", Some(RouteMeta::titled("x")))];
        assert!(!page_scrollable(&chain));
        assert!(!page_scrollable(&[]));
    }
}
