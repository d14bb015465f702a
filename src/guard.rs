//! 导航守卫 - 状态机
//!
//! 每次导航前求值一次，产出 放行 / 重定向 / 延迟重试 / 拒绝 之一。
//! 动态路由模式下首次进入受保护页面时构建并安装路由，然后要求以同一目标重试一次；
//! 重试时若路由仍未安装则拒绝，避免无限重入。

use std::fmt;
use std::rc::Rc;

use tracing::{debug, error, warn};

use crate::config::{REDIRECT_QUERY_KEY, RouterConfig};
use crate::error::RouteError;
use crate::feedback::MessageSink;
use crate::router::{LiveRouter, Location};
use crate::store::AuthStore;

/// 动态路由加载失败时的用户提示
pub const ROUTE_LOAD_FAILED_MESSAGE: &str = "加载动态路由失败，请重新登录";

/// 守卫状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NavigationState {
    /// 尚未求值
    #[default]
    Unchecked,
    Allowed,
    Redirected,
    /// 路由刚刚安装，以同一目标重新导航
    DeferredRetry,
    DeniedError,
}

impl fmt::Display for NavigationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NavigationState::Unchecked => "unchecked",
            NavigationState::Allowed => "allowed",
            NavigationState::Redirected => "redirected",
            NavigationState::DeferredRetry => "deferred_retry",
            NavigationState::DeniedError => "denied_error",
        };
        f.write_str(s)
    }
}

/// 守卫求值结果
#[derive(Debug, Clone, PartialEq)]
pub enum GuardOutcome {
    Allowed,
    Redirected(Location),
    DeferredRetry(Location),
    DeniedError(RouteError),
}

impl GuardOutcome {
    pub fn state(&self) -> NavigationState {
        match self {
            GuardOutcome::Allowed => NavigationState::Allowed,
            GuardOutcome::Redirected(_) => NavigationState::Redirected,
            GuardOutcome::DeferredRetry(_) => NavigationState::DeferredRetry,
            GuardOutcome::DeniedError(_) => NavigationState::DeniedError,
        }
    }
}

pub struct NavigationGuard {
    config: Rc<RouterConfig>,
    auth: AuthStore,
    router: Rc<dyn LiveRouter>,
    messages: Rc<dyn MessageSink>,
}

impl NavigationGuard {
    pub fn new(
        config: Rc<RouterConfig>,
        auth: AuthStore,
        router: Rc<dyn LiveRouter>,
        messages: Rc<dyn MessageSink>,
    ) -> Self {
        Self {
            config,
            auth,
            router,
            messages,
        }
    }

    /// 带原目标的登录页位置
    pub fn login_redirect(&self, to: &Location) -> Location {
        Location::new(self.config.login_path.as_str()).with_query(REDIRECT_QUERY_KEY, to.full_path())
    }

    /// 导航前求值
    ///
    /// `retried` 表示本次是延迟重试后的第二次求值。
    pub async fn before_each(&self, to: &Location, retried: bool) -> GuardOutcome {
        let logged_in = self.auth.is_logged_in();

        // --- Step 1: 白名单 ---
        if self.config.is_access_free(&to.path) {
            if logged_in && to.path == self.config.login_path {
                debug!("already logged in, leaving login page");
                return GuardOutcome::Redirected(Location::new(self.config.home_path.as_str()));
            }
            return GuardOutcome::Allowed;
        }

        // --- Step 2: 未登录 ---
        if !logged_in {
            debug!(to = %to, "not logged in, redirecting to login");
            return GuardOutcome::Redirected(self.login_redirect(to));
        }

        let registry = self.auth.registry();

        // --- Step 3: 动态路由 ---
        if self.config.is_dynamic() && !registry.routes_installed() {
            if retried {
                error!(to = %to, "routes still not installed after retry");
                return GuardOutcome::DeniedError(RouteError::RoutesUnavailable);
            }
            loop {
                match registry.build_routes().await {
                    Ok(routes) => {
                        registry.install(self.router.as_ref(), &routes);
                        return GuardOutcome::DeferredRetry(to.clone().replaced());
                    }
                    // 构建期间会话被清理：旧结果作废，按当前会话重新求值
                    Err(RouteError::Superseded) if self.auth.is_logged_in() => {
                        debug!(to = %to, "route build superseded, rebuilding for new session");
                    }
                    Err(RouteError::Superseded) => {
                        debug!(to = %to, "route build superseded by logout");
                        return GuardOutcome::Redirected(self.login_redirect(to));
                    }
                    Err(e) => {
                        error!(error = %e, to = %to, "failed to load dynamic routes");
                        self.messages.error(ROUTE_LOAD_FAILED_MESSAGE);
                        self.auth.logout().await;
                        return GuardOutcome::Redirected(self.login_redirect(to));
                    }
                }
            }
        }

        // --- Step 4: 静态路由下补拉权限码，失败不阻塞导航 ---
        if !self.config.is_dynamic() && registry.permission_codes().is_empty() {
            if let Err(e) = self.auth.load_user_permissions(false).await {
                warn!(error = %e, "failed to load permission codes");
            }
        }

        // --- Step 5: 放行 ---
        GuardOutcome::Allowed
    }
}
