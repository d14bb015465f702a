use std::rc::Rc;

use tracing::info;

pub mod api;
pub mod clock;
pub mod config;
pub mod error;
pub mod feedback;
pub mod guard;
pub mod navigator;
pub mod request;
pub mod router;
pub mod storage;
pub mod store;

#[cfg(test)]
mod testing;

pub use admin_router_shared as shared;
pub use api::{AdminApi, AuthApi, PermissionApi};
pub use clock::{Clock, SystemClock};
pub use config::{AuthMode, RouterConfig};
pub use error::{RouteError, RouteResult};
pub use feedback::{MessageSink, ProgressIndicator, TracingMessages, TracingProgress};
pub use guard::{GuardOutcome, NavigationGuard, NavigationState};
pub use navigator::{Navigator, ResolvedNavigation};
pub use request::{HttpClient, ReqwestHttpClient};
pub use router::{LiveRouter, Location, RouteDefinition, RouteTable, ViewCatalog};
pub use storage::{ExpiringStorage, MemoryStorage, Persistence, StorageBackend};
pub use store::{AuthStore, RouteRegistry, SessionStore};

// =========================================================
// 组装 (Bootstrap)
// =========================================================

/// 组装完成的路由核心
pub struct AdminRouter {
    pub config: Rc<RouterConfig>,
    pub router: Rc<dyn LiveRouter>,
    pub auth: AuthStore,
    pub navigator: Navigator,
}

impl AdminRouter {
    pub fn builder(config: RouterConfig) -> AdminRouterBuilder {
        AdminRouterBuilder::new(config)
    }

    /// 使用 reqwest 客户端与内存存储连接到配置中的后端
    pub fn connect(config: RouterConfig) -> RouteResult<Self> {
        let client = ReqwestHttpClient::new(config.request_timeout)?;
        let base_url = config.api_base_url.clone();
        Ok(Self::builder(config).build(move |session| Rc::new(AdminApi::new(&base_url, client, session))))
    }

    pub fn session(&self) -> &SessionStore {
        self.auth.session()
    }

    pub fn registry(&self) -> &RouteRegistry {
        self.auth.registry()
    }
}

/// 协作者均有默认实现，按需替换
pub struct AdminRouterBuilder {
    config: RouterConfig,
    catalog: ViewCatalog,
    clock: Rc<dyn Clock>,
    persistence: Option<Rc<dyn Persistence>>,
    router: Option<Rc<dyn LiveRouter>>,
    progress: Rc<dyn ProgressIndicator>,
    messages: Rc<dyn MessageSink>,
    static_routes: Vec<RouteDefinition>,
}

impl AdminRouterBuilder {
    pub fn new(config: RouterConfig) -> Self {
        Self {
            config,
            catalog: ViewCatalog::new(),
            clock: Rc::new(SystemClock),
            persistence: None,
            router: None,
            progress: Rc::new(TracingProgress),
            messages: Rc::new(TracingMessages),
            static_routes: Vec::new(),
        }
    }

    pub fn with_catalog(mut self, catalog: ViewCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_clock(mut self, clock: Rc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_persistence(mut self, persistence: Rc<dyn Persistence>) -> Self {
        self.persistence = Some(persistence);
        self
    }

    /// 替换运行时路由器；调用方负责注册基础路由
    pub fn with_router(mut self, router: Rc<dyn LiveRouter>) -> Self {
        self.router = Some(router);
        self
    }

    pub fn with_progress(mut self, progress: Rc<dyn ProgressIndicator>) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_messages(mut self, messages: Rc<dyn MessageSink>) -> Self {
        self.messages = messages;
        self
    }

    /// 静态路由模式下安装的固定路由表
    pub fn with_static_routes(mut self, routes: Vec<RouteDefinition>) -> Self {
        self.static_routes = routes;
        self
    }

    /// 组装
    ///
    /// `make_api` 接收会话句柄，使接口层可以读取 token 而会话不依赖接口层。
    pub fn build<A, F>(self, make_api: F) -> AdminRouter
    where
        A: AuthApi + PermissionApi + 'static,
        F: FnOnce(SessionStore) -> Rc<A>,
    {
        let config = Rc::new(self.config);

        let persistence: Rc<dyn Persistence> = match self.persistence {
            Some(persistence) => persistence,
            None => Rc::new(ExpiringStorage::new(
                MemoryStorage::new(),
                config.storage_prefix.as_str(),
                self.clock.clone(),
            )),
        };
        let session = SessionStore::new(persistence, self.clock.clone(), config.session_key.as_str());

        let api = make_api(session.clone());
        let registry = RouteRegistry::new(api.clone(), Rc::new(self.catalog));

        let router: Rc<dyn LiveRouter> = match self.router {
            Some(router) => router,
            None => {
                let table = RouteTable::new();
                for route in router::basic_routes() {
                    table.add_route(&route);
                }
                Rc::new(table)
            }
        };

        let auth = AuthStore::new(session, registry, router.clone(), api);
        let guard = NavigationGuard::new(config.clone(), auth.clone(), router.clone(), self.messages);
        let navigator = Navigator::new(config.clone(), guard, auth.clone(), router.clone(), self.progress);

        if !config.is_dynamic() {
            navigator.install_static_routes(self.static_routes);
        }

        info!(
            mode = %config.auth_mode,
            logged_in = auth.is_logged_in(),
            "admin router ready"
        );

        AdminRouter {
            config,
            router,
            auth,
            navigator,
        }
    }
}
