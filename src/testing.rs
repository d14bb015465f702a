// =========================================================
// 测试工具: 协作者 Mock
// =========================================================

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use admin_router_shared::{LoginParams, LoginPayload, MenuRecord, MenuType};
use futures::channel::oneshot;

use crate::api::{AuthApi, PermissionApi};
use crate::clock::ManualClock;
use crate::config::{AuthMode, RouterConfig};
use crate::error::{RouteError, RouteResult};
use crate::feedback::RecordingFeedback;
use crate::guard::NavigationGuard;
use crate::router::{
    ComponentRef, LiveRouter, Location, RouteDefinition, RouteTable, ViewCatalog, basic_routes,
};
use crate::storage::{ExpiringStorage, MemoryStorage};
use crate::store::{AuthStore, RouteRegistry, SessionStore};

/// 菜单 / 权限接口 Mock
///
/// `hold()` 之后的下一次菜单请求会挂起，直到返回的 Sender 被触发或丢弃。
pub struct MockPermissionApi {
    pub menus: RefCell<RouteResult<Vec<MenuRecord>>>,
    pub perms: RefCell<RouteResult<Vec<String>>>,
    pub route_calls: Cell<usize>,
    pub perm_calls: Cell<usize>,
    gate: RefCell<Option<oneshot::Receiver<()>>>,
}

impl MockPermissionApi {
    pub fn new(menus: Vec<MenuRecord>, perms: Vec<&str>) -> Self {
        Self {
            menus: RefCell::new(Ok(menus)),
            perms: RefCell::new(Ok(perms.into_iter().map(String::from).collect())),
            route_calls: Cell::new(0),
            perm_calls: Cell::new(0),
            gate: RefCell::new(None),
        }
    }

    pub fn fail_menus(&self, err: RouteError) {
        *self.menus.borrow_mut() = Err(err);
    }

    pub fn fail_perms(&self, err: RouteError) {
        *self.perms.borrow_mut() = Err(err);
    }

    pub fn hold(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.gate.borrow_mut() = Some(rx);
        tx
    }
}

#[async_trait::async_trait(?Send)]
impl PermissionApi for MockPermissionApi {
    async fn current_user_permissions(&self) -> RouteResult<Vec<String>> {
        self.perm_calls.set(self.perm_calls.get() + 1);
        self.perms.borrow().clone()
    }

    async fn current_user_routes(&self) -> RouteResult<Vec<MenuRecord>> {
        self.route_calls.set(self.route_calls.get() + 1);
        let gate = self.gate.borrow_mut().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        self.menus.borrow().clone()
    }
}

/// 认证接口 Mock
pub struct MockAuthApi {
    pub login_result: RefCell<RouteResult<LoginPayload>>,
    pub logout_result: RefCell<RouteResult<()>>,
    pub login_calls: Cell<usize>,
    pub logout_calls: Cell<usize>,
}

impl MockAuthApi {
    pub fn new(payload: LoginPayload) -> Self {
        Self {
            login_result: RefCell::new(Ok(payload)),
            logout_result: RefCell::new(Ok(())),
            login_calls: Cell::new(0),
            logout_calls: Cell::new(0),
        }
    }
}

#[async_trait::async_trait(?Send)]
impl AuthApi for MockAuthApi {
    async fn login(&self, _params: &LoginParams) -> RouteResult<LoginPayload> {
        self.login_calls.set(self.login_calls.get() + 1);
        self.login_result.borrow().clone()
    }

    async fn logout(&self) -> RouteResult<()> {
        self.logout_calls.set(self.logout_calls.get() + 1);
        self.logout_result.borrow().clone()
    }
}

// =========================================================
// 测试数据
// =========================================================

/// 一个有效期一小时的登录返回
pub fn login_payload(token: &str, roles: &[&str]) -> LoginPayload {
    LoginPayload {
        access_token: token.to_string(),
        expires_in: Some(3600),
        roles: roles.iter().map(|r| r.to_string()).collect(),
        ..Default::default()
    }
}

/// 系统管理目录（用户 / 角色）+ 仪表盘，带按钮节点
pub fn sample_menus() -> Vec<MenuRecord> {
    vec![
        MenuRecord::new("1", MenuType::Directory, "system")
            .with_name("System")
            .with_order(2)
            .with_children(vec![
                MenuRecord::new("11", MenuType::Page, "user")
                    .with_name("User")
                    .with_component("system/user")
                    .with_order(1)
                    .with_children(vec![MenuRecord::new("111", MenuType::Button, "")]),
                MenuRecord::new("12", MenuType::Page, "role")
                    .with_name("Role")
                    .with_component("system/role")
                    .with_order(2),
            ]),
        MenuRecord::new("2", MenuType::Page, "dashboard")
            .with_name("Dashboard")
            .with_component("dashboard")
            .with_order(1),
    ]
}

pub fn sample_catalog() -> ViewCatalog {
    ViewCatalog::from_keys([
        "dashboard/index.view",
        "system/user/index.view",
        "system/role/index.view",
    ])
}

/// 静态模式下使用的固定路由表
pub fn static_routes() -> Vec<RouteDefinition> {
    vec![
        RouteDefinition::new("/", "Layout")
            .with_component(ComponentRef::Layout)
            .with_redirect("/dashboard")
            .with_children(vec![
                RouteDefinition::new("dashboard", "Dashboard")
                    .with_component(ComponentRef::View("dashboard/index.view".into())),
            ]),
    ]
}

pub fn loc(raw: &str) -> Location {
    Location::parse(raw)
}

// =========================================================
// 组装好的测试应用
// =========================================================

pub const TEST_NOW: i64 = 1_700_000_000_000;

/// 全部协作者均为 Mock 的应用组装
pub struct TestApp {
    pub config: Rc<RouterConfig>,
    pub clock: Rc<ManualClock>,
    pub storage: MemoryStorage,
    pub table: Rc<RouteTable>,
    pub auth_api: Rc<MockAuthApi>,
    pub perm_api: Rc<MockPermissionApi>,
    pub feedback: Rc<RecordingFeedback>,
    pub auth: AuthStore,
}

impl TestApp {
    pub fn new(mode: AuthMode) -> Self {
        let config = Rc::new(RouterConfig::default().with_auth_mode(mode));
        let clock = Rc::new(ManualClock::new(TEST_NOW));
        let storage = MemoryStorage::new();
        let persistence = Rc::new(ExpiringStorage::new(storage.clone(), "", clock.clone()));
        let session = SessionStore::new(persistence, clock.clone(), config.session_key.as_str());

        let perm_api = Rc::new(MockPermissionApi::new(sample_menus(), vec!["system:user:list"]));
        let registry = RouteRegistry::new(perm_api.clone(), Rc::new(sample_catalog()));

        let table = Rc::new(RouteTable::new());
        for route in basic_routes() {
            table.add_route(&route);
        }

        let auth_api = Rc::new(MockAuthApi::new(login_payload("t1", &["admin"])));
        let auth = AuthStore::new(session, registry, table.clone(), auth_api.clone());

        Self {
            config,
            clock,
            storage,
            table,
            auth_api,
            perm_api,
            feedback: Rc::new(RecordingFeedback::default()),
            auth,
        }
    }

    pub fn guard(&self) -> NavigationGuard {
        NavigationGuard::new(
            self.config.clone(),
            self.auth.clone(),
            self.table.clone(),
            self.feedback.clone(),
        )
    }

    /// 登录并清零调用计数
    pub async fn login(&self) {
        self.auth
            .login(&LoginParams::new("admin", "pw"))
            .await
            .unwrap();
        self.perm_api.perm_calls.set(0);
        self.perm_api.route_calls.set(0);
    }
}
