//! 动态路由注册表
//!
//! 负责：
//! 1. 缓存后端返回的原始菜单树
//! 2. 转换为路由树并派生侧边栏、已注册路由名称
//! 3. 维护权限码集合与"路由是否已安装"状态
//!
//! 同一时刻最多一次菜单拉取；并发调用者共享同一个进行中的结果。
//! `reset()` 会推进代数（epoch），代数变化后到达的拉取结果不会被提交。

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use admin_router_shared::MenuRecord;
use futures::future::{FutureExt, LocalBoxFuture, Shared};
use tracing::{debug, info};

use crate::api::PermissionApi;
use crate::error::{RouteError, RouteResult};
use crate::router::{
    LiveRouter, RouteDefinition, ViewCatalog, collect_route_names, resolve_sidebar_routes,
    transform,
};

type BuildFuture = Shared<LocalBoxFuture<'static, RouteResult<Rc<Vec<RouteDefinition>>>>>;

/// 注册表状态
#[derive(Default)]
struct PermissionRegistryState {
    raw_menu_tree: Vec<MenuRecord>,
    route_tree: Vec<RouteDefinition>,
    sidebar_routes: Vec<RouteDefinition>,
    /// 静态路由模式的侧边栏，reset 后保留
    static_sidebar: Vec<RouteDefinition>,
    permission_codes: BTreeSet<String>,
    registered_route_names: Vec<String>,
    routes_installed: bool,
    in_flight: Option<BuildFuture>,
    epoch: u64,
}

/// 动态路由注册表句柄，克隆后共享同一份状态
#[derive(Clone)]
pub struct RouteRegistry {
    state: Rc<RefCell<PermissionRegistryState>>,
    api: Rc<dyn PermissionApi>,
    catalog: Rc<ViewCatalog>,
}

impl RouteRegistry {
    pub fn new(api: Rc<dyn PermissionApi>, catalog: Rc<ViewCatalog>) -> Self {
        Self {
            state: Rc::new(RefCell::new(PermissionRegistryState::default())),
            api,
            catalog,
        }
    }

    // =========================================================
    // 只读访问
    // =========================================================

    pub fn routes_installed(&self) -> bool {
        self.state.borrow().routes_installed
    }

    pub fn is_building(&self) -> bool {
        self.state.borrow().in_flight.is_some()
    }

    pub fn raw_menu_tree(&self) -> Vec<MenuRecord> {
        self.state.borrow().raw_menu_tree.clone()
    }

    pub fn route_tree(&self) -> Vec<RouteDefinition> {
        self.state.borrow().route_tree.clone()
    }

    pub fn sidebar_routes(&self) -> Vec<RouteDefinition> {
        self.state.borrow().sidebar_routes.clone()
    }

    pub fn registered_route_names(&self) -> Vec<String> {
        self.state.borrow().registered_route_names.clone()
    }

    pub fn permission_codes(&self) -> BTreeSet<String> {
        self.state.borrow().permission_codes.clone()
    }

    pub fn has_permission(&self, code: &str) -> bool {
        self.state.borrow().permission_codes.contains(code)
    }

    // =========================================================
    // 动作
    // =========================================================

    /// 构建动态路由树
    ///
    /// 已安装时直接返回缓存的路由树；已有拉取进行中时等待同一结果。
    /// 失败时状态保持未安装，可以重试。
    pub async fn build_routes(&self) -> RouteResult<Vec<RouteDefinition>> {
        let pending = {
            let mut state = self.state.borrow_mut();
            if state.routes_installed {
                return Ok(state.route_tree.clone());
            }
            match &state.in_flight {
                Some(pending) => {
                    debug!("route build already in flight, joining");
                    pending.clone()
                }
                None => {
                    let this = self.clone();
                    let epoch = state.epoch;
                    let pending = async move { this.fetch_and_commit(epoch).await }
                        .boxed_local()
                        .shared();
                    state.in_flight = Some(pending.clone());
                    pending
                }
            }
        };

        pending.await.map(|routes| routes.as_ref().clone())
    }

    async fn fetch_and_commit(&self, epoch: u64) -> RouteResult<Rc<Vec<RouteDefinition>>> {
        let result = self.fetch(epoch).await;

        let mut state = self.state.borrow_mut();
        if state.epoch != epoch {
            // reset 已经清理过 in_flight，这里不能再动新一代的状态
            debug!(epoch, current = state.epoch, "discarding superseded route build");
            return Err(RouteError::Superseded);
        }
        state.in_flight = None;

        let (raw_menu_tree, permission_codes) = result?;
        let route_tree = transform(&raw_menu_tree, true, &self.catalog);
        state.sidebar_routes = resolve_sidebar_routes(&route_tree);
        state.registered_route_names = collect_route_names(&route_tree);
        state.route_tree = route_tree.clone();
        state.raw_menu_tree = raw_menu_tree;
        if let Some(codes) = permission_codes {
            state.permission_codes = codes;
        }
        state.routes_installed = true;

        info!(
            routes = state.registered_route_names.len(),
            perms = state.permission_codes.len(),
            "dynamic routes built"
        );
        Ok(Rc::new(route_tree))
    }

    /// 拉取菜单树，权限码为空时一并拉取
    async fn fetch(&self, epoch: u64) -> RouteResult<(Vec<MenuRecord>, Option<BTreeSet<String>>)> {
        let menus = self.api.current_user_routes().await?;

        let need_codes = {
            let state = self.state.borrow();
            state.epoch == epoch && state.permission_codes.is_empty()
        };
        let codes = if need_codes {
            Some(self.api.current_user_permissions().await?.into_iter().collect())
        } else {
            None
        };
        Ok((menus, codes))
    }

    /// 拉取当前用户权限码
    ///
    /// 非强制且缓存非空时直接返回缓存；期间发生 reset 则结果作废。
    pub async fn load_user_permissions(&self, force: bool) -> RouteResult<BTreeSet<String>> {
        let epoch = {
            let state = self.state.borrow();
            if !force && !state.permission_codes.is_empty() {
                return Ok(state.permission_codes.clone());
            }
            state.epoch
        };

        let codes: BTreeSet<String> = self.api.current_user_permissions().await?.into_iter().collect();

        let mut state = self.state.borrow_mut();
        if state.epoch != epoch {
            return Err(RouteError::Superseded);
        }
        state.permission_codes = codes.clone();
        debug!(count = codes.len(), "permission codes loaded");
        Ok(codes)
    }

    /// 把路由树注册到运行时路由器
    pub fn install(&self, router: &dyn LiveRouter, routes: &[RouteDefinition]) {
        for route in routes {
            router.add_route(route);
        }
    }

    /// 静态路由模式：直接设置侧边栏
    ///
    /// 静态侧边栏与进程同生命周期，`reset()` 之后仍然生效。
    pub fn set_static_sidebar(&self, routes: Vec<RouteDefinition>) {
        let mut state = self.state.borrow_mut();
        state.sidebar_routes = routes.clone();
        state.static_sidebar = routes;
    }

    /// 清空会话相关状态并推进代数，可在任意时刻安全调用
    pub fn reset(&self) {
        let mut state = self.state.borrow_mut();
        let epoch = state.epoch.wrapping_add(1);
        let static_sidebar = std::mem::take(&mut state.static_sidebar);
        *state = PermissionRegistryState {
            epoch,
            sidebar_routes: static_sidebar.clone(),
            static_sidebar,
            ..Default::default()
        };
        debug!(epoch, "route registry reset");
    }
}
