//! 认证 Store
//!
//! 协调会话、动态路由注册表与运行时路由器：登录、注销、被动失效清理，
//! 以及角色 / 权限码判断。

use std::collections::BTreeSet;
use std::rc::Rc;

use admin_router_shared::{LoginParams, UserInfo};
use tracing::{debug, info, warn};

use crate::api::AuthApi;
use crate::config::{HOME_PATH, REDIRECT_QUERY_KEY};
use crate::error::RouteResult;
use crate::router::{LiveRouter, Location};

use super::permission::RouteRegistry;
use super::session::{SessionState, SessionStore};

/// 视为超级管理员的角色
pub const SUPER_ADMIN_ROLES: [&str; 2] = ["super_admin", "admin"];

#[derive(Clone)]
pub struct AuthStore {
    session: SessionStore,
    registry: RouteRegistry,
    router: Rc<dyn LiveRouter>,
    api: Rc<dyn AuthApi>,
}

impl AuthStore {
    pub fn new(
        session: SessionStore,
        registry: RouteRegistry,
        router: Rc<dyn LiveRouter>,
        api: Rc<dyn AuthApi>,
    ) -> Self {
        Self {
            session,
            registry,
            router,
            api,
        }
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn registry(&self) -> &RouteRegistry {
        &self.registry
    }

    pub fn is_logged_in(&self) -> bool {
        self.session.is_logged_in()
    }

    pub fn auth_header(&self) -> Option<String> {
        self.session.auth_header()
    }

    pub fn principal(&self) -> Option<UserInfo> {
        self.session.principal()
    }

    // =========================================================
    // 登录 / 注销
    // =========================================================

    /// 登录
    ///
    /// 失败时原样返回错误，会话不变。成功后强制刷新一次权限码：
    /// 刷新返回 401 时新会话已被清理，返回该错误；其它刷新失败只记录日志。
    pub async fn login(&self, params: &LoginParams) -> RouteResult<()> {
        let payload = self.api.login(params).await?;

        let state = SessionState::from_login(payload, self.session.now());
        info!(
            username = %params.username,
            roles = state.roles.len(),
            expires_at = state.expires_at.as_millis(),
            "login succeeded"
        );
        self.session.replace(state);

        match self.load_user_permissions(true).await {
            Err(e) if e.is_unauthorized() => Err(e),
            Err(e) => {
                warn!(error = %e, "permission refresh after login failed");
                Ok(())
            }
            Ok(_) => Ok(()),
        }
    }

    /// 注销：后端调用失败被忽略，本地清理总会执行
    pub async fn logout(&self) {
        if let Err(e) = self.api.logout().await {
            debug!(error = %e, "logout request failed, clearing locally");
        }
        self.clear_auth();
    }

    /// 本地清理
    ///
    /// 顺序固定：先取出已注册的路由名，再重置注册表、清空会话，最后逐个卸载路由。
    pub fn clear_auth(&self) {
        let names = self.registry.registered_route_names();
        self.registry.reset();
        self.session.clear();

        let mut removed = 0;
        for name in &names {
            if self.router.has_route(name) && self.router.remove_route(name) {
                removed += 1;
            }
        }
        info!(removed, "auth cleared");
    }

    /// 拉取权限码；401 视为会话失效并触发本地清理
    pub async fn load_user_permissions(&self, force: bool) -> RouteResult<BTreeSet<String>> {
        match self.registry.load_user_permissions(force).await {
            Err(e) if e.is_unauthorized() => {
                warn!(error = %e, "session rejected by backend");
                self.clear_auth();
                Err(e)
            }
            other => other,
        }
    }

    /// 登录成功后的跳转目标：登录页 `redirect` 参数，缺省为首页
    pub fn post_login_redirect(&self, current: &Location) -> Location {
        match current.query_value(REDIRECT_QUERY_KEY) {
            Some(target) if !target.is_empty() => Location::parse(target),
            _ => Location::new(HOME_PATH),
        }
    }

    // =========================================================
    // 角色 / 权限判断
    // =========================================================

    pub fn has_role(&self, role: &str) -> bool {
        self.session.has_role(role)
    }

    pub fn has_any_role(&self, roles: &[&str]) -> bool {
        roles.iter().any(|r| self.session.has_role(r))
    }

    pub fn has_all_roles(&self, roles: &[&str]) -> bool {
        roles.iter().all(|r| self.session.has_role(r))
    }

    pub fn has_perm(&self, code: &str) -> bool {
        self.registry.has_permission(code)
    }

    pub fn has_any_perm(&self, codes: &[&str]) -> bool {
        codes.iter().any(|c| self.registry.has_permission(c))
    }

    pub fn has_all_perms(&self, codes: &[&str]) -> bool {
        codes.iter().all(|c| self.registry.has_permission(c))
    }

    pub fn is_super_admin(&self) -> bool {
        self.has_any_role(&SUPER_ADMIN_ROLES)
    }
}
