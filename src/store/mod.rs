//! 应用级状态：会话、动态路由注册表、认证协调

pub mod auth;
pub mod permission;
pub mod session;

pub use auth::{AuthStore, SUPER_ADMIN_ROLES};
pub use permission::RouteRegistry;
pub use session::{SessionState, SessionStore};
