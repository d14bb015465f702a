//! 运行时配置
//!
//! 默认值由 `DEFAULT_*` 常量给出，可通过环境变量覆盖。

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{RouteError, RouteResult};

// =========================================================
// 默认值
// =========================================================

const DEFAULT_APP_TITLE: &str = "善宇管理系统";
const DEFAULT_API_URL: &str = "http://localhost:8091/api";
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 15_000;
const DEFAULT_STORAGE_PREFIX: &str = "";
const DEFAULT_SESSION_KEY: &str = "auth";

pub const LOGIN_PATH: &str = "/login";
pub const HOME_PATH: &str = "/";
pub const NO_PERMISSION_PATH: &str = "/403";
pub const NOT_FOUND_PATH: &str = "/404";
pub const SERVER_ERROR_PATH: &str = "/500";

/// 登录后回跳目标的 query 参数名
pub const REDIRECT_QUERY_KEY: &str = "redirect";

// =========================================================
// 路由权限模式
// =========================================================

/// 路由权限模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthMode {
    /// 路由表在构建期固定，只拉取权限码用于按钮级校验
    Static,
    /// 每个会话从后端拉取菜单树并动态注册路由
    #[default]
    Dynamic,
}

impl FromStr for AuthMode {
    type Err = RouteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "static" => Ok(AuthMode::Static),
            "dynamic" => Ok(AuthMode::Dynamic),
            other => Err(RouteError::invalid_config(
                "ADMIN_AUTH_MODE",
                format!("expected static|dynamic, got {:?}", other),
            )),
        }
    }
}

impl fmt::Display for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthMode::Static => write!(f, "static"),
            AuthMode::Dynamic => write!(f, "dynamic"),
        }
    }
}

// =========================================================
// RouterConfig
// =========================================================

/// 路由核心配置
#[derive(Debug, Clone)]
pub struct RouterConfig {
    pub auth_mode: AuthMode,
    /// 应用标题，作为文档标题的后缀和兜底
    pub app_title: String,
    pub api_base_url: String,
    pub request_timeout: Duration,
    pub login_path: String,
    pub home_path: String,
    pub not_found_path: String,
    /// 免登录白名单
    pub allow_list: Vec<String>,
    pub storage_prefix: String,
    pub session_key: String,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            auth_mode: AuthMode::default(),
            app_title: DEFAULT_APP_TITLE.to_string(),
            api_base_url: DEFAULT_API_URL.to_string(),
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
            login_path: LOGIN_PATH.to_string(),
            home_path: HOME_PATH.to_string(),
            not_found_path: NOT_FOUND_PATH.to_string(),
            allow_list: [LOGIN_PATH, NO_PERMISSION_PATH, NOT_FOUND_PATH, SERVER_ERROR_PATH]
                .iter()
                .map(|p| p.to_string())
                .collect(),
            storage_prefix: DEFAULT_STORAGE_PREFIX.to_string(),
            session_key: DEFAULT_SESSION_KEY.to_string(),
        }
    }
}

impl RouterConfig {
    /// 从进程环境变量读取配置
    pub fn from_env() -> RouteResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 从任意查找函数读取配置，读不到的键使用默认值
    pub fn from_lookup<F>(lookup: F) -> RouteResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(mode) = lookup("ADMIN_AUTH_MODE") {
            config.auth_mode = mode.parse()?;
        }
        if let Some(title) = lookup("ADMIN_APP_TITLE") {
            config.app_title = title;
        }
        if let Some(url) = lookup("ADMIN_API_URL") {
            config.api_base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(ms) = lookup("ADMIN_REQUEST_TIMEOUT_MS") {
            let ms: u64 = ms.trim().parse().map_err(|e| {
                RouteError::invalid_config("ADMIN_REQUEST_TIMEOUT_MS", format!("{}", e))
            })?;
            config.request_timeout = Duration::from_millis(ms);
        }
        if let Some(prefix) = lookup("ADMIN_STORAGE_PREFIX") {
            config.storage_prefix = prefix;
        }

        Ok(config)
    }

    pub fn with_auth_mode(mut self, mode: AuthMode) -> Self {
        self.auth_mode = mode;
        self
    }

    pub fn is_dynamic(&self) -> bool {
        self.auth_mode == AuthMode::Dynamic
    }

    /// 目标路径是否在免登录白名单中
    pub fn is_access_free(&self, path: &str) -> bool {
        self.allow_list.iter().any(|p| p == path)
    }
}
