use thiserror::Error;

// =========================================================
// 错误类型
// =========================================================

/// 路由 / 认证核心的错误类型
///
/// 需要 `Clone`：同一次进行中的动态路由构建结果会被所有等待者共享。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// 401: 登录失效或凭据无效
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// 403: 无权限
    #[error("forbidden: {0}")]
    Forbidden(String),
    /// 后端业务错误码
    #[error("api error {code}: {message}")]
    Api { code: i64, message: String },
    /// 非 2xx 的 HTTP 状态
    #[error("request failed with status {status}")]
    Http { status: u16 },
    /// 网络 / 连接层错误
    #[error("transport error: {0}")]
    Transport(String),
    /// JSON 解析或序列化错误
    #[error("serialization error: {0}")]
    Serialization(String),
    /// 本地持久化错误
    #[error("storage error: {0}")]
    Storage(String),
    /// 接口成功但缺少 data
    #[error("empty response data from {0}")]
    EmptyData(&'static str),
    /// 构建期间发生了 reset，结果不再可信
    #[error("route build superseded by a reset")]
    Superseded,
    /// 重试后动态路由仍未就绪
    #[error("dynamic routes unavailable after retry")]
    RoutesUnavailable,
    /// 导航重定向次数超限
    #[error("navigation exceeded {0} redirects")]
    RedirectLoop(usize),
    /// 配置值非法
    #[error("invalid config {key}: {message}")]
    InvalidConfig { key: &'static str, message: String },
}

impl RouteError {
    pub fn api(code: i64, message: impl Into<String>) -> Self {
        Self::Api {
            code,
            message: message.into(),
        }
    }

    pub fn invalid_config(key: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            key,
            message: message.into(),
        }
    }

    /// 是否应视为会话失效（触发被动清理）
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, RouteError::Unauthorized(_))
    }

    /// 获取对应的 HTTP 状态码
    pub fn status_code(&self) -> u16 {
        match self {
            RouteError::Unauthorized(_) => 401,
            RouteError::Forbidden(_) => 403,
            RouteError::Http { status } => *status,
            RouteError::Api { .. } | RouteError::Serialization(_) | RouteError::EmptyData(_) => 400,
            RouteError::InvalidConfig { .. } => 400,
            RouteError::Superseded => 409,
            RouteError::RoutesUnavailable | RouteError::Storage(_) => 500,
            RouteError::RedirectLoop(_) => 508,
            RouteError::Transport(_) => 502,
        }
    }

    /// 获取机器可读的错误代码
    pub fn error_code(&self) -> &'static str {
        match self {
            RouteError::Unauthorized(_) => "UNAUTHORIZED",
            RouteError::Forbidden(_) => "FORBIDDEN",
            RouteError::Api { .. } => "API_ERROR",
            RouteError::Http { .. } => "HTTP_ERROR",
            RouteError::Transport(_) => "UPSTREAM_ERROR",
            RouteError::Serialization(_) => "JSON_PARSE_ERROR",
            RouteError::Storage(_) => "STORAGE_ERROR",
            RouteError::EmptyData(_) => "EMPTY_DATA",
            RouteError::Superseded => "SUPERSEDED",
            RouteError::RoutesUnavailable => "ROUTES_UNAVAILABLE",
            RouteError::RedirectLoop(_) => "REDIRECT_LOOP",
            RouteError::InvalidConfig { .. } => "INVALID_CONFIG",
        }
    }
}

impl From<serde_json::Error> for RouteError {
    fn from(e: serde_json::Error) -> Self {
        RouteError::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for RouteError {
    fn from(e: reqwest::Error) -> Self {
        RouteError::Transport(e.to_string())
    }
}

pub type RouteResult<T> = std::result::Result<T, RouteError>;
