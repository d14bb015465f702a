use crate::{LoginParams, LoginPayload, MenuRecord};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

/// HTTP Methods for API Requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

/// A trait that defines the request-response relationship and metadata for an API endpoint.
pub trait ApiRequest: Serialize {
    /// The payload type carried in the envelope's `data` field.
    type Response: DeserializeOwned;
    /// The URL path (relative to the API base URL).
    const PATH: &'static str;
    /// The HTTP method.
    const METHOD: HttpMethod;
}

// =========================================================
// 统一响应结构
// =========================================================

/// 成功状态码（后端两种约定都视为成功）
pub const CODE_SUCCESS: i64 = 200;
pub const CODE_SUCCESS_ZERO: i64 = 0;
pub const CODE_UNAUTHORIZED: i64 = 401;
pub const CODE_FORBIDDEN: i64 = 403;

/// 后端通用响应结构 `{ code, msg, data }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub code: i64,
    #[serde(default)]
    pub msg: String,
    pub data: Option<T>,
}

impl<T> ApiEnvelope<T> {
    pub fn is_success(&self) -> bool {
        self.code == CODE_SUCCESS || self.code == CODE_SUCCESS_ZERO
    }
}

// =========================================================
// Request Definitions
// =========================================================

impl ApiRequest for LoginParams {
    type Response = LoginPayload;
    const PATH: &'static str = "/auth/login";
    const METHOD: HttpMethod = HttpMethod::Post;
}

/// Sign out the current token
#[derive(Debug, Serialize, Deserialize)]
pub struct LogoutRequest;

impl ApiRequest for LogoutRequest {
    type Response = bool;
    const PATH: &'static str = "/auth/logout";
    const METHOD: HttpMethod = HttpMethod::Post;
}

/// Permission codes granted to the current user
#[derive(Debug, Serialize, Deserialize)]
pub struct CurrentUserPermsRequest;

impl ApiRequest for CurrentUserPermsRequest {
    type Response = Vec<String>;
    const PATH: &'static str = "/auth/permissions";
    const METHOD: HttpMethod = HttpMethod::Get;
}

/// Menu tree visible to the current user
#[derive(Debug, Serialize, Deserialize)]
pub struct CurrentUserRoutesRequest;

impl ApiRequest for CurrentUserRoutesRequest {
    type Response = Vec<MenuRecord>;
    const PATH: &'static str = "/auth/menus";
    const METHOD: HttpMethod = HttpMethod::Get;
}
