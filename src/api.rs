use admin_router_shared::protocol::{
    ApiEnvelope, ApiRequest, CODE_FORBIDDEN, CODE_UNAUTHORIZED, CurrentUserPermsRequest,
    CurrentUserRoutesRequest, LogoutRequest,
};
use admin_router_shared::{HEADER_AUTHORIZATION, LoginParams, LoginPayload, MenuRecord};
use tracing::debug;

use crate::error::{RouteError, RouteResult};
use crate::request::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use crate::store::SessionStore;

/// GET 请求附带的防缓存参数
pub const CACHE_BUSTER_QUERY: &str = "_t";

// =========================================================
// 协作者接口
// =========================================================

/// 认证接口
#[async_trait::async_trait(?Send)]
pub trait AuthApi {
    async fn login(&self, params: &LoginParams) -> RouteResult<LoginPayload>;
    async fn logout(&self) -> RouteResult<()>;
}

/// 权限 / 菜单接口
#[async_trait::async_trait(?Send)]
pub trait PermissionApi {
    async fn current_user_permissions(&self) -> RouteResult<Vec<String>>;
    async fn current_user_routes(&self) -> RouteResult<Vec<MenuRecord>>;
}

// =========================================================
// 实现层: REST 适配器
// =========================================================

/// 管理后台 REST 接口
///
/// 持有会话句柄以附加 `Authorization` 头；会话本身不依赖接口层。
pub struct AdminApi<C: HttpClient> {
    base_url: String,
    client: C,
    session: SessionStore,
}

impl<C: HttpClient> AdminApi<C> {
    pub fn new(base_url: &str, client: C, session: SessionStore) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            session,
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// 发送强类型请求，返回信封中的 `data`
    pub async fn call<T: ApiRequest>(&self, req: &T) -> RouteResult<Option<T::Response>> {
        // 1. 构造请求
        let mut request = HttpRequest::new(&self.url(T::PATH), T::METHOD);
        if let Some(header) = self.session.auth_header() {
            request = request.with_header(HEADER_AUTHORIZATION, &header);
        }
        match T::METHOD {
            HttpMethod::Get => {
                let stamp = self.session.now().as_millis().to_string();
                request = request.with_query(CACHE_BUSTER_QUERY, &stamp);
            }
            _ => {
                let body = serde_json::to_value(req)?;
                if !body.is_null() {
                    request = request.with_body(body);
                }
            }
        }

        // 2. 发送
        debug!(method = ?T::METHOD, path = T::PATH, "api request");
        let resp = self.client.send(request).await?;

        // 3. 解析
        Self::unwrap_envelope::<T>(resp)
    }

    fn unwrap_envelope<T: ApiRequest>(resp: HttpResponse) -> RouteResult<Option<T::Response>> {
        let envelope = resp.json::<ApiEnvelope<T::Response>>();

        match resp.status {
            401 => {
                let msg = envelope.map(|e| e.msg).unwrap_or_default();
                return Err(RouteError::Unauthorized(msg));
            }
            403 => {
                let msg = envelope.map(|e| e.msg).unwrap_or_default();
                return Err(RouteError::Forbidden(msg));
            }
            _ if !resp.ok() => return Err(RouteError::Http { status: resp.status }),
            _ => {}
        }

        let envelope = envelope?;
        if envelope.is_success() {
            return Ok(envelope.data);
        }
        Err(match envelope.code {
            CODE_UNAUTHORIZED => RouteError::Unauthorized(envelope.msg),
            CODE_FORBIDDEN => RouteError::Forbidden(envelope.msg),
            code => RouteError::api(code, envelope.msg),
        })
    }
}

#[async_trait::async_trait(?Send)]
impl<C: HttpClient> AuthApi for AdminApi<C> {
    async fn login(&self, params: &LoginParams) -> RouteResult<LoginPayload> {
        self.call(params)
            .await?
            .ok_or(RouteError::EmptyData(LoginParams::PATH))
    }

    async fn logout(&self) -> RouteResult<()> {
        self.call(&LogoutRequest).await?;
        Ok(())
    }
}

#[async_trait::async_trait(?Send)]
impl<C: HttpClient> PermissionApi for AdminApi<C> {
    async fn current_user_permissions(&self) -> RouteResult<Vec<String>> {
        Ok(self.call(&CurrentUserPermsRequest).await?.unwrap_or_default())
    }

    async fn current_user_routes(&self) -> RouteResult<Vec<MenuRecord>> {
        Ok(self.call(&CurrentUserRoutesRequest).await?.unwrap_or_default())
    }
}
