use std::collections::HashMap;
use std::time::Duration;

use serde::de::DeserializeOwned;

pub use admin_router_shared::protocol::HttpMethod;

use crate::error::RouteResult;

#[cfg(test)]
use std::cell::RefCell;

// =========================================================
// 核心抽象层 (HTTP Interface Abstraction)
// =========================================================

/// 通用 HTTP 请求结构
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub url: String,
    pub method: HttpMethod,
    pub headers: HashMap<String, String>,
    pub query: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn new(url: &str, method: HttpMethod) -> Self {
        Self {
            url: url.to_string(),
            method,
            headers: HashMap::new(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn with_header(mut self, key: &str, value: &str) -> Self {
        self.headers.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_query(mut self, key: &str, value: &str) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body.to_string());
        self
    }
}

/// 通用 HTTP 响应结构
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json<T: DeserializeOwned>(&self) -> RouteResult<T> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// HTTP 客户端特性 (Trait)
/// (?Send)：导航与 store 动作运行在单线程协作式调度上
#[async_trait::async_trait(?Send)]
pub trait HttpClient {
    async fn send(&self, req: HttpRequest) -> RouteResult<HttpResponse>;
}

// =========================================================
// 实现层: reqwest 客户端
// =========================================================

#[derive(Clone)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    pub fn new(timeout: Duration) -> RouteResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait(?Send)]
impl HttpClient for ReqwestHttpClient {
    async fn send(&self, req: HttpRequest) -> RouteResult<HttpResponse> {
        let method = match req.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.client.request(method, &req.url);

        if !req.query.is_empty() {
            builder = builder.query(&req.query);
        }

        for (k, v) in req.headers {
            builder = builder.header(k, v);
        }

        if let Some(body) = req.body {
            builder = builder
                .header("Content-Type", "application/json;charset=utf-8")
                .body(body);
        }

        let resp = builder.send().await?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;

        Ok(HttpResponse { status, body })
    }
}

// =========================================================
// 测试工具: MockHttpClient
// =========================================================

/// (Method, URL, Headers, Body)
#[cfg(test)]
pub type RecordedRequest = (HttpMethod, String, HashMap<String, String>, Option<String>);

#[cfg(test)]
pub struct MockHttpClient {
    // (Method, URL) -> (Status, Response Body)
    responses: RefCell<HashMap<(HttpMethod, String), (u16, String)>>,
    failures: RefCell<HashMap<(HttpMethod, String), String>>,
    pub requests: RefCell<Vec<RecordedRequest>>,
    pub queries: RefCell<Vec<Vec<(String, String)>>>,
}

#[cfg(test)]
impl MockHttpClient {
    pub fn new() -> Self {
        Self {
            responses: RefCell::new(HashMap::new()),
            failures: RefCell::new(HashMap::new()),
            requests: RefCell::new(Vec::new()),
            queries: RefCell::new(Vec::new()),
        }
    }

    pub fn mock_response(&self, method: HttpMethod, url: &str, status: u16, body: serde_json::Value) {
        self.responses
            .borrow_mut()
            .insert((method, url.to_string()), (status, body.to_string()));
    }

    pub fn mock_transport_error(&self, method: HttpMethod, url: &str, message: &str) {
        self.failures
            .borrow_mut()
            .insert((method, url.to_string()), message.to_string());
    }
}

#[cfg(test)]
#[async_trait::async_trait(?Send)]
impl HttpClient for MockHttpClient {
    async fn send(&self, req: HttpRequest) -> RouteResult<HttpResponse> {
        self.requests.borrow_mut().push((
            req.method,
            req.url.clone(),
            req.headers.clone(),
            req.body.clone(),
        ));
        self.queries.borrow_mut().push(req.query.clone());

        let key = (req.method, req.url.clone());
        if let Some(message) = self.failures.borrow().get(&key) {
            return Err(crate::error::RouteError::Transport(message.clone()));
        }

        let responses = self.responses.borrow();
        if let Some((status, body)) = responses.get(&key) {
            Ok(HttpResponse {
                status: *status,
                body: body.clone(),
            })
        } else {
            Ok(HttpResponse {
                status: 404,
                body: "Not Found".to_string(),
            })
        }
    }
}
