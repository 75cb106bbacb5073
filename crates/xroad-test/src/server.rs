//! In-process mock Security Server.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http::{HeaderMap, Method, Request, Response, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use parking_lot::Mutex;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::error::TestError;

/// A canned response.
#[derive(Debug, Clone)]
pub struct MockResponse {
    status: StatusCode,
    headers: Vec<(String, String)>,
    body: Bytes,
}

impl MockResponse {
    /// An empty response with the given status.
    pub fn status(status: u16) -> Self {
        Self {
            status: StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            headers: Vec::new(),
            body: Bytes::new(),
        }
    }

    /// `200 OK` with a `text/xml` body.
    pub fn xml(body: impl Into<String>) -> Self {
        Self::status(200)
            .with_header("content-type", "text/xml; charset=utf-8")
            .with_body(body.into())
    }

    /// `200 OK` with a JSON body.
    pub fn json(body: &serde_json::Value) -> Self {
        Self::status(200)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
    }

    /// Adds a response header.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Replaces the body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    fn to_response(&self) -> Response<Full<Bytes>> {
        let mut response = Response::new(Full::new(self.body.clone()));
        *response.status_mut() = self.status;
        for (name, value) in &self.headers {
            if let (Ok(name), Ok(value)) = (
                http::HeaderName::from_bytes(name.as_bytes()),
                http::HeaderValue::from_str(value),
            ) {
                response.headers_mut().append(name, value);
            }
        }
        response
    }
}

/// A request received by the mock server.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// HTTP method.
    pub method: Method,
    /// Path without query.
    pub path: String,
    /// Raw query string.
    pub query: Option<String>,
    /// Request headers.
    pub headers: HeaderMap,
    /// Request body.
    pub body: Bytes,
}

impl RecordedRequest {
    /// Body as UTF-8 text (lossy).
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// A header value as text.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

#[derive(Debug, Default)]
struct MockState {
    routes: Mutex<Vec<(Method, String, MockResponse)>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockState {
    fn respond(&self, method: &Method, path: &str) -> Response<Full<Bytes>> {
        let routes = self.routes.lock();
        routes
            .iter()
            .rev()
            .find(|(m, p, _)| m == method && p == path)
            .map_or_else(
                || MockResponse::status(404).with_body("no mock registered").to_response(),
                |(_, _, response)| response.to_response(),
            )
    }
}

/// A mock Security Server on `127.0.0.1`.
///
/// The accept loop stops when the server is dropped.
#[derive(Debug)]
pub struct MockSecurityServer {
    addr: SocketAddr,
    state: Arc<MockState>,
    task: JoinHandle<()>,
}

impl MockSecurityServer {
    /// Binds an ephemeral port and starts serving.
    pub async fn start() -> Result<Self, TestError> {
        let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0))).await?;
        let addr = listener.local_addr()?;
        let state = Arc::new(MockState::default());

        let accept_state = Arc::clone(&state);
        let task = tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    continue;
                };
                let state = Arc::clone(&accept_state);

                tokio::spawn(async move {
                    let io = TokioIo::new(stream);
                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { handle(req, &state).await }
                    });

                    if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                        debug!("mock connection error: {}", e);
                    }
                });
            }
        });

        debug!(%addr, "mock security server listening");
        Ok(Self { addr, state, task })
    }

    /// Base URL, e.g. `http://127.0.0.1:54321`.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Bound address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Registers a response for `method` and `path`. Later registrations win.
    pub fn mock(&self, method: &str, path: &str, response: MockResponse) {
        let method = Method::from_bytes(method.as_bytes()).unwrap_or(Method::GET);
        self.state
            .routes
            .lock()
            .push((method, path.to_string(), response));
    }

    /// All recorded requests in arrival order.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().clone()
    }

    /// Recorded requests for one path.
    pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.state
            .requests
            .lock()
            .iter()
            .filter(|r| r.path == path)
            .cloned()
            .collect()
    }
}

impl Drop for MockSecurityServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn handle(req: Request<Incoming>, state: &MockState) -> Result<Response<Full<Bytes>>, Infallible> {
    let (parts, body) = req.into_parts();
    let body = body
        .collect()
        .await
        .map(http_body_util::Collected::to_bytes)
        .unwrap_or_default();

    let path = parts.uri.path().to_string();
    let response = state.respond(&parts.method, &path);
    state.requests.lock().push(RecordedRequest {
        method: parts.method,
        path,
        query: parts.uri.query().map(str::to_string),
        headers: parts.headers,
        body,
    });
    Ok(response)
}
