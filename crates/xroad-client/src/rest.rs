//! REST client.

use reqwest::{Method, StatusCode};
use serde_json::{json, Map, Value};
use tracing::{debug, warn};
use xroad_core::HeaderState;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::header::SharedHeader;
use crate::{BoxFuture, XRoadClient};

/// Path of the REST gateway on the Security Server.
pub const REST_PATH: &str = "/restapi";

/// A client for the X-Road REST gateway.
///
/// Arguments become the query string; header values travel as
/// `X-Road-*` headers. A `200` reply is returned as parsed JSON, any other
/// status as `{"status_code": n, "content": "..."}`.
#[derive(Debug)]
pub struct RestClient {
    http: reqwest::Client,
    endpoint: String,
    method: Method,
    header: SharedHeader,
}

impl RestClient {
    /// Builds a client from configuration.
    pub fn connect(config: &ClientConfig) -> ClientResult<Self> {
        config.validate()?;
        let client = config.client_identity()?;
        let service = config.service_identity()?;

        let method = Method::from_bytes(config.client.http_method.trim().to_ascii_uppercase().as_bytes())
            .map_err(|_| {
                ClientError::validation_with_field(
                    format!("invalid HTTP method: {}", config.client.http_method),
                    "http_method",
                )
            })?;

        let http = reqwest::Client::builder()
            .timeout(config.security_server.timeout)
            .build()
            .map_err(|e| ClientError::configuration(format!("failed to build HTTP client: {e}")))?;

        let mut state =
            HeaderState::new(client, service).with_protocol_version(config.client.protocol_version.as_str());
        if let Some(user_id) = &config.client.user_id {
            state.set_user_id(user_id.as_str());
        }

        Ok(Self {
            http,
            endpoint: format!("{}{REST_PATH}", config.security_server.url.trim_end_matches('/')),
            method,
            header: SharedHeader::new(state),
        })
    }

    /// The REST gateway URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// The HTTP method used for requests.
    pub fn method(&self) -> &Method {
        &self.method
    }

    async fn call(&self, mut args: Map<String, Value>) -> ClientResult<Value> {
        let state = self.header.prepare_call(&mut args);
        let headers = state.to_rest_headers()?;
        let query = query_pairs(&args);

        debug!(
            method = %self.method,
            endpoint = %self.endpoint,
            service = %state.service(),
            "sending rest request"
        );

        let response = self
            .http
            .request(self.method.clone(), &self.endpoint)
            .headers(headers)
            .query(&query)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if status == StatusCode::OK {
            return Ok(serde_json::from_str(&body)?);
        }

        warn!(status = status.as_u16(), endpoint = %self.endpoint, "rest request returned non-200 status");
        Ok(json!({
            "status_code": status.as_u16(),
            "content": body,
        }))
    }
}

impl XRoadClient for RestClient {
    fn header(&self) -> &SharedHeader {
        &self.header
    }

    fn request<'a>(&'a self, args: Map<String, Value>) -> BoxFuture<'a, ClientResult<Value>> {
        Box::pin(self.call(args))
    }
}

/// Flattens arguments into query pairs. Arrays repeat the key; nulls and
/// nested objects are skipped.
fn query_pairs(args: &Map<String, Value>) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for (key, value) in args {
        match value {
            Value::Array(items) => pairs.extend(items.iter().filter_map(scalar).map(|v| (key.clone(), v))),
            other => pairs.extend(scalar(other).map(|v| (key.clone(), v))),
        }
    }
    pairs
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}
