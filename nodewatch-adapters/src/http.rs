//! HTTP backend for a telemetry platform REST API.
//!
//! Each node handle issues JSON `POST` requests against two endpoints:
//!
//! - `{endpoint}/data/latest` - latest sample of a variable
//! - `{endpoint}/data/getData` - samples over a time range
//!
//! Both answer with an envelope of the form
//! `{ "success": bool, "error": string, "errorcode": int, "data": { "<nodeId>": ... } }`
//! which is mapped into a [`NodeResponse`]. Request signing is not
//! performed; the token is sent as a bearer credential.
//!
//! ## Example
//!
//! ```rust,no_run
//! use nodewatch_adapters::http::HttpBackend;
//! use nodewatch_adapters::{Backend, FetchRequest, Order};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let backend = HttpBackend::builder()
//!         .endpoint("https://api.example.io/v1")
//!         .credentials("token-id", "token")
//!         .build()?;
//!
//!     let node = backend.new_node("node-1");
//!     let request = FetchRequest::builder("humidity")
//!         .range(1_700_000_000, 1_700_003_600)
//!         .limit(100)
//!         .order(Order::Asc)
//!         .build()?;
//!
//!     let response = node.get_data(&request).await?;
//!     println!("{:?}", response.data);
//!     Ok(())
//! }
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use nodewatch_types::{DataPoint, FetchRequest, NodeResponse, Payload};

use crate::{AdapterError, Backend, TelemetryNode};

/// Default API endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.ap-in-1.anedya.io/v1";

/// Header carrying the token identifier alongside the bearer token.
pub const TOKEN_ID_HEADER: &str = "X-Token-Id";

/// HTTP backend for querying node data.
#[derive(Clone)]
pub struct HttpBackend {
    inner: Arc<HttpInner>,
    description: String,
}

struct HttpInner {
    client: Client,
    endpoint: String,
    token_id: String,
    token: String,
}

impl HttpBackend {
    /// Create a new builder for configuring the backend.
    pub fn builder() -> HttpBackendBuilder {
        HttpBackendBuilder::default()
    }

    /// The configured API endpoint.
    pub fn endpoint(&self) -> &str {
        &self.inner.endpoint
    }
}

impl fmt::Debug for HttpBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpBackend")
            .field("endpoint", &self.inner.endpoint)
            .field("token_id", &self.inner.token_id)
            .finish_non_exhaustive()
    }
}

impl Backend for HttpBackend {
    fn new_node(&self, node_id: &str) -> Arc<dyn TelemetryNode> {
        Arc::new(HttpNode {
            inner: self.inner.clone(),
            node_id: node_id.to_string(),
        })
    }

    fn description(&self) -> &str {
        &self.description
    }
}

/// Builder for [`HttpBackend`].
#[derive(Debug, Default)]
pub struct HttpBackendBuilder {
    endpoint: Option<String>,
    token_id: Option<String>,
    token: Option<String>,
    timeout: Option<Duration>,
}

impl HttpBackendBuilder {
    /// Set the API endpoint (e.g., "https://api.example.io/v1").
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the token identifier and token.
    pub fn credentials(mut self, token_id: impl Into<String>, token: impl Into<String>) -> Self {
        self.token_id = Some(token_id.into());
        self.token = Some(token.into());
        self
    }

    /// Set the request timeout (default: 10 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the backend.
    pub fn build(self) -> Result<HttpBackend, AdapterError> {
        let timeout = self.timeout.unwrap_or(Duration::from_secs(10));
        let client = Client::builder().timeout(timeout).build()?;

        let endpoint = self
            .endpoint
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(HttpBackend {
            description: format!("http: {}", endpoint),
            inner: Arc::new(HttpInner {
                client,
                endpoint,
                token_id: self.token_id.unwrap_or_default(),
                token: self.token.unwrap_or_default(),
            }),
        })
    }
}

/// Node handle backed by [`HttpBackend`].
pub struct HttpNode {
    inner: Arc<HttpInner>,
    node_id: String,
}

impl fmt::Debug for HttpNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpNode")
            .field("node_id", &self.node_id)
            .finish()
    }
}

impl HttpNode {
    async fn post<B: Serialize>(&self, path: &str, body: &B) -> Result<Envelope, AdapterError> {
        let url = format!("{}{}", self.inner.endpoint, path);

        let response = self
            .inner
            .client
            .post(&url)
            .bearer_auth(&self.inner.token)
            .header(TOKEN_ID_HEADER, &self.inner.token_id)
            .json(body)
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED
            || response.status() == reqwest::StatusCode::FORBIDDEN
        {
            return Err(AdapterError::Auth("Invalid credentials".to_string()));
        }

        if !response.status().is_success() {
            return Err(AdapterError::Http(format!(
                "API returned status {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AdapterError::Parse(e.to_string()))
    }
}

#[async_trait]
impl TelemetryNode for HttpNode {
    fn node_id(&self) -> &str {
        &self.node_id
    }

    async fn get_data(&self, request: &FetchRequest) -> Result<NodeResponse, AdapterError> {
        request.validate()?;
        let body = RangeBody {
            variable: &request.variable,
            nodes: [&self.node_id],
            from: request.from,
            to: request.to,
            limit: request.limit,
            order: request.order.map(|o| o.as_str()),
        };
        let envelope = self.post("/data/getData", &body).await?;
        envelope_to_response(envelope, &self.node_id)
    }

    async fn get_latest_data(&self, variable: &str) -> Result<NodeResponse, AdapterError> {
        let body = LatestBody {
            variable,
            nodes: [&self.node_id],
        };
        let envelope = self.post("/data/latest", &body).await?;
        envelope_to_response(envelope, &self.node_id)
    }
}

#[derive(Debug, Serialize)]
struct RangeBody<'a> {
    variable: &'a str,
    nodes: [&'a str; 1],
    #[serde(skip_serializing_if = "Option::is_none")]
    from: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    to: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    limit: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    order: Option<&'static str>,
}

#[derive(Debug, Serialize)]
struct LatestBody<'a> {
    variable: &'a str,
    nodes: [&'a str; 1],
}

/// Response envelope returned by the platform API.
#[derive(Debug, Deserialize)]
struct Envelope {
    success: bool,
    #[serde(default)]
    error: String,
    #[serde(default)]
    errorcode: i64,
    #[serde(default, rename = "isDataAvailable")]
    is_data_available: Option<bool>,
    #[serde(default)]
    data: Value,
}

/// Map the platform envelope into a backend-neutral response.
///
/// `data` is either keyed by node id or already the node's payload. An
/// array becomes a series, an object with `timestamp`/`value` a point.
fn envelope_to_response(envelope: Envelope, node_id: &str) -> Result<NodeResponse, AdapterError> {
    if !envelope.success {
        let message = if envelope.error.is_empty() {
            format!("API error code {}", envelope.errorcode)
        } else {
            envelope.error
        };
        return Ok(NodeResponse::failure(message));
    }

    let node_data = match envelope.data {
        Value::Object(mut map) if map.contains_key(node_id) => map.remove(node_id).unwrap_or_default(),
        other => other,
    };

    let payload = match node_data {
        Value::Null => None,
        Value::Array(_) => {
            let points: Vec<DataPoint> = serde_json::from_value(node_data)
                .map_err(|e| AdapterError::Parse(e.to_string()))?;
            Some(Payload::Series(points))
        }
        Value::Object(ref map) if map.is_empty() => None,
        Value::Object(_) => {
            let point: DataPoint = serde_json::from_value(node_data)
                .map_err(|e| AdapterError::Parse(e.to_string()))?;
            Some(Payload::Point(point))
        }
        other => {
            return Err(AdapterError::Parse(format!(
                "unexpected data shape for node {}: {}",
                node_id, other
            )))
        }
    };

    let is_data_available = envelope
        .is_data_available
        .unwrap_or(payload.is_some());

    Ok(match payload {
        Some(data) if is_data_available => NodeResponse::success(data),
        _ => NodeResponse::empty(),
    })
}
