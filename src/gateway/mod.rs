//! Forwarding gateway to the upstream anime API
//!
//! The gateway is a stateless relay: it turns a logical endpoint into an
//! upstream URL, attaches the fixed credential/header block, form-encodes
//! POST bodies and hands the upstream JSON back untouched. It never retries,
//! caches or rate-limits, and it forwards any endpoint string it is given.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE, HOST, USER_AGENT};
use reqwest::Client;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::UpstreamConfig;
use crate::constants::FORM_CONTENT_TYPE;
use crate::models::{GatewayRequest, HttpMethod};

/// Errors that can occur while relaying a request
#[derive(Error, Debug)]
pub enum GatewayError {
    /// The incoming gateway request could not be understood
    #[error("Invalid gateway request: {0}")]
    InvalidRequest(String),

    /// A configured header value is not a valid HTTP header
    #[error("Invalid upstream header {0}")]
    InvalidHeader(String),

    /// Network-related errors (connection refused, timeout, DNS failure, etc.)
    #[error("Failed to connect to upstream: {0}")]
    Network(String),

    /// The upstream answered with something that is not JSON
    #[error("Upstream returned invalid JSON: {0}")]
    InvalidJson(String),
}

/// Stateless relay to the upstream API
pub struct Gateway {
    client: Client,
    upstream: UpstreamConfig,
    headers: HeaderMap,
}

impl Gateway {
    /// Create a gateway with its own HTTP client
    pub fn new(upstream: UpstreamConfig) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        Self::with_client(upstream, client)
    }

    /// Create a gateway sharing an existing HTTP client
    pub fn with_client(upstream: UpstreamConfig, client: Client) -> Result<Self, GatewayError> {
        let headers = fixed_headers(&upstream)?;

        Ok(Self {
            client,
            upstream,
            headers,
        })
    }

    /// Upstream URL for a logical endpoint
    pub fn url_for(&self, endpoint: &str) -> String {
        format!("{}{}", self.upstream.base_url, endpoint)
    }

    /// Parse a raw gateway request body
    pub fn parse_request(body: &[u8]) -> Result<GatewayRequest, GatewayError> {
        serde_json::from_slice(body).map_err(|e| GatewayError::InvalidRequest(e.to_string()))
    }

    /// Relay one request and return the upstream JSON verbatim
    ///
    /// The upstream's HTTP status is logged but not interpreted: upstream
    /// failures reach the caller as an `error` field in the relayed JSON.
    pub async fn forward(&self, request: &GatewayRequest) -> Result<Value, GatewayError> {
        let url = self.url_for(&request.endpoint);
        info!("Proxying request to: {}, method: {}", request.endpoint, request.method);

        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(&url),
            HttpMethod::Post => self.client.post(&url),
        }
        .headers(self.headers.clone());

        if request.method == HttpMethod::Post {
            if let Some(body) = &request.body {
                let form = encode_form(body);
                debug!("Form body: {}", form);
                builder = builder.body(form);
            }
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                GatewayError::Network("Connection timeout".to_string())
            } else if e.is_connect() {
                GatewayError::Network("Failed to connect to server".to_string())
            } else {
                GatewayError::Network(e.to_string())
            }
        })?;

        let status = response.status();
        info!("Response status: {}", status.as_u16());
        if !status.is_success() {
            warn!("Upstream returned {} for {}", status, request.endpoint);
        }

        let text = response
            .text()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        serde_json::from_str(&text).map_err(|e| GatewayError::InvalidJson(e.to_string()))
    }
}

/// Header block attached to every upstream request
fn fixed_headers(upstream: &UpstreamConfig) -> Result<HeaderMap, GatewayError> {
    let value = |name: &str, raw: &str| {
        HeaderValue::from_str(raw).map_err(|_| GatewayError::InvalidHeader(name.to_string()))
    };

    let mut headers = HeaderMap::new();
    headers.insert(HeaderName::from_static("x-api-key"), value("x-api-key", &upstream.api_key)?);
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE));
    headers.insert(USER_AGENT, value("user-agent", &upstream.user_agent)?);
    if !upstream.host.is_empty() {
        headers.insert(HOST, value("host", &upstream.host)?);
    }

    Ok(headers)
}

/// String form of a form value: strings verbatim, null empty, the rest as JSON text
pub fn form_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// URL-form-encode a body as `key=value` pairs joined by `&`, in insertion order
pub fn encode_form(body: &Map<String, Value>) -> String {
    body.iter()
        .map(|(key, value)| {
            format!(
                "{}={}",
                urlencoding::encode(key),
                urlencoding::encode(&form_value(value))
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}
