//! Forwarding of chat requests to the workflow engine.

use std::time::Duration;

use bytes::Bytes;
use metrics::counter;
use tarot_core::RelayError;
use tracing::{info, warn};

use crate::metrics::{PROXY_FAILURES_TOTAL, PROXY_REQUESTS_TOTAL};

/// Upstream response, relayed to the caller unchanged.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    /// HTTP status code.
    pub status: u16,
    /// `Content-Type` header, if any.
    pub content_type: Option<String>,
    /// Raw body.
    pub body: Bytes,
}

/// HTTP client bound to one workflow URL.
#[derive(Debug, Clone)]
pub struct WorkflowProxy {
    client: reqwest::Client,
    url: String,
}

impl WorkflowProxy {
    /// Create a proxy for `url` with a per-request `timeout`.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, RelayError> {
        let url = url.into();
        let parsed = reqwest::Url::parse(&url).map_err(|e| RelayError::Internal {
            message: format!("invalid workflow URL '{url}': {e}"),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(RelayError::Internal {
                message: format!("workflow URL must be http or https: {url}"),
            });
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("tarot-relay/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RelayError::Internal {
                message: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self { client, url })
    }

    /// Target URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// POST `body` to the workflow URL as JSON.
    ///
    /// Any upstream status is returned as-is; only transport failures error.
    pub async fn forward(&self, body: Bytes) -> Result<UpstreamResponse, RelayError> {
        let len = body.len();
        let response = self
            .client
            .post(&self.url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| self.failure(&e))?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let body = response.bytes().await.map_err(|e| self.failure(&e))?;

        counter!(PROXY_REQUESTS_TOTAL, "status" => status.to_string()).increment(1);
        info!(url = %self.url, status, request_bytes = len, response_bytes = body.len(), "proxy forwarded");
        Ok(UpstreamResponse {
            status,
            content_type,
            body,
        })
    }

    fn failure(&self, err: &reqwest::Error) -> RelayError {
        counter!(PROXY_FAILURES_TOTAL).increment(1);
        warn!(url = %self.url, error = %err, "proxy failed");
        RelayError::UpstreamProxyFailure {
            message: err.to_string(),
        }
    }
}
