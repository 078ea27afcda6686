//! External lookup client: single-shot HTTP fetches with response validation.
//!
//! Callers must not assume retries here; wrap calls in a
//! [`RetryPolicy`](crate::core::retry::RetryPolicy) where the stage wants them.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Url};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("HTTP error: status {status} from {url}")]
    Http { status: u16, url: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("expected JSON but got '{content_type}'")]
    Format { content_type: String },
    #[error("response is missing '{0}'")]
    MissingField(String),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

impl LookupError {
    /// Network-class failures: non-2xx statuses and connection problems.
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Http { .. } | Self::Transport(_))
    }

    /// Responses that arrived but were not the declared or expected format.
    pub fn is_format(&self) -> bool {
        matches!(
            self,
            Self::Format { .. } | Self::MissingField(_) | Self::Json(_)
        )
    }
}

/// A raw response, before any validation.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

impl HttpResponse {
    pub fn json(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            content_type: Some("application/json; charset=utf-8".to_string()),
            body: body.into(),
        }
    }

    pub fn text(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            content_type: Some("text/plain; charset=utf-8".to_string()),
            body: body.into(),
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            content_type: None,
            body: String::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Performs a GET request. Implementations report only transport
/// failures as errors; status and content checks belong to [`LookupClient`].
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get(&self, url: &Url) -> Result<HttpResponse, LookupError>;
}

/// Production transport on a shared `reqwest` client.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Build a transport. `timeout` of `None` leaves requests unbounded.
    pub fn new(timeout: Option<Duration>) -> Result<Self, LookupError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| LookupError::Transport(format!("failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &Url) -> Result<HttpResponse, LookupError> {
        let resp = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| LookupError::Transport(e.to_string()))?;

        let status = resp.status().as_u16();
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = resp
            .text()
            .await
            .map_err(|e| LookupError::Transport(e.to_string()))?;

        Ok(HttpResponse {
            status,
            content_type,
            body,
        })
    }
}

/// Fetch-with-validation helper shared by every network-backed stage.
#[derive(Clone)]
pub struct LookupClient {
    transport: Arc<dyn HttpTransport>,
}

impl LookupClient {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self { transport }
    }

    /// Fetch `url` and parse it as JSON.
    ///
    /// Fails with `Http` on a non-2xx status and with `Format` when the
    /// declared content type is missing or not JSON.
    pub async fn fetch_json(&self, url: &Url) -> Result<Value, LookupError> {
        let resp = self.fetch_ok(url).await?;

        let content_type = resp.content_type.unwrap_or_default();
        if !content_type.contains("application/json") {
            let preview: String = resp.body.chars().take(200).collect();
            warn!(url = %url, content_type = %content_type, body = %preview, "Non-JSON response");
            return Err(LookupError::Format { content_type });
        }

        Ok(serde_json::from_str(&resp.body)?)
    }

    /// Fetch `url` as plain text. Only the status is validated.
    pub async fn fetch_text(&self, url: &Url) -> Result<String, LookupError> {
        Ok(self.fetch_ok(url).await?.body)
    }

    async fn fetch_ok(&self, url: &Url) -> Result<HttpResponse, LookupError> {
        debug!(url = %url, "Fetching");
        let resp = self.transport.get(url).await?;
        if !resp.is_success() {
            return Err(LookupError::Http {
                status: resp.status,
                url: url.to_string(),
            });
        }
        Ok(resp)
    }
}

/// Build an endpoint URL with encoded query parameters.
pub fn endpoint_url(base: &str, params: &[(&str, String)]) -> Result<Url, LookupError> {
    Url::parse_with_params(base, params.iter().map(|(k, v)| (*k, v.as_str())))
        .map_err(|e| LookupError::InvalidUrl(format!("{}: {}", base, e)))
}
