use super::{Endpoint, Method};
use crate::config::BackendConfig;
use anyhow::{anyhow, Context, Result};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Url};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use tracing::debug;

/// Why a backend exchange produced no usable payload
#[derive(Debug, Clone, PartialEq)]
pub enum UpstreamError {
    /// DNS, connection refused, reset, TLS...
    Connect(String),
    Timeout,
    Status(u16),
    InvalidBody(String),
}

impl fmt::Display for UpstreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpstreamError::Connect(e) => write!(f, "backend unreachable: {}", e),
            UpstreamError::Timeout => write!(f, "backend did not respond in time"),
            UpstreamError::Status(code) => write!(f, "backend API error: {}", code),
            UpstreamError::InvalidBody(e) => write!(f, "backend returned invalid JSON: {}", e),
        }
    }
}

impl std::error::Error for UpstreamError {}

impl From<reqwest::Error> for UpstreamError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            UpstreamError::Timeout
        } else {
            UpstreamError::Connect(e.to_string())
        }
    }
}

/// HTTP client for the prediction backend.
///
/// Makes exactly one attempt per call, bounded by the configured timeouts.
/// Successful responses are returned as raw JSON, without schema checks.
#[derive(Clone)]
pub struct BackendClient {
    http_client: Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let origin = Url::parse(&config.url)
            .with_context(|| format!("Invalid backend URL '{}'", config.url))?;
        if !matches!(origin.scheme(), "http" | "https") || !origin.has_host() {
            return Err(anyhow!(
                "Invalid backend URL '{}': expected http(s)://host[:port]",
                config.url
            ));
        }

        let http_client = Client::builder()
            .user_agent(concat!("freshgate/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .build()
            .context("Failed to build backend HTTP client")?;

        Ok(Self {
            http_client,
            base_url: config.url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET a catalog resource.
    pub async fn get(&self, endpoint: Endpoint) -> Result<Value, UpstreamError> {
        self.send::<()>(endpoint, None).await
    }

    /// POST a normalized request body.
    pub async fn post<B: Serialize>(
        &self,
        endpoint: Endpoint,
        body: &B,
    ) -> Result<Value, UpstreamError> {
        self.send(endpoint, Some(body)).await
    }

    async fn send<B: Serialize>(
        &self,
        endpoint: Endpoint,
        body: Option<&B>,
    ) -> Result<Value, UpstreamError> {
        let url = format!("{}{}", self.base_url, endpoint.path());

        let request = match endpoint.method() {
            Method::Get => self.http_client.get(&url),
            Method::Post => self.http_client.post(&url),
        };
        let request = match body {
            Some(body) => request.json(body),
            None => request.header(CONTENT_TYPE, "application/json"),
        };

        debug!(endpoint = %endpoint, url = %url, "Forwarding to backend");

        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status(status.as_u16()));
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| UpstreamError::InvalidBody(e.to_string()))
    }
}
