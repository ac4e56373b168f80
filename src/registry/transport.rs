//! Outbound HTTP transport and backoff clock used by the registry checker.

use crate::types::{RegistryConfig, Result};
use async_trait::async_trait;
use reqwest::{redirect, Client, StatusCode};
use std::time::Duration;
use tracing::warn;

/// Status and (for `200 OK` only) body of a registry response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryResponse {
    pub status: u16,
    pub body: Option<String>,
}

impl RegistryResponse {
    pub fn new(status: u16) -> Self {
        Self { status, body: None }
    }

    pub fn with_body(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: Some(body.into()),
        }
    }
}

/// Issues a single GET request. Implementations must not follow redirects.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str) -> Result<RegistryResponse>;
}

/// Waits out a rate-limit backoff.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Real-time sleeper backed by the tokio timer.
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// reqwest-based transport.
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Create a transport from the registry configuration.
    pub fn new(config: &RegistryConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(&config.user_agent)
            // A redirect's own status is what gets classified
            .redirect(redirect::Policy::none())
            .http1_only()
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<RegistryResponse> {
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if status != StatusCode::OK {
            return Ok(RegistryResponse::new(status.as_u16()));
        }

        let body = match response.text().await {
            Ok(text) => Some(text),
            Err(e) => {
                warn!("Failed to read response body from {}: {}", url, e);
                None
            }
        };

        Ok(RegistryResponse {
            status: status.as_u16(),
            body,
        })
    }
}
