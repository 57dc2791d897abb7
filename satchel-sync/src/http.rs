//! HTTP transport implementation.
//!
//! Delivers [`RemoteRequest`]s over reqwest against a configured base URL.

use crate::error::{SyncError, SyncResult};
use crate::transport::RemoteTransport;
use async_trait::async_trait;
use reqwest::Client;
use satchel_types::{Method, RemoteRequest, RemoteResponse};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// HTTP transport configuration.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Base URL the request URLs are resolved against
    /// (e.g. `https://api.example.com`).
    pub base_url: String,
    /// Connection-level timeout applied by the client.
    pub timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// reqwest-backed transport.
pub struct HttpTransport {
    config: HttpConfig,
    client: Client,
}

impl HttpTransport {
    /// Creates a new HTTP transport.
    pub fn new(config: HttpConfig) -> SyncResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| SyncError::Network(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { config, client })
    }

    fn resolve(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else {
            format!(
                "{}/{}",
                self.config.base_url.trim_end_matches('/'),
                url.trim_start_matches('/')
            )
        }
    }
}

#[async_trait]
impl RemoteTransport for HttpTransport {
    async fn send(&self, request: &RemoteRequest) -> SyncResult<RemoteResponse> {
        let url = self.resolve(&request.url);
        debug!("{} {}", request.method, url);

        let mut builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
            Method::Put => self.client.put(&url),
            Method::Delete => self.client.delete(&url),
        };
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                SyncError::Timeout
            } else {
                SyncError::Network(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| SyncError::Network(e.to_string()))?;
        // Non-JSON or empty bodies become None; the status still counts.
        let body = serde_json::from_slice::<Value>(&bytes).ok();

        Ok(RemoteResponse::new(status, body))
    }
}
