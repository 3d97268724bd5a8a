//! Node transport
//!
//! The chain client talks to the node's REST endpoint through [`Transport`],
//! so tests can replay canned responses without a network.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::config::ProviderConfig;
use crate::error::{Error, Result};

/// A decoded REST response; non-JSON bodies arrive as a JSON string
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body
    pub body: Value,
}

impl TransportResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Request/response access to a node's REST API
#[async_trait]
pub trait Transport: Send + Sync {
    /// GET `path` relative to the node's base URL
    async fn get(&self, path: &str) -> Result<TransportResponse>;

    /// POST a JSON `body` to `path`
    async fn post_json(&self, path: &str, body: &Value) -> Result<TransportResponse>;
}

/// HTTP transport backed by `reqwest`
pub struct HttpTransport {
    /// Provider configuration
    config: ProviderConfig,
    client: reqwest::Client,
}

impl HttpTransport {
    /// Create a new HTTP transport
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(seconds) = config.timeout {
            builder = builder.timeout(Duration::from_secs(seconds));
        }

        let client = builder
            .build()
            .map_err(|e| Error::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.url.trim_end_matches('/'), path)
    }

    fn with_api_key(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.api_key {
            Some(api_key) => request.header("x-api-key", api_key),
            None => request,
        }
    }

    async fn read(response: reqwest::Response) -> Result<TransportResponse> {
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| Error::Network(format!("Failed to read response: {}", e)))?;

        let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
        Ok(TransportResponse { status, body })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, path: &str) -> Result<TransportResponse> {
        let url = self.url(path);
        debug!(%url, "GET");

        let response = self
            .with_api_key(self.client.get(&url))
            .send()
            .await
            .map_err(|e| Error::Network(format!("GET {} failed: {}", path, e)))?;

        Self::read(response).await
    }

    async fn post_json(&self, path: &str, body: &Value) -> Result<TransportResponse> {
        let url = self.url(path);
        debug!(%url, "POST");

        let response = self
            .with_api_key(self.client.post(&url).json(body))
            .send()
            .await
            .map_err(|e| Error::Network(format!("POST {} failed: {}", path, e)))?;

        Self::read(response).await
    }
}
