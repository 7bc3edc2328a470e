//! HTTP POST sink for JSON ingestion endpoints
//!
//! HttpSink posts each payload to a fixed URL with a JSON content type. Any
//! 2xx response counts as accepted; the response body is not read.

use crate::{MessageSink, SinkError};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

const JSON_CONTENT_TYPE: &str = "application/json";

#[derive(Debug, Clone)]
pub struct HttpSink {
    client: Client,
    endpoint: String,
}

impl HttpSink {
    /// Create a sink posting to `endpoint` with a per-request timeout
    pub fn new(endpoint: impl Into<String>, request_timeout: Duration) -> Result<Self, SinkError> {
        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| SinkError::InvalidConfig(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self::with_client(client, endpoint))
    }

    /// Create a sink around an existing client
    pub fn with_client(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl MessageSink for HttpSink {
    async fn send(&self, payload: &[u8]) -> Result<(), SinkError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .body(payload.to_vec())
            .send()
            .await
            .map_err(|e| SinkError::transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            debug!("POST {} -> {} ({} bytes)", self.endpoint, status, payload.len());
            Ok(())
        } else {
            Err(SinkError::UpstreamStatus {
                status: status.as_u16(),
            })
        }
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}
