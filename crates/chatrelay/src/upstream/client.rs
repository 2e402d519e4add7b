use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use super::{CompletionApi, UpstreamError, UpstreamPayload, UpstreamReply};
use crate::config::UpstreamConfig;
use crate::error::{RelayError, Result};

/// Completion client for the OpenAI Responses API (or anything that
/// speaks the same wire format)
#[derive(Debug, Clone)]
pub struct ResponsesClient {
    client: Client,
    api_url: String,
}

impl ResponsesClient {
    /// Create a client for the configured endpoint
    ///
    /// No timeout is applied unless `timeout_secs` is set.
    pub fn new(config: &UpstreamConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        let client = builder
            .build()
            .map_err(|e| RelayError::Upstream(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
        })
    }

    /// The endpoint this client posts to
    pub fn api_url(&self) -> &str {
        &self.api_url
    }
}

fn map_send_error(e: reqwest::Error) -> UpstreamError {
    if e.is_timeout() {
        UpstreamError::Timeout(e.to_string())
    } else if e.is_connect() {
        UpstreamError::Network(format!("Failed to connect to upstream: {e}"))
    } else {
        UpstreamError::Network(format!("Request failed: {e}"))
    }
}

#[async_trait]
impl CompletionApi for ResponsesClient {
    async fn complete(
        &self,
        payload: &UpstreamPayload,
        api_key: &str,
    ) -> std::result::Result<UpstreamReply, UpstreamError> {
        debug!(
            model = %payload.model,
            continued = payload.previous_response_id.is_some(),
            "Calling completion API at {}",
            self.api_url
        );

        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {api_key}"))
            .header("Content-Type", "application/json")
            .json(payload)
            .send()
            .await
            .map_err(map_send_error)?;

        let status = response.status().as_u16();
        let bytes = response.bytes().await.map_err(map_send_error)?;

        let body: Value = serde_json::from_slice(&bytes).map_err(|e| {
            UpstreamError::InvalidBody(format!("status {status}, body is not JSON: {e}"))
        })?;

        debug!(status, "Completion API responded");
        Ok(UpstreamReply { status, body })
    }
}
