use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::ClientError;
use crate::relay::{ChatTurn, RelayResponse};

/// Sends one chat turn to a relay
#[async_trait]
pub trait RelayTransport: Send + Sync {
    async fn send_turn(&self, turn: &ChatTurn) -> Result<RelayResponse, ClientError>;
}

/// Resolve the chat endpoint relative to a relay URL
///
/// Mirrors how the browser widget resolves `./chat` against its own script
/// URL: `https://relay.example/` and `https://relay.example/widget.js` both
/// give `https://relay.example/chat`.
pub fn resolve_endpoint(base: &str) -> Result<Url, ClientError> {
    let base = Url::parse(base)
        .map_err(|e| ClientError::InvalidEndpoint(format!("{base}: {e}")))?;

    if base.cannot_be_a_base() {
        return Err(ClientError::InvalidEndpoint(format!(
            "{base}: not a hierarchical URL"
        )));
    }

    base.join("./chat")
        .map_err(|e| ClientError::InvalidEndpoint(format!("{base}: {e}")))
}

/// HTTP transport to a running relay
#[derive(Debug, Clone)]
pub struct RelayClient {
    client: Client,
    endpoint: Url,
}

impl RelayClient {
    /// Create a client for the relay at `base`
    pub fn new(base: &str) -> Result<Self, ClientError> {
        let endpoint = resolve_endpoint(base)?;
        let client = Client::builder()
            .build()
            .map_err(|e| ClientError::Network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client, endpoint })
    }

    /// The resolved `/chat` URL
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl RelayTransport for RelayClient {
    async fn send_turn(&self, turn: &ChatTurn) -> Result<RelayResponse, ClientError> {
        debug!(
            continued = turn.previous_response_id.is_some(),
            "Posting turn to {}", self.endpoint
        );

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(turn)
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let body: Value = serde_json::from_slice(&bytes)
            .map_err(|e| ClientError::InvalidBody(format!("status {status}: {e}")))?;

        if !(200..300).contains(&status) {
            return Err(ClientError::Rejected { status, body });
        }

        let reply = RelayResponse::deserialize(&body)
            .map_err(|e| ClientError::InvalidBody(format!("status {status}: {e}")))?;
        if !reply.ok {
            return Err(ClientError::Rejected { status, body });
        }

        Ok(reply)
    }
}
