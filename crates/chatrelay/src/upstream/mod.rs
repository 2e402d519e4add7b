//! Upstream completion API
//!
//! One call per chat turn, no retries. A non-success HTTP status is not an
//! error at this layer: it comes back as an [`UpstreamReply`] so the relay
//! can forward it unchanged. Only transport failures and unreadable bodies
//! are [`UpstreamError`]s.

mod client;
mod types;

use async_trait::async_trait;
use thiserror::Error;

pub use client::ResponsesClient;
pub use types::{ContentPart, OutputItem, ResponsesBody, UpstreamPayload, UpstreamReply};

/// Failures talking to the completion API
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UpstreamError {
    /// Connection refused, reset, DNS failure, etc.
    #[error("Network error: {0}")]
    Network(String),

    /// The configured request timeout elapsed
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// The response body was not JSON, or not the expected shape
    #[error("Invalid upstream body: {0}")]
    InvalidBody(String),
}

/// A completion endpoint the relay can forward turns to
#[async_trait]
pub trait CompletionApi: Send + Sync {
    /// Send one payload, bearer-authenticated with `api_key`
    async fn complete(
        &self,
        payload: &UpstreamPayload,
        api_key: &str,
    ) -> Result<UpstreamReply, UpstreamError>;
}
