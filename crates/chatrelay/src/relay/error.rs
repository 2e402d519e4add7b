//! Failure mapping for `/chat`
//!
//! - Missing credential: 500 with a configuration message, upstream untouched
//! - Bad input: 400, never forwarded
//! - Upstream non-success: status and body passed through as-is
//! - Anything else: opaque 500, detail only in the server log

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{error, warn};

use crate::upstream::UpstreamError;

/// Errors that end a chat turn
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChatError {
    /// The server has no API key for the upstream
    #[error("Missing {env_var} env var")]
    MissingCredential { env_var: String },

    /// Message missing, empty, not a string, or too long
    #[error("Empty or too long message")]
    InvalidMessage,

    /// The completion API answered with a non-success status
    #[error("Upstream error: {status}")]
    Upstream { status: StatusCode, body: Value },

    /// Network failure, timeout, malformed upstream body
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ChatError {
    /// Get the error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            ChatError::MissingCredential { .. } => "config",
            ChatError::InvalidMessage => "input",
            ChatError::Upstream { .. } => "upstream",
            ChatError::Internal(_) => "internal",
        }
    }

    /// HTTP status this error is reported with
    pub fn status(&self) -> StatusCode {
        match self {
            ChatError::MissingCredential { .. } | ChatError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ChatError::InvalidMessage => StatusCode::BAD_REQUEST,
            ChatError::Upstream { status, .. } => *status,
        }
    }

    /// Write the error to the server log with its full detail
    pub fn log(&self) {
        match self {
            ChatError::MissingCredential { env_var } => error!(
                error_type = self.category(),
                "Upstream API key not configured (set {env_var})"
            ),
            ChatError::InvalidMessage => {
                warn!(error_type = self.category(), "Rejected chat turn: {self}")
            }
            ChatError::Upstream { status, body } => warn!(
                error_type = self.category(),
                status = %status,
                body = %body,
                "Upstream returned error, passing through to client"
            ),
            ChatError::Internal(detail) => error!(
                error_type = self.category(),
                error_message = %detail,
                "Chat turn failed"
            ),
        }
    }
}

impl From<UpstreamError> for ChatError {
    fn from(e: UpstreamError) -> Self {
        ChatError::Internal(e.to_string())
    }
}

impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            ChatError::Upstream { body, .. } => (status, Json(body)).into_response(),
            ChatError::Internal(_) => (status, Json(json!({"error": "Server error"}))).into_response(),
            other => (status, Json(json!({"error": other.to_string()}))).into_response(),
        }
    }
}
