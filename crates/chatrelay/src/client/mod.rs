//! Widget client session model
//!
//! The browser widget and the terminal client share one interaction model:
//! a panel that starts closed, a continuation token that survives restarts,
//! and a send sequence that always clears its typing indicator. This module
//! is the Rust side of that model; the browser side lives in
//! `widget/assets/widget.js`.

mod session;
mod store;
mod transport;

use serde_json::Value;
use thiserror::Error;

pub use session::{
    Bubble, ChatSession, FAILURE_MESSAGE, PanelState, SendOutcome, Speaker, Transcript,
    TurnView, TypingIndicator,
};
pub use store::{FileTokenStore, MemoryTokenStore, TokenStore};
pub use transport::{RelayClient, RelayTransport, resolve_endpoint};

/// Client-side failures
///
/// None of these are shown to the user verbatim; the view gets the generic
/// failure bubble and the detail goes to diagnostics.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Relay base URL could not be turned into a chat endpoint
    #[error("Invalid relay endpoint: {0}")]
    InvalidEndpoint(String),

    /// Connection or transfer failure
    #[error("Network error: {0}")]
    Network(String),

    /// The relay answered but did not accept the turn
    #[error("Relay rejected the turn with status {status}: {body}")]
    Rejected { status: u16, body: Value },

    /// The relay answered with something that is not JSON
    #[error("Invalid response body: {0}")]
    InvalidBody(String),

    /// Token persistence failure
    #[error("Token storage error: {0}")]
    Storage(String),
}
