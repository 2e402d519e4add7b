//! Error types for Chatrelay

use thiserror::Error;

/// Main error type for startup and server lifecycle operations
#[derive(Error, Debug)]
pub enum RelayError {
    /// Configuration errors (unreadable file, bad TOML, bad listen address)
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP server errors (bind, serve)
    #[error("Server error: {0}")]
    Server(String),

    /// Upstream client construction errors
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Chatrelay operations
pub type Result<T> = std::result::Result<T, RelayError>;
