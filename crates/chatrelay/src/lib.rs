//! Chatrelay - server-side relay between an embeddable chat widget and an
//! LLM completion API
//!
//! The relay keeps the API credential on the server, threads the upstream
//! continuation token through the widget, and reduces model output to plain
//! text before it reaches the browser.

pub mod client;
pub mod config;
pub mod error;
pub mod relay;
pub mod sanitize;
pub mod upstream;
pub mod widget;

pub use error::RelayError;
pub use sanitize::sanitize;
