//! Relay endpoint: HTTP surface between the widget and the completion API

mod chat;
mod error;
mod prompts;
mod server;

pub use chat::{
    ChatRequest, ChatTurn, MAX_MESSAGE_CHARS, NO_TEXT_PLACEHOLDER, RelayResponse, build_payload,
    relay_turn,
};
pub use error::ChatError;
pub use prompts::build_instructions;
pub use server::{AppState, RelayServer, create_router};
