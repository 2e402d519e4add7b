pub mod commands;
pub mod error;
pub mod output;

pub use commands::{ChatCommand, SendCommand, SessionCommand, SessionOptions};
pub use error::{CliError, CliResult};
pub use output::TerminalView;
