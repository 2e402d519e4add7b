pub mod chat;
pub mod send;
pub mod session;

use std::path::PathBuf;

use chatrelay::client::{ChatSession, FileTokenStore, RelayClient};

use crate::error::CliResult;

pub use chat::ChatCommand;
pub use send::SendCommand;
pub use session::SessionCommand;

/// Where the relay lives and where the continuation token is kept
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub relay_url: String,
    pub session_file: Option<PathBuf>,
}

impl SessionOptions {
    /// Token file: `--session-file`, else `~/.chatrelay/session`
    pub fn session_path(&self) -> CliResult<PathBuf> {
        self.session_file
            .clone()
            .or_else(FileTokenStore::default_path)
            .ok_or_else(|| "Cannot determine home directory; pass --session-file".into())
    }

    pub fn store(&self) -> CliResult<FileTokenStore> {
        Ok(FileTokenStore::new(self.session_path()?))
    }

    /// Open a session against the relay, resuming any stored conversation
    pub fn open(&self) -> CliResult<ChatSession<FileTokenStore, RelayClient>> {
        let transport = RelayClient::new(&self.relay_url)?;
        tracing::debug!("Relay endpoint: {}", transport.endpoint());
        Ok(ChatSession::open(self.store()?, transport))
    }
}
