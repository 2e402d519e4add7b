use std::ops::{Deref, DerefMut};

use tracing::{debug, warn};

use super::{ClientError, RelayTransport, TokenStore};
use crate::relay::{ChatTurn, NO_TEXT_PLACEHOLDER};

/// Shown in place of the reply whenever a turn fails
pub const FAILURE_MESSAGE: &str = "Sorry, something went wrong. Please try again.";

/// Whether the chat panel is showing
///
/// The panel only changes on an explicit user action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PanelState {
    #[default]
    Closed,
    Open,
}

impl PanelState {
    /// Flip the state and return the new one
    pub fn toggle(&mut self) -> PanelState {
        *self = match self {
            PanelState::Closed => PanelState::Open,
            PanelState::Open => PanelState::Closed,
        };
        *self
    }

    pub fn is_open(self) -> bool {
        self == PanelState::Open
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    User,
    Assistant,
}

/// One message in the conversation view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bubble {
    pub speaker: Speaker,
    pub text: String,
}

impl Bubble {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Assistant,
            text: text.into(),
        }
    }
}

/// Where a session renders its conversation
pub trait TurnView {
    /// Append a message
    fn push(&mut self, bubble: Bubble);
    fn show_typing(&mut self);
    fn hide_typing(&mut self);
    /// Diagnostic channel for failure detail; never shown as a bubble
    fn report(&mut self, error: &ClientError);
}

/// Typing indicator that is hidden again when the guard drops
///
/// Derefs to the view so the reply can be pushed while it is still showing.
pub struct TypingIndicator<'a, V: TurnView + ?Sized> {
    view: &'a mut V,
}

impl<'a, V: TurnView + ?Sized> TypingIndicator<'a, V> {
    pub fn show(view: &'a mut V) -> Self {
        view.show_typing();
        Self { view }
    }
}

impl<V: TurnView + ?Sized> Deref for TypingIndicator<'_, V> {
    type Target = V;

    fn deref(&self) -> &V {
        &*self.view
    }
}

impl<V: TurnView + ?Sized> DerefMut for TypingIndicator<'_, V> {
    fn deref_mut(&mut self) -> &mut V {
        &mut *self.view
    }
}

impl<V: TurnView + ?Sized> Drop for TypingIndicator<'_, V> {
    fn drop(&mut self) {
        self.view.hide_typing();
    }
}

/// In-memory view, used by tests and for replaying a conversation
#[derive(Debug, Default)]
pub struct Transcript {
    bubbles: Vec<Bubble>,
    typing: bool,
    typing_shown: usize,
    reports: Vec<String>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bubbles(&self) -> &[Bubble] {
        &self.bubbles
    }

    pub fn is_typing(&self) -> bool {
        self.typing
    }

    /// How many times the typing indicator was shown
    pub fn typing_shown(&self) -> usize {
        self.typing_shown
    }

    /// Failure detail that was reported
    pub fn reports(&self) -> &[String] {
        &self.reports
    }
}

impl TurnView for Transcript {
    fn push(&mut self, bubble: Bubble) {
        self.bubbles.push(bubble);
    }

    fn show_typing(&mut self) {
        self.typing = true;
        self.typing_shown += 1;
    }

    fn hide_typing(&mut self) {
        self.typing = false;
    }

    fn report(&mut self, error: &ClientError) {
        self.reports.push(error.to_string());
    }
}

/// Result of a `send`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Blank input; nothing happened
    Ignored,
    /// The assistant replied
    Replied,
    /// The failure bubble was shown
    Failed,
}

/// A widget conversation: panel state plus the continuation token
pub struct ChatSession<S, T> {
    store: S,
    transport: T,
    token: Option<String>,
    panel: PanelState,
}

impl<S: TokenStore, T: RelayTransport> ChatSession<S, T> {
    /// Start a session, picking up any token left by an earlier one
    ///
    /// An unreadable store starts the session without a token.
    pub fn open(store: S, transport: T) -> Self {
        let token = match store.load() {
            Ok(token) => token,
            Err(e) => {
                warn!("Starting without stored token: {e}");
                None
            }
        };

        debug!(resumed = token.is_some(), "Chat session opened");
        Self {
            store,
            transport,
            token,
            panel: PanelState::default(),
        }
    }

    /// The token the next turn will carry
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn panel(&self) -> PanelState {
        self.panel
    }

    pub fn toggle_panel(&mut self) -> PanelState {
        self.panel.toggle()
    }

    /// Forget the conversation, in memory and in the store
    pub fn reset(&mut self) -> Result<(), ClientError> {
        self.token = None;
        self.store.clear()
    }

    /// Send one user message and render the outcome into `view`
    ///
    /// Input is trimmed; blank input does nothing. Every failure renders
    /// [`FAILURE_MESSAGE`] and reports the detail. The typing indicator is
    /// hidden on every path out.
    pub async fn send<V: TurnView + ?Sized>(&mut self, view: &mut V, input: &str) -> SendOutcome {
        let text = input.trim();
        if text.is_empty() {
            return SendOutcome::Ignored;
        }

        view.push(Bubble::user(text));
        let mut typing = TypingIndicator::show(view);

        let turn = ChatTurn {
            message: text.to_string(),
            previous_response_id: self.token.clone(),
        };

        match self.transport.send_turn(&turn).await {
            Ok(reply) => {
                let message = if reply.assistant_message.is_empty() {
                    NO_TEXT_PLACEHOLDER.to_string()
                } else {
                    reply.assistant_message
                };
                typing.push(Bubble::assistant(message));

                if let Some(id) = reply.response_id {
                    self.token = Some(id.clone());
                    if let Err(e) = self.store.save(&id) {
                        warn!("Failed to persist continuation token: {e}");
                        typing.report(&e);
                    }
                }
                SendOutcome::Replied
            }
            Err(e) => {
                warn!("Chat turn failed: {e}");
                typing.push(Bubble::assistant(FAILURE_MESSAGE));
                typing.report(&e);
                SendOutcome::Failed
            }
        }
    }
}
