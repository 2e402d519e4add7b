use std::io::Write;
use std::time::Duration;

use chatrelay::client::{Bubble, ClientError, Speaker, TurnView};
use indicatif::{ProgressBar, ProgressStyle};

/// Renders a chat session to the terminal
///
/// The typing indicator is an `indicatif` spinner on stderr, so stdout only
/// ever carries the conversation itself.
pub struct TerminalView<W: Write> {
    out: W,
    echo_user: bool,
    spinner: Option<ProgressBar>,
}

impl TerminalView<std::io::Stdout> {
    /// View on stdout; `echo_user` repeats the user's own message
    pub fn stdout(echo_user: bool) -> Self {
        Self::new(std::io::stdout(), echo_user)
    }
}

impl<W: Write> TerminalView<W> {
    pub fn new(out: W, echo_user: bool) -> Self {
        Self {
            out,
            echo_user,
            spinner: None,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

pub fn format_bubble(bubble: &Bubble) -> String {
    match bubble.speaker {
        Speaker::User => format!("you> {}", bubble.text),
        Speaker::Assistant => {
            // Continuation lines line up under the first line of text
            let indented = bubble.text.replace('\n', "\n    ");
            format!("ai> {indented}")
        }
    }
}

impl<W: Write> TurnView for TerminalView<W> {
    fn push(&mut self, bubble: Bubble) {
        if bubble.speaker == Speaker::User && !self.echo_user {
            return;
        }

        let line = format_bubble(&bubble);
        let written = match &self.spinner {
            Some(spinner) => spinner.suspend(|| writeln!(self.out, "{line}")),
            None => writeln!(self.out, "{line}"),
        };
        if let Err(e) = written.and_then(|_| self.out.flush()) {
            tracing::warn!("Failed to write to terminal: {e}");
        }
    }

    fn show_typing(&mut self) {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        spinner.set_style(style);
        spinner.set_message("Assistant is typing…");
        spinner.enable_steady_tick(Duration::from_millis(100));
        self.spinner = Some(spinner);
    }

    fn hide_typing(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }

    fn report(&mut self, error: &ClientError) {
        tracing::warn!("{error}");
    }
}
