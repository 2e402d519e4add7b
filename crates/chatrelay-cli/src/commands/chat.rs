use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};

use chatrelay::client::{ChatSession, PanelState, RelayTransport, TokenStore};

use super::SessionOptions;
use crate::error::CliResult;
use crate::output::TerminalView;

const HELP: &str = "Commands: /open, /close, /reset, /quit";

#[derive(Parser)]
pub struct ChatCommand {
    #[clap(long, help = "Open the chat panel immediately")]
    pub open: bool,
}

/// What a line of input asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatInput {
    Open,
    Close,
    Reset,
    Quit,
    Help,
    Message(String),
}

impl ChatInput {
    pub fn parse(line: &str) -> Self {
        match line.trim() {
            "/open" => ChatInput::Open,
            "/close" => ChatInput::Close,
            "/reset" => ChatInput::Reset,
            "/quit" | "/exit" => ChatInput::Quit,
            "/help" => ChatInput::Help,
            other => ChatInput::Message(other.to_string()),
        }
    }
}

impl ChatCommand {
    pub async fn execute(&self, options: &SessionOptions) -> CliResult<()> {
        let mut session = options.open()?;
        let mut view = TerminalView::stdout(false);

        if session.token().is_some() {
            println!("Resuming previous conversation (/reset to start over)");
        }

        if self.open {
            session.toggle_panel();
        }
        print_panel(session.panel());

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await? {
            let input = ChatInput::parse(&line);
            if !step(&mut session, &mut view, input).await? {
                break;
            }
        }

        Ok(())
    }
}

/// Handle one line; returns false when the user quits
async fn step<S, T>(
    session: &mut ChatSession<S, T>,
    view: &mut TerminalView<std::io::Stdout>,
    input: ChatInput,
) -> CliResult<bool>
where
    S: TokenStore,
    T: RelayTransport,
{
    match (session.panel(), input) {
        (_, ChatInput::Quit) => return Ok(false),
        (_, ChatInput::Help) => println!("{HELP}"),
        (_, ChatInput::Reset) => {
            session.reset()?;
            println!("Conversation reset");
        }
        (PanelState::Closed, ChatInput::Open) | (PanelState::Open, ChatInput::Close) => {
            print_panel(session.toggle_panel());
        }
        (PanelState::Open, ChatInput::Open) | (PanelState::Closed, ChatInput::Close) => {}
        (PanelState::Open, ChatInput::Message(text)) => {
            session.send(view, &text).await;
        }
        (PanelState::Closed, ChatInput::Message(_)) => {
            println!("Chat is closed. Type /open to start chatting.");
        }
    }
    Ok(true)
}

fn print_panel(panel: PanelState) {
    match panel {
        PanelState::Open => println!("Chat open. {HELP}"),
        PanelState::Closed => println!("Chat closed. Type /open to start chatting, /quit to leave."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(ChatInput::parse("/open"), ChatInput::Open);
        assert_eq!(ChatInput::parse("  /close \n"), ChatInput::Close);
        assert_eq!(ChatInput::parse("/reset"), ChatInput::Reset);
        assert_eq!(ChatInput::parse("/quit"), ChatInput::Quit);
        assert_eq!(ChatInput::parse("/exit"), ChatInput::Quit);
        assert_eq!(
            ChatInput::parse("what is /open?"),
            ChatInput::Message("what is /open?".to_string())
        );
    }
}
