use clap::Parser;

use chatrelay::client::SendOutcome;

use super::SessionOptions;
use crate::error::CliResult;
use crate::output::TerminalView;

#[derive(Parser)]
pub struct SendCommand {
    #[clap(help = "Message to send", required = true, num_args = 1..)]
    pub message: Vec<String>,

    #[clap(long, help = "Start a new conversation instead of continuing the stored one")]
    pub new: bool,
}

impl SendCommand {
    pub async fn execute(&self, options: &SessionOptions) -> CliResult<()> {
        let mut session = options.open()?;
        if self.new {
            session.reset()?;
        }

        let message = self.message.join(" ");
        let mut view = TerminalView::stdout(false);

        match session.send(&mut view, &message).await {
            SendOutcome::Replied => Ok(()),
            SendOutcome::Ignored => Err("Message is empty".into()),
            SendOutcome::Failed => Err("Chat turn failed (run with -v for details)".into()),
        }
    }
}
