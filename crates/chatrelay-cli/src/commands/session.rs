use clap::{Parser, Subcommand};

use chatrelay::client::TokenStore;

use super::SessionOptions;
use crate::error::CliResult;

#[derive(Parser)]
pub struct SessionCommand {
    #[clap(subcommand)]
    pub command: SessionSubcommand,
}

#[derive(Subcommand)]
pub enum SessionSubcommand {
    #[clap(about = "Show the stored continuation token")]
    Show(ShowArgs),

    #[clap(about = "Forget the stored conversation")]
    Reset,
}

#[derive(Parser)]
pub struct ShowArgs {
    #[clap(long, help = "Output in JSON format")]
    pub json: bool,
}

impl SessionCommand {
    pub async fn execute(&self, options: &SessionOptions) -> CliResult<()> {
        match &self.command {
            SessionSubcommand::Show(args) => Self::show(args, options),
            SessionSubcommand::Reset => Self::reset(options),
        }
    }

    fn show(args: &ShowArgs, options: &SessionOptions) -> CliResult<()> {
        let path = options.session_path()?;
        let token = options.store()?.load()?;

        if args.json {
            let output = serde_json::json!({
                "session_file": path,
                "response_id": token,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!("Session file: {}", path.display());
            match token {
                Some(token) => println!("Continuation token: {token}"),
                None => println!("No stored conversation"),
            }
        }
        Ok(())
    }

    fn reset(options: &SessionOptions) -> CliResult<()> {
        options.store()?.clear()?;
        println!("Conversation reset");
        Ok(())
    }
}
