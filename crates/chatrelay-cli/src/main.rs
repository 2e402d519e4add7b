use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use chatrelay_cli::commands::{ChatCommand, SendCommand, SessionCommand, SessionOptions};
use chatrelay_cli::error::CliResult;

#[derive(Parser)]
#[command(name = "chatrelay-cli")]
#[command(about = "Chatrelay CLI - chat with a running relay from the terminal")]
#[command(version)]
pub struct Cli {
    #[clap(
        long,
        short = 'u',
        global = true,
        default_value = "http://localhost:3000",
        help = "Base URL of the relay"
    )]
    pub relay_url: String,

    #[clap(
        long,
        short = 's',
        global = true,
        help = "File holding the continuation token (default ~/.chatrelay/session)"
    )]
    pub session_file: Option<PathBuf>,

    #[clap(long, short, global = true, help = "Log failure details to stderr")]
    pub verbose: bool,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    #[clap(about = "Send one message and print the reply")]
    Send(SendCommand),

    #[clap(about = "Interactive chat")]
    Chat(ChatCommand),

    #[clap(about = "Inspect or reset the stored conversation")]
    Session(SessionCommand),
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> CliResult<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let options = SessionOptions {
        relay_url: cli.relay_url.clone(),
        session_file: cli.session_file.clone(),
    };

    match &cli.command {
        Command::Send(cmd) => cmd.execute(&options).await,
        Command::Chat(cmd) => cmd.execute(&options).await,
        Command::Session(cmd) => cmd.execute(&options).await,
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "chatrelay=debug,chatrelay_cli=debug" } else { "error" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
