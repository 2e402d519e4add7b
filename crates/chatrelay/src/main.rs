//! Chatrelay daemon - chat relay between an embeddable widget and an LLM API

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use chatrelay::RelayError;
use chatrelay::config::Config;
use chatrelay::error::Result;
use chatrelay::relay::RelayServer;

/// Chatrelay - keeps your LLM API key on the server while a widget chats
#[derive(Parser)]
#[command(name = "chatrelay")]
#[command(about = "A chat relay between an embeddable website widget and an LLM completion API")]
#[command(version)]
pub struct Cli {
    /// Path to config file
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the relay server (default command)
    #[command(name = "serve")]
    Serve,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    init_logging();

    let cli = Cli::parse();

    match cli.command {
        None | Some(Command::Serve) => serve(cli.config).await,
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,chatrelay=debug,tower_http=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn read_config(path: &Path) -> Result<Config> {
    tracing::info!("Loading config from: {}", path.display());
    let content = std::fs::read_to_string(path).map_err(|e| {
        RelayError::Config(format!(
            "Failed to read config file {}: {e}",
            path.display()
        ))
    })?;
    toml::from_str(&content).map_err(|e| RelayError::Config(format!("Failed to parse config: {e}")))
}

fn load_config(config_path: Option<PathBuf>) -> Result<Config> {
    let mut config = match config_path {
        Some(path) => read_config(&path)?,
        None => {
            let default_paths = [
                dirs::home_dir().map(|h| h.join(".chatrelay").join("config.toml")),
                dirs::config_dir().map(|c| c.join("chatrelay").join("config.toml")),
                Some(PathBuf::from("config.toml")),
            ];

            match default_paths.iter().flatten().find(|p| p.exists()) {
                Some(path) => read_config(path)?,
                None => {
                    tracing::info!("No config file found, using defaults");
                    Config::default()
                }
            }
        }
    };

    config.apply_env();
    Ok(config)
}

async fn serve(config_path: Option<PathBuf>) -> Result<()> {
    tracing::info!("Starting Chatrelay");

    let config = load_config(config_path)?;
    tracing::debug!("Config loaded: {:?}", config);

    let api_key = config.resolve_api_key();
    let server = RelayServer::new(config, api_key);
    server.serve().await?;

    tracing::info!("Chatrelay stopped");
    Ok(())
}
