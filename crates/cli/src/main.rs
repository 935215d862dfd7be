//! GenAIBot CLI — the main entry point.
//!
//! Commands:
//! - `doctor`  — Compose the service graph and report what was selected
//! - `chat`    — Send messages to the selected engine
//! - `engines` — List engine selector values and their settings

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use genaibot_config::DEFAULT_SETTINGS_FILE;

mod commands;

#[derive(Parser)]
#[command(
    name = "genaibot",
    about = "GenAIBot — configuration-driven conversational bot host",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Settings file, overlaid by environment variables
    #[arg(short, long, global = true, default_value = DEFAULT_SETTINGS_FILE)]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Compose the service graph and report each selected component
    Doctor,

    /// Chat with the configured engine
    Chat {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,
    },

    /// List accepted engine selectors and their required settings
    Engines,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));
    if cli.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    match cli.command {
        Commands::Doctor => commands::doctor::run(&cli.config).await?,
        Commands::Chat { message } => commands::chat::run(&cli.config, message).await?,
        Commands::Engines => commands::engines::run().await?,
    }

    Ok(())
}
