//! Privateer CLI - Capability URL server
//!
//! Usage:
//!   privateer serve [--config FILE] [--port N] [--bind ADDR]
//!   privateer init [dir]

use clap::{Parser, Subcommand};
use cli::commands::{InitCommand, ServeCommand};

#[derive(Parser)]
#[command(name = "privateer")]
#[command(about = "Privateer - unguessable URLs for private resources")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the server
    Serve(ServeCommand),
    /// Write an example privateer.json
    Init(InitCommand),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve(cmd) => cmd.run().await,
        Commands::Init(cmd) => cmd.run(),
    }
}
