//! Development tasks for the capability workspace
//!
//! This binary provides development utilities using the cargo-xtask pattern.
//! Run with: `cargo xtask <command>`

mod commands;

use anyhow::Result;
use clap::Parser;
use commands::Attachments;
use tracing_subscriber::EnvFilter;

/// Development tasks for the capability workspace
#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Development tools for capability attachments", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Edit attachments in an entity save file (dev mode only)
    Attachments(Attachments),
}

fn main() -> Result<()> {
    // Load .env file if it exists (for CAPABILITY_DEV_MODE and friends)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Attachments(cmd) => cmd.execute(),
    }
}
