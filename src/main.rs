//! chat-evernote CLI - save AI chat transcripts as Evernote notes
//!
//! Usage:
//!   chat-evernote save       - Convert a transcript and save it as a note
//!   chat-evernote notebooks  - List notebooks in the account
//!   chat-evernote verify     - Check the developer token

use anyhow::Result;
use chat_evernote::cli::{commands, Cli, Commands};
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("chat_evernote={}", log_level)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let config = commands::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Save(args) => commands::save(&config, args),
        Commands::Notebooks { json, connection } => commands::notebooks(&config, json, connection),
        Commands::Verify { connection } => commands::verify(&config, connection),
    }
}
