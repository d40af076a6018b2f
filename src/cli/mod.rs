//! CLI definitions and command implementations for chat-evernote.

pub mod commands;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// chat-evernote - save AI chat transcripts as Evernote notes
#[derive(Parser)]
#[command(name = "chat-evernote")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file (default: ~/.config/chat-evernote/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Credential and environment overrides shared by every command
#[derive(Args, Debug, Clone, Default)]
pub struct ConnectionArgs {
    /// Evernote developer token (overrides EVERNOTE_DEV_TOKEN)
    #[arg(long, value_name = "TOKEN")]
    pub token: Option<String>,

    /// Use the sandbox service
    #[arg(long)]
    pub sandbox: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct SaveArgs {
    /// Markdown transcript to read (default: standard input)
    #[arg(short, long, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Note title (default: leading heading or a timestamp)
    #[arg(short, long)]
    pub title: Option<String>,

    /// Notebook to save into, created when missing
    #[arg(short, long)]
    pub notebook: Option<String>,

    /// Tag to attach; repeat for several
    #[arg(short = 'g', long = "tags", value_name = "TAG")]
    pub tags: Vec<String>,

    #[command(flatten)]
    pub connection: ConnectionArgs,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert a chat transcript and save it as a note
    Save(SaveArgs),

    /// List the notebooks in the account
    Notebooks {
        /// Print a JSON array instead of text
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        connection: ConnectionArgs,
    },

    /// Check the developer token and show the account
    Verify {
        #[command(flatten)]
        connection: ConnectionArgs,
    },
}
