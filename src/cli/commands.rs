//! Command implementations for the chat-evernote CLI.
//!
//! Main commands:
//! - save: convert a transcript and create a note from it
//! - notebooks: list the account's notebooks
//! - verify: check the token and show the account

use crate::chat::{read_transcript, InputSource, NoteDraft};
use crate::cli::{ConnectionArgs, SaveArgs};
use crate::config::{load_env_files, Config, ConnectionSettings, TOKEN_ENV};
use crate::error::NoteResult;
use crate::evernote::{EvernoteSession, NoteClient, NoteRecord, NoteSession, NotebookRef};
use anyhow::{bail, Context, Result};
use chrono::Local;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Loads `.env`, the config file and environment overrides
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    load_env_files();
    let mut config = match path {
        Some(path) => Config::load(path)?,
        None => Config::load_default()?,
    };
    config.apply_process_env();
    Ok(config)
}

/// Resolves the draft's notebook (if any) and creates the note.
/// Nothing is created when an earlier step fails.
pub fn submit_draft<S: NoteSession>(
    client: &mut NoteClient<S>,
    draft: &NoteDraft,
) -> NoteResult<NoteRecord> {
    let notebook = match draft.notebook.as_deref() {
        Some(name) => Some(client.resolve_notebook(name)?),
        None => None,
    };
    client.create_note(&draft.title, &draft.body, notebook.as_ref(), &draft.tags)
}

fn require_token(settings: &ConnectionSettings) -> Result<&str> {
    match settings.token.as_deref() {
        Some(token) => Ok(token),
        None => {
            eprintln!("{}", "No Evernote developer token found.".yellow());
            eprintln!(
                "  Create one at {}",
                settings.environment.token_url().cyan()
            );
            eprintln!(
                "  then pass --token, set {} or add it to the config file.",
                TOKEN_ENV.bold()
            );
            bail!("Missing Evernote developer token")
        }
    }
}

fn connect(settings: &ConnectionSettings) -> Result<NoteClient<EvernoteSession>> {
    let token = require_token(settings)?;
    let endpoint = settings.endpoint();
    debug!(environment = settings.environment.name(), host = %endpoint.host, "Connecting");
    let session = EvernoteSession::authenticate(token, &endpoint)
        .with_context(|| format!("Cannot connect to Evernote ({})", settings.environment.name()))?;
    Ok(NoteClient::new(session))
}

fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Converts a transcript and saves it as a note
pub fn save(config: &Config, args: SaveArgs) -> Result<()> {
    let settings = config.connection(args.connection.token.as_deref(), args.connection.sandbox);
    require_token(&settings)?;

    let source = match args.file {
        Some(path) => InputSource::File(path),
        None => {
            if std::io::stdin().is_terminal() {
                eprintln!(
                    "{}",
                    "Paste the chat transcript, then press Ctrl-D:".cyan()
                );
            }
            InputSource::Stdin
        }
    };
    let chat = read_transcript(&source)?;
    let notebook = config.default_notebook(args.notebook.as_deref());
    let draft = NoteDraft::prepare(
        &chat,
        args.title.as_deref(),
        notebook.as_deref(),
        &args.tags,
        Local::now(),
    )?;
    debug!(source = %source, title = %draft.title, "Prepared note");

    let mut client = connect(&settings)?;
    let progress = spinner("Saving note to Evernote...");
    let result = submit_draft(&mut client, &draft);
    progress.finish_and_clear();
    let note = result.context("Cannot save note")?;

    println!("{} {}", "✓".green(), "Note saved".green().bold());
    println!("  Title:    {}", note.title);
    println!("  GUID:     {}", note.guid.cyan());
    match &note.notebook {
        Some(notebook) => println!("  Notebook: {}", notebook.name),
        None => println!("  Notebook: {}", "(default)".dimmed()),
    }
    if !note.tags.is_empty() {
        println!("  Tags:     {}", note.tags.join(", "));
    }

    Ok(())
}

/// Lists notebooks as text or JSON
pub fn notebooks(config: &Config, json: bool, connection: ConnectionArgs) -> Result<()> {
    let settings = config.connection(connection.token.as_deref(), connection.sandbox);
    let mut client = connect(&settings)?;
    let mut notebooks: Vec<NotebookRef> = client
        .list_notebooks()
        .context("Cannot list notebooks")?
        .to_vec();
    notebooks.sort_by_key(|nb| nb.name.to_lowercase());

    if json {
        println!("{}", serde_json::to_string_pretty(&notebooks)?);
        return Ok(());
    }

    if notebooks.is_empty() {
        println!("{}", "No notebooks found.".yellow());
        return Ok(());
    }

    println!(
        "{} {} notebook(s):\n",
        "Found".green(),
        notebooks.len().to_string().green().bold()
    );
    for notebook in &notebooks {
        let marker = if notebook.is_default {
            format!(" {}", "[default]".yellow())
        } else {
            String::new()
        };
        println!(
            "  {} ({}){}",
            notebook.name.bold(),
            notebook.guid.dimmed(),
            marker
        );
    }

    Ok(())
}

/// Checks the token and prints the account it belongs to
pub fn verify(config: &Config, connection: ConnectionArgs) -> Result<()> {
    let settings = config.connection(connection.token.as_deref(), connection.sandbox);
    let mut client = connect(&settings)?;
    let account = client.verify().context("Cannot verify the developer token")?;
    let count = client
        .list_notebooks()
        .context("Cannot list notebooks")?
        .len();

    println!("{} {}", "✓".green(), "Connected to Evernote".green().bold());
    println!("  Environment: {}", settings.environment.name());
    println!("  Username:    {}", account.username.cyan());
    if let Some(name) = &account.name {
        println!("  Name:        {}", name);
    }
    println!(
        "  Email:       {}",
        account.email.as_deref().unwrap_or("(hidden)")
    );
    println!("  Notebooks:   {}", count);

    Ok(())
}
