//! chat-evernote - save AI chat transcripts to Evernote as ENML notes.
//!
//! Modules:
//! - `formatters`: transcript to ENML conversion
//! - `evernote`: remote session, EDAM calls and note client
//! - `chat`: transcript input, titles and tags
//! - `config`: config file, `.env` and environment overrides
//! - `cli`: command-line definitions and commands

pub mod chat;
pub mod cli;
pub mod config;
pub mod error;
pub mod evernote;
pub mod formatters;

pub use chat::NoteDraft;
pub use config::Config;
pub use error::{NoteError, NoteResult};
pub use evernote::{NoteClient, NoteSession, NotebookRef};
pub use formatters::{chat_to_enml, EnmlDocument};
