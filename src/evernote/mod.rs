//! Evernote module - remote notebooks and notes behind a session abstraction.
//!
//! This module contains:
//! - `NoteSession`: the four remote operations the tool needs
//! - `NoteClient`: notebook resolution and note creation on top of a session
//! - `EvernoteSession`: the real session, EDAM over Thrift over HTTPS

pub mod client;
pub mod edam;
pub mod http;

pub use client::NoteClient;
pub use http::EvernoteSession;

use crate::error::NoteResult;
use crate::formatters::EnmlDocument;
use serde::Serialize;
use std::time::Duration;

/// Default HTTP timeout for Evernote calls
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// A notebook as seen by this tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotebookRef {
    pub name: String,
    pub guid: String,
    /// The account's default notebook
    #[serde(rename = "default")]
    pub is_default: bool,
}

/// The authenticated account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountInfo {
    pub id: i32,
    pub username: String,
    pub email: Option<String>,
    pub name: Option<String>,
}

/// Fields of a note about to be created
#[derive(Debug, Clone, Copy)]
pub struct NewNote<'a> {
    pub title: &'a str,
    pub content: &'a EnmlDocument,
    /// `None` files the note in the account's default notebook
    pub notebook_guid: Option<&'a str>,
    pub tags: &'a [String],
}

/// A note that exists on the service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteRecord {
    pub guid: String,
    pub title: String,
    pub body: EnmlDocument,
    pub notebook: Option<NotebookRef>,
    pub tags: Vec<String>,
}

/// Authenticated handle to the note service, valid for one invocation
///
/// Every call blocks until the service answers; errors are never retried.
pub trait NoteSession {
    /// The account the credential belongs to
    fn account(&self) -> NoteResult<AccountInfo>;

    /// Every notebook in the account
    fn list_notebooks(&self) -> NoteResult<Vec<NotebookRef>>;

    /// Creates a notebook and returns it with its service-assigned guid
    fn create_notebook(&self, name: &str) -> NoteResult<NotebookRef>;

    /// Creates a note and returns its guid
    fn create_note(&self, note: &NewNote<'_>) -> NoteResult<String>;
}

/// Production or sandbox service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Production,
    Sandbox,
}

impl Environment {
    pub fn from_sandbox_flag(sandbox: bool) -> Self {
        if sandbox {
            Self::Sandbox
        } else {
            Self::Production
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Production => "production",
            Self::Sandbox => "sandbox",
        }
    }

    pub fn host(self) -> &'static str {
        match self {
            Self::Production => "www.evernote.com",
            Self::Sandbox => "sandbox.evernote.com",
        }
    }

    /// Where a developer token for this environment can be created
    pub fn token_url(self) -> String {
        format!("https://{}/api/DeveloperToken.action", self.host())
    }
}

/// Where and how to reach the service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceEndpoint {
    pub host: String,
    pub timeout: Duration,
}

impl ServiceEndpoint {
    pub fn new(environment: Environment) -> Self {
        Self {
            host: environment.host().to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// UserStore endpoint; a full URL in `host` is used as the base as-is
    pub fn user_store_url(&self) -> String {
        let base = self.host.trim_end_matches('/');
        if base.starts_with("http://") || base.starts_with("https://") {
            format!("{}/edam/user", base)
        } else {
            format!("https://{}/edam/user", base)
        }
    }
}
