//! Config module - settings for chat-evernote (config.toml).
//!
//! Values come from three layers, highest first:
//! - command-line flags
//! - environment variables (optionally loaded from a `.env` file)
//! - the config file

use crate::evernote::{Environment, ServiceEndpoint, DEFAULT_TIMEOUT_SECS};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

pub const TOKEN_ENV: &str = "EVERNOTE_DEV_TOKEN";
pub const SANDBOX_ENV: &str = "EVERNOTE_SANDBOX";
pub const NOTEBOOK_ENV: &str = "EVERNOTE_NOTEBOOK";

/// Dotenv file looked up in the home directory
const HOME_ENV_FILE: &str = ".chat-evernote.env";

/// Evernote connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvernoteConfig {
    /// Developer token
    pub token: Option<String>,
    /// Use sandbox.evernote.com instead of production
    #[serde(default)]
    pub sandbox: bool,
    /// Replaces the environment's host, e.g. for a local test server
    pub service_host: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for EvernoteConfig {
    fn default() -> Self {
        Self {
            token: None,
            sandbox: false,
            service_host: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DefaultsConfig {
    /// Notebook used when `save` is given none
    pub notebook: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub evernote: EvernoteConfig,

    #[serde(default)]
    pub defaults: DefaultsConfig,
}

/// Default config directory (~/.config/chat-evernote/)
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("chat-evernote"))
        .unwrap_or_else(|| PathBuf::from("."))
}

pub fn default_config_path() -> PathBuf {
    default_config_dir().join("config.toml")
}

/// Loads `./.env`, or failing that `~/.chat-evernote.env`.
/// Variables already set in the process are never overridden.
pub fn load_env_files() -> Option<PathBuf> {
    let candidates = [
        Some(PathBuf::from(".env")),
        dirs::home_dir().map(|home| home.join(HOME_ENV_FILE)),
    ];
    for path in candidates.into_iter().flatten() {
        if path.is_file() && dotenvy::from_path(&path).is_ok() {
            debug!(path = %path.display(), "Loaded environment file");
            return Some(path);
        }
    }
    None
}

/// Resolved settings for one connection to the service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionSettings {
    pub token: Option<String>,
    pub environment: Environment,
    pub service_host: Option<String>,
    pub timeout: Duration,
}

impl ConnectionSettings {
    pub fn endpoint(&self) -> ServiceEndpoint {
        let endpoint = ServiceEndpoint::new(self.environment).with_timeout(self.timeout);
        match &self.service_host {
            Some(host) => endpoint.with_host(host.clone()),
            None => endpoint,
        }
    }
}

impl Config {
    /// Load config from a file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Cannot parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load config from the default path, or defaults when it does not exist
    pub fn load_default() -> Result<Self> {
        let path = default_config_path();
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Overlays environment variables read through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = non_empty(lookup(TOKEN_ENV)) {
            self.evernote.token = Some(token);
        }
        if let Some(sandbox) = non_empty(lookup(SANDBOX_ENV)) {
            self.evernote.sandbox = parse_flag(&sandbox);
        }
        if let Some(notebook) = non_empty(lookup(NOTEBOOK_ENV)) {
            self.defaults.notebook = Some(notebook);
        }
    }

    pub fn apply_process_env(&mut self) {
        self.apply_env(|key| std::env::var(key).ok());
    }

    /// Connection settings with command-line overrides applied.
    /// `--sandbox` can only switch the sandbox on.
    pub fn connection(&self, token: Option<&str>, sandbox: bool) -> ConnectionSettings {
        let token = non_empty(token.map(str::to_string))
            .or_else(|| non_empty(self.evernote.token.clone()));
        ConnectionSettings {
            token,
            environment: Environment::from_sandbox_flag(sandbox || self.evernote.sandbox),
            service_host: non_empty(self.evernote.service_host.clone()),
            timeout: Duration::from_secs(self.evernote.timeout_secs.max(1)),
        }
    }

    /// Notebook to file into: the flag, else the configured default
    pub fn default_notebook(&self, flag: Option<&str>) -> Option<String> {
        non_empty(flag.map(str::to_string)).or_else(|| non_empty(self.defaults.notebook.clone()))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes"
    )
}
