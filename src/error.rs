//! Error taxonomy for everything that talks to Evernote or reads chat input.

use thiserror::Error;

pub type NoteResult<T> = Result<T, NoteError>;

#[derive(Debug, Error)]
pub enum NoteError {
    /// Bad, expired or insufficient developer token
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Network failure, timeout or a non-success HTTP status
    #[error("transport error: {0}")]
    Transport(String),

    /// Account note/upload limits reached
    #[error("quota exceeded: {0}")]
    Quota(String),

    /// Note content or fields rejected by the service
    #[error("note rejected: {0}")]
    Validation(String),

    /// Missing, unreadable or invalid local input
    #[error("invalid input: {0}")]
    Input(String),

    #[error("rate limited by Evernote: retry after {retry_after_seconds}s")]
    RateLimited { retry_after_seconds: u32 },

    /// Any other error reported by the service
    #[error("Evernote error: {0}")]
    Remote(String),

    /// Malformed or unexpected Thrift reply
    #[error("cannot decode Evernote reply: {0}")]
    Protocol(#[from] thrift::Error),
}

impl NoteError {
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

impl From<reqwest::Error> for NoteError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Transport(format!("request timed out: {}", err))
        } else {
            Self::Transport(err.to_string())
        }
    }
}
