//! Chat input - reading transcripts and preparing the note fields.

use crate::error::{NoteError, NoteResult};
use crate::formatters::enml::parse_heading;
use crate::formatters::{chat_to_enml, EnmlDocument};
use chrono::{DateTime, Local};
use std::fmt;
use std::io::Read;
use std::path::PathBuf;

/// Evernote limits on note titles, tag names and notebook names
pub const MAX_TITLE_LEN: usize = 255;
pub const MAX_TAG_LEN: usize = 100;
pub const MAX_NOTEBOOK_NAME_LEN: usize = 100;

/// Prefix of auto-generated titles
pub const DEFAULT_TITLE_PREFIX: &str = "Claude Chat";

/// Where the transcript comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    File(PathBuf),
    Stdin,
}

impl fmt::Display for InputSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Stdin => f.write_str("standard input"),
        }
    }
}

/// Reads the whole transcript; empty or whitespace-only input is an error
pub fn read_transcript(source: &InputSource) -> NoteResult<String> {
    let content = match source {
        InputSource::File(path) => std::fs::read_to_string(path)
            .map_err(|e| NoteError::Input(format!("cannot read {}: {}", path.display(), e)))?,
        InputSource::Stdin => read_all(std::io::stdin().lock())?,
    };
    ensure_content(content)
}

/// Reads a transcript from any reader
pub fn read_all(mut reader: impl Read) -> NoteResult<String> {
    let mut content = String::new();
    reader
        .read_to_string(&mut content)
        .map_err(|e| NoteError::Input(format!("cannot read standard input: {}", e)))?;
    Ok(content)
}

fn ensure_content(content: String) -> NoteResult<String> {
    if content.trim().is_empty() {
        return Err(NoteError::Input("no content provided".to_string()));
    }
    Ok(content)
}

/// Cleans a title for Evernote: no control characters, no surrounding
/// whitespace, at most 255 characters. `None` when nothing is left.
pub fn sanitize_title(raw: &str) -> Option<String> {
    let cleaned: String = raw
        .chars()
        .map(|c| {
            if c.is_control() || c == '\u{2028}' || c == '\u{2029}' {
                ' '
            } else {
                c
            }
        })
        .collect();
    let truncated: String = cleaned.trim().chars().take(MAX_TITLE_LEN).collect();
    let title = truncated.trim_end();
    (!title.is_empty()).then(|| title.to_string())
}

/// Explicit title if usable, else the transcript's leading heading,
/// else `Claude Chat - <local timestamp>`
pub fn derive_title(explicit: Option<&str>, chat: &str, now: DateTime<Local>) -> String {
    explicit
        .and_then(sanitize_title)
        .or_else(|| leading_heading(chat))
        .unwrap_or_else(|| format!("{} - {}", DEFAULT_TITLE_PREFIX, now.format("%Y-%m-%d %H:%M")))
}

fn leading_heading(chat: &str) -> Option<String> {
    let first = chat.lines().find(|line| !line.trim().is_empty())?;
    let (_, text) = parse_heading(first)?;
    let plain: String = text.chars().filter(|c| *c != '*' && *c != '`').collect();
    sanitize_title(&plain)
}

/// Trims tags, drops blanks and case-insensitive duplicates (first spelling
/// wins). Commas, control characters and over-long names are rejected.
pub fn normalize_tags(tags: &[String]) -> NoteResult<Vec<String>> {
    let mut normalized: Vec<String> = Vec::with_capacity(tags.len());
    for raw in tags {
        let tag = raw.trim();
        if tag.is_empty() {
            continue;
        }
        if tag.contains(',') {
            return Err(NoteError::Input(format!(
                "tag '{}' cannot contain a comma",
                tag
            )));
        }
        if tag.chars().any(char::is_control) {
            return Err(NoteError::Input(format!(
                "tag '{}' contains control characters",
                tag.escape_debug()
            )));
        }
        if tag.chars().count() > MAX_TAG_LEN {
            return Err(NoteError::Input(format!(
                "tag '{}' is longer than {} characters",
                tag, MAX_TAG_LEN
            )));
        }
        let lower = tag.to_lowercase();
        if !normalized.iter().any(|t| t.to_lowercase() == lower) {
            normalized.push(tag.to_string());
        }
    }
    Ok(normalized)
}

/// Trimmed notebook name; blank means "no notebook requested"
pub fn normalize_notebook_name(name: &str) -> NoteResult<Option<String>> {
    let name = name.trim();
    if name.is_empty() {
        return Ok(None);
    }
    if name.chars().any(char::is_control) {
        return Err(NoteError::Input(format!(
            "notebook name '{}' contains control characters",
            name.escape_debug()
        )));
    }
    if name.chars().count() > MAX_NOTEBOOK_NAME_LEN {
        return Err(NoteError::Input(format!(
            "notebook name '{}' is longer than {} characters",
            name, MAX_NOTEBOOK_NAME_LEN
        )));
    }
    Ok(Some(name.to_string()))
}

/// Everything needed to create the note, prepared before any remote call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteDraft {
    pub title: String,
    pub body: EnmlDocument,
    /// Requested notebook; `None` uses the account default
    pub notebook: Option<String>,
    pub tags: Vec<String>,
}

impl NoteDraft {
    pub fn prepare(
        chat: &str,
        title: Option<&str>,
        notebook: Option<&str>,
        tags: &[String],
        now: DateTime<Local>,
    ) -> NoteResult<Self> {
        if chat.trim().is_empty() {
            return Err(NoteError::Input("no content provided".to_string()));
        }
        let notebook = match notebook {
            Some(name) => normalize_notebook_name(name)?,
            None => None,
        };
        Ok(Self {
            title: derive_title(title, chat, now),
            body: chat_to_enml(chat),
            notebook,
            tags: normalize_tags(tags)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn noon() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 9, 12, 5, 0).unwrap()
    }

    fn tags(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_read_transcript_from_file() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("chat.md");
        std::fs::write(&path, "Human: hi\n")?;

        let content = read_transcript(&InputSource::File(path))?;
        assert_eq!(content, "Human: hi\n");
        Ok(())
    }

    #[test]
    fn test_missing_file_is_input_error() {
        let source = InputSource::File(PathBuf::from("/nonexistent/chat.md"));
        let err = read_transcript(&source).unwrap_err();
        assert!(matches!(err, NoteError::Input(ref msg) if msg.contains("/nonexistent/chat.md")));
    }

    #[test]
    fn test_blank_content_is_rejected() {
        let content = read_all(Cursor::new("  \n\t\n")).unwrap();
        assert!(matches!(
            ensure_content(content),
            Err(NoteError::Input(_))
        ));
    }

    #[test]
    fn test_explicit_title_wins() {
        assert_eq!(derive_title(Some("  My Chat "), "# Heading", noon()), "My Chat");
    }

    #[test]
    fn test_title_from_leading_heading() {
        assert_eq!(
            derive_title(None, "\n# Rust **ownership** Q&A\nHuman: hi", noon()),
            "Rust ownership Q&A"
        );
    }

    #[test]
    fn test_title_falls_back_to_timestamp() {
        assert_eq!(
            derive_title(None, "Human: hi\n# Later heading", noon()),
            "Claude Chat - 2024-03-09 12:05"
        );
        assert_eq!(
            derive_title(Some("\n\t"), "Human: hi", noon()),
            "Claude Chat - 2024-03-09 12:05"
        );
    }

    #[test]
    fn test_sanitize_title() {
        assert_eq!(sanitize_title("a\nb\tc").as_deref(), Some("a b c"));
        let long = "x".repeat(300);
        assert_eq!(sanitize_title(&long).map(|t| t.chars().count()), Some(255));
        assert_eq!(sanitize_title(" \u{7} "), None);
    }

    #[test]
    fn test_normalize_tags() {
        let out = normalize_tags(&tags(&[" ai ", "", "AI", "rust", "Rust "])).unwrap();
        assert_eq!(out, tags(&["ai", "rust"]));
    }

    #[test]
    fn test_invalid_tags() {
        assert!(normalize_tags(&tags(&["a,b"])).is_err());
        assert!(normalize_tags(&tags(&["a\u{1}b"])).is_err());
        assert!(normalize_tags(&[("t".repeat(101))]).is_err());
        assert!(normalize_tags(&[("t".repeat(100))]).is_ok());
    }

    #[test]
    fn test_notebook_name() {
        assert_eq!(normalize_notebook_name("  ").unwrap(), None);
        assert_eq!(
            normalize_notebook_name(" Chats ").unwrap().as_deref(),
            Some("Chats")
        );
        assert!(normalize_notebook_name(&"n".repeat(101)).is_err());
    }

    #[test]
    fn test_notebook_name_rejects_control_characters() {
        let err = normalize_notebook_name("Chats\u{7}").unwrap_err();
        assert!(matches!(err, NoteError::Input(ref msg) if msg.contains("control characters")));
        assert!(normalize_notebook_name("Work\tLog").is_err());

        let err = NoteDraft::prepare("Human: hi", None, Some("a\u{0}b"), &[], noon()).unwrap_err();
        assert!(matches!(err, NoteError::Input(_)));
    }

    #[test]
    fn test_prepare_draft() {
        let draft = NoteDraft::prepare(
            "# Topic\nHuman: hi",
            None,
            Some("Chats"),
            &tags(&["ai"]),
            noon(),
        )
        .unwrap();
        assert_eq!(draft.title, "Topic");
        assert_eq!(draft.notebook.as_deref(), Some("Chats"));
        assert_eq!(draft.tags, tags(&["ai"]));
        assert!(draft.body.body().starts_with("<h1>Topic</h1>"));
    }

    #[test]
    fn test_prepare_rejects_empty_chat() {
        let err = NoteDraft::prepare(" \n", None, None, &[], noon()).unwrap_err();
        assert!(matches!(err, NoteError::Input(_)));
    }
}
