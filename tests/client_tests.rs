//! Integration tests for notebook resolution and the save flow,
//! run against an in-memory note service.

mod common;

use chat_evernote::cli::commands::submit_draft;
use chat_evernote::{NoteClient, NoteDraft, NoteError};
use chrono::{Local, TimeZone};
use common::FakeSession;

fn draft(chat: &str, notebook: Option<&str>, tags: &[&str]) -> NoteDraft {
    let now = Local.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap();
    let tags: Vec<String> = tags.iter().map(|t| t.to_string()).collect();
    NoteDraft::prepare(chat, None, notebook, &tags, now).expect("valid draft")
}

mod resolve_notebook {
    use super::*;

    #[test]
    fn test_creates_missing_notebook_exactly_once() {
        let mut client = NoteClient::new(FakeSession::with_notebooks(&["Inbox"]));

        let first = client.resolve_notebook("X").unwrap();
        assert_eq!(first.name, "X");
        assert_eq!(client.session().notebooks_created.get(), 1);

        let second = client.resolve_notebook("X").unwrap();
        assert_eq!(second.guid, first.guid);
        assert_eq!(client.session().notebooks_created.get(), 1);
        assert_eq!(client.session().list_calls.get(), 1);
    }

    #[test]
    fn test_existing_notebook_is_reused() {
        let mut client = NoteClient::new(FakeSession::with_notebooks(&["Inbox", "Chats"]));

        let found = client.resolve_notebook("Chats").unwrap();
        assert_eq!(found.guid, "existing-2");
        assert_eq!(client.session().notebooks_created.get(), 0);
    }

    #[test]
    fn test_listing_marks_default_notebook() {
        let mut client = NoteClient::new(FakeSession::with_notebooks(&["Inbox", "Chats"]));

        let notebooks = client.list_notebooks().unwrap();
        assert_eq!(notebooks.len(), 2);
        assert!(notebooks[0].is_default);
        assert!(!notebooks[1].is_default);
    }
}

mod save_flow {
    use super::*;

    #[test]
    fn test_saves_into_requested_notebook() {
        let mut client = NoteClient::new(FakeSession::with_notebooks(&["Inbox"]));
        let draft = draft("# Lifetimes\nHuman: hi", Some("Claude Chats"), &["ai", "AI", "rust"]);

        let record = submit_draft(&mut client, &draft).unwrap();
        assert_eq!(record.guid, "note-1");
        assert_eq!(record.title, "Lifetimes");
        assert_eq!(record.tags, vec!["ai", "rust"]);
        assert_eq!(record.notebook.as_ref().map(|nb| nb.name.as_str()), Some("Claude Chats"));

        let notes = client.session().notes.borrow();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].notebook_guid.as_deref(), Some("created-1"));
        assert!(notes[0].content.starts_with("<?xml"));
    }

    #[test]
    fn test_default_notebook_skips_resolution() {
        let mut client = NoteClient::new(FakeSession::with_notebooks(&["Inbox"]));
        let draft = draft("Human: hi", None, &[]);

        let record = submit_draft(&mut client, &draft).unwrap();
        assert!(record.notebook.is_none());
        assert_eq!(record.title, "Claude Chat - 2024-05-01 09:30");
        assert_eq!(client.session().list_calls.get(), 0);
        assert_eq!(client.session().notes.borrow()[0].notebook_guid, None);
    }

    #[test]
    fn test_validation_error_propagates_without_note() {
        let session = FakeSession::failing_with(NoteError::Validation(
            "ENML_VALIDATION: Note.content".to_string(),
        ));
        let mut client = NoteClient::new(session);
        let draft = draft("Human: hi", Some("Chats"), &[]);

        let err = submit_draft(&mut client, &draft).unwrap_err();
        assert!(err.is_validation());
        assert!(client.session().notes.borrow().is_empty());
    }

    #[test]
    fn test_quota_error_propagates() {
        let session = FakeSession::failing_with(NoteError::Quota("UPLOAD_LIMIT".to_string()));
        let mut client = NoteClient::new(session);

        let err = submit_draft(&mut client, &draft("Human: hi", None, &[])).unwrap_err();
        assert!(matches!(err, NoteError::Quota(_)));
        assert!(client.session().notes.borrow().is_empty());
    }
}
