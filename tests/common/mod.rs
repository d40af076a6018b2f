//! Shared helpers for integration tests.

#![allow(dead_code)]

use chat_evernote::evernote::{AccountInfo, NewNote, NoteSession, NotebookRef};
use chat_evernote::{NoteError, NoteResult};
use std::cell::{Cell, RefCell};
use std::path::PathBuf;

/// Helper: get absolute path to a test fixture file.
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// A note stored by `FakeSession`
#[derive(Debug, Clone)]
pub struct StoredNote {
    pub guid: String,
    pub title: String,
    pub content: String,
    pub notebook_guid: Option<String>,
    pub tags: Vec<String>,
}

/// In-memory note service
#[derive(Default)]
pub struct FakeSession {
    pub notebooks: RefCell<Vec<NotebookRef>>,
    pub notes: RefCell<Vec<StoredNote>>,
    pub list_calls: Cell<usize>,
    pub notebooks_created: Cell<usize>,
    /// Returned by the next `create_note` instead of storing the note
    pub fail_create_note: RefCell<Option<NoteError>>,
}

impl FakeSession {
    pub fn with_notebooks(names: &[&str]) -> Self {
        let session = Self::default();
        for (i, name) in names.iter().enumerate() {
            session.notebooks.borrow_mut().push(NotebookRef {
                name: name.to_string(),
                guid: format!("existing-{}", i + 1),
                is_default: i == 0,
            });
        }
        session
    }

    pub fn failing_with(err: NoteError) -> Self {
        let session = Self::default();
        *session.fail_create_note.borrow_mut() = Some(err);
        session
    }
}

impl NoteSession for FakeSession {
    fn account(&self) -> NoteResult<AccountInfo> {
        Ok(AccountInfo {
            id: 42,
            username: "tester".to_string(),
            email: Some("tester@example.com".to_string()),
            name: None,
        })
    }

    fn list_notebooks(&self) -> NoteResult<Vec<NotebookRef>> {
        self.list_calls.set(self.list_calls.get() + 1);
        Ok(self.notebooks.borrow().clone())
    }

    fn create_notebook(&self, name: &str) -> NoteResult<NotebookRef> {
        self.notebooks_created.set(self.notebooks_created.get() + 1);
        let notebook = NotebookRef {
            name: name.to_string(),
            guid: format!("created-{}", self.notebooks_created.get()),
            is_default: false,
        };
        self.notebooks.borrow_mut().push(notebook.clone());
        Ok(notebook)
    }

    fn create_note(&self, note: &NewNote<'_>) -> NoteResult<String> {
        if let Some(err) = self.fail_create_note.borrow_mut().take() {
            return Err(err);
        }
        let guid = format!("note-{}", self.notes.borrow().len() + 1);
        self.notes.borrow_mut().push(StoredNote {
            guid: guid.clone(),
            title: note.title.to_string(),
            content: note.content.as_str().to_string(),
            notebook_guid: note.notebook_guid.map(str::to_string),
            tags: note.tags.to_vec(),
        });
        Ok(guid)
    }
}
