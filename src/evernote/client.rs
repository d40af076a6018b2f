//! NoteClient - notebook resolution and note creation over one session.

use super::{AccountInfo, NewNote, NoteRecord, NoteSession, NotebookRef};
use crate::error::{NoteError, NoteResult};
use crate::formatters::EnmlDocument;
use tracing::{debug, info};

/// Wraps a `NoteSession` and caches the notebook list for its lifetime
pub struct NoteClient<S> {
    session: S,
    notebooks: Option<Vec<NotebookRef>>,
}

impl<S: NoteSession> NoteClient<S> {
    pub fn new(session: S) -> Self {
        Self {
            session,
            notebooks: None,
        }
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    /// Checks the credential by fetching the account it belongs to
    pub fn verify(&self) -> NoteResult<AccountInfo> {
        let account = self.session.account()?;
        info!(username = %account.username, "Connection verified");
        Ok(account)
    }

    /// All notebooks in the account, fetched once per client
    pub fn list_notebooks(&mut self) -> NoteResult<&[NotebookRef]> {
        let notebooks = match self.notebooks.take() {
            Some(cached) => cached,
            None => {
                debug!("Fetching notebooks from Evernote");
                self.session.list_notebooks()?
            }
        };
        Ok(self.notebooks.insert(notebooks).as_slice())
    }

    /// Finds the notebook named exactly `name`, creating it when absent
    pub fn resolve_notebook(&mut self, name: &str) -> NoteResult<NotebookRef> {
        if name.trim().is_empty() {
            return Err(NoteError::Input("notebook name cannot be empty".to_string()));
        }

        if let Some(found) = self.list_notebooks()?.iter().find(|nb| nb.name == name) {
            debug!(notebook = name, guid = %found.guid, "Found notebook");
            return Ok(found.clone());
        }

        info!(notebook = name, "Notebook not found, creating it");
        let created = self.session.create_notebook(name)?;
        info!(notebook = name, guid = %created.guid, "Created notebook");
        if let Some(cached) = self.notebooks.as_mut() {
            cached.push(created.clone());
        }
        Ok(created)
    }

    /// Submits a new note; `None` notebook means the account default
    pub fn create_note(
        &self,
        title: &str,
        body: &EnmlDocument,
        notebook: Option<&NotebookRef>,
        tags: &[String],
    ) -> NoteResult<NoteRecord> {
        debug!(title, tags = ?tags, "Creating note");
        let guid = self.session.create_note(&NewNote {
            title,
            content: body,
            notebook_guid: notebook.map(|nb| nb.guid.as_str()),
            tags,
        })?;
        info!(guid = %guid, "Note created");

        Ok(NoteRecord {
            guid,
            title: title.to_string(),
            body: body.clone(),
            notebook: notebook.cloned(),
            tags: tags.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Session that records calls and serves notebooks from memory
    #[derive(Default)]
    struct RecordingSession {
        notebooks: RefCell<Vec<NotebookRef>>,
        list_calls: RefCell<usize>,
        created_notebooks: RefCell<Vec<String>>,
    }

    impl NoteSession for RecordingSession {
        fn account(&self) -> NoteResult<AccountInfo> {
            Ok(AccountInfo {
                id: 1,
                username: "alice".to_string(),
                email: None,
                name: None,
            })
        }

        fn list_notebooks(&self) -> NoteResult<Vec<NotebookRef>> {
            *self.list_calls.borrow_mut() += 1;
            Ok(self.notebooks.borrow().clone())
        }

        fn create_notebook(&self, name: &str) -> NoteResult<NotebookRef> {
            self.created_notebooks.borrow_mut().push(name.to_string());
            let notebook = NotebookRef {
                name: name.to_string(),
                guid: format!("nb-{}", self.created_notebooks.borrow().len()),
                is_default: false,
            };
            self.notebooks.borrow_mut().push(notebook.clone());
            Ok(notebook)
        }

        fn create_note(&self, _note: &NewNote<'_>) -> NoteResult<String> {
            Ok("note-1".to_string())
        }
    }

    #[test]
    fn test_notebook_list_is_cached() {
        let mut client = NoteClient::new(RecordingSession::default());
        client.list_notebooks().unwrap();
        client.list_notebooks().unwrap();
        assert_eq!(*client.session().list_calls.borrow(), 1);
    }

    #[test]
    fn test_resolve_is_case_sensitive() {
        let session = RecordingSession::default();
        session.notebooks.borrow_mut().push(NotebookRef {
            name: "Chats".to_string(),
            guid: "existing".to_string(),
            is_default: false,
        });
        let mut client = NoteClient::new(session);

        assert_eq!(client.resolve_notebook("Chats").unwrap().guid, "existing");
        let created = client.resolve_notebook("chats").unwrap();
        assert_eq!(created.guid, "nb-1");
        assert_eq!(*client.session().created_notebooks.borrow(), vec!["chats"]);
    }

    #[test]
    fn test_resolve_rejects_blank_name() {
        let mut client = NoteClient::new(RecordingSession::default());
        let err = client.resolve_notebook("  ").unwrap_err();
        assert!(matches!(err, NoteError::Input(_)));
        assert_eq!(*client.session().list_calls.borrow(), 0);
    }
}
