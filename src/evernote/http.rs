//! EvernoteSession - EDAM calls posted as Thrift payloads over HTTPS.

use super::edam::{EdamCall, Note, Notebook};
use super::{AccountInfo, NewNote, NoteSession, NotebookRef, ServiceEndpoint};
use crate::error::{NoteError, NoteResult};
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use std::cell::Cell;
use tracing::{debug, info};

const THRIFT_CONTENT_TYPE: &str = "application/x-thrift";
const USER_AGENT: &str = concat!("chat-evernote/", env!("CARGO_PKG_VERSION"));

/// Session bound to one developer token and the user's note store shard
pub struct EvernoteSession {
    http: Client,
    token: String,
    user_store_url: String,
    note_store_url: String,
    seq_id: Cell<i32>,
}

impl EvernoteSession {
    /// Authenticates `token` by asking the UserStore for the note store URL
    pub fn authenticate(token: &str, endpoint: &ServiceEndpoint) -> NoteResult<Self> {
        let token = token.trim();
        if token.is_empty() {
            return Err(NoteError::Auth("developer token is empty".to_string()));
        }

        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(endpoint.timeout)
            .build()?;

        let mut session = Self {
            http,
            token: token.to_string(),
            user_store_url: endpoint.user_store_url(),
            note_store_url: String::new(),
            seq_id: Cell::new(0),
        };

        debug!(url = %session.user_store_url, "Resolving note store URL");
        let call = EdamCall::get_note_store_url(&session.token, session.next_seq_id())?;
        let note_store_url = session.invoke(&session.user_store_url, &call)?;
        info!(host = %endpoint.host, "Authenticated with Evernote");

        session.note_store_url = note_store_url;
        Ok(session)
    }

    pub fn note_store_url(&self) -> &str {
        &self.note_store_url
    }

    fn next_seq_id(&self) -> i32 {
        let next = self.seq_id.get().wrapping_add(1);
        self.seq_id.set(next);
        next
    }

    fn invoke<T>(&self, url: &str, call: &EdamCall<T>) -> NoteResult<T> {
        debug!(method = call.method(), url, "Calling Evernote");

        let response = self
            .http
            .post(url)
            .header(CONTENT_TYPE, THRIFT_CONTENT_TYPE)
            .header(ACCEPT, THRIFT_CONTENT_TYPE)
            .body(call.body().to_vec())
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let message = format!("{} returned HTTP {}", call.method(), status);
            return Err(match status.as_u16() {
                401 | 403 => NoteError::Auth(message),
                _ => NoteError::Transport(message),
            });
        }

        let bytes = response.bytes()?;
        call.decode_reply(&bytes)
    }
}

impl NoteSession for EvernoteSession {
    fn account(&self) -> NoteResult<AccountInfo> {
        let call = EdamCall::get_user(&self.token, self.next_seq_id())?;
        let user = self.invoke(&self.user_store_url, &call)?;
        Ok(AccountInfo {
            id: user.id.unwrap_or_default(),
            username: user.username.unwrap_or_default(),
            email: user.email,
            name: user.name,
        })
    }

    fn list_notebooks(&self) -> NoteResult<Vec<NotebookRef>> {
        let call = EdamCall::list_notebooks(&self.token, self.next_seq_id())?;
        let notebooks = self.invoke(&self.note_store_url, &call)?;
        notebooks
            .into_iter()
            .map(|notebook| notebook_ref(notebook, None))
            .collect()
    }

    fn create_notebook(&self, name: &str) -> NoteResult<NotebookRef> {
        let notebook = Notebook {
            name: Some(name.to_string()),
            ..Notebook::default()
        };
        let call = EdamCall::create_notebook(&self.token, &notebook, self.next_seq_id())?;
        let created = self.invoke(&self.note_store_url, &call)?;
        notebook_ref(created, Some(name))
    }

    fn create_note(&self, note: &NewNote<'_>) -> NoteResult<String> {
        let note = Note {
            title: Some(note.title.to_string()),
            content: Some(note.content.as_str().to_string()),
            notebook_guid: note.notebook_guid.map(str::to_string),
            tag_names: (!note.tags.is_empty()).then(|| note.tags.to_vec()),
            ..Note::default()
        };
        let call = EdamCall::create_note(&self.token, &note, self.next_seq_id())?;
        let created = self.invoke(&self.note_store_url, &call)?;
        created
            .guid
            .ok_or_else(|| NoteError::Remote("createNote returned a note without a guid".to_string()))
    }
}

/// A notebook from the service must carry a guid; the name may be defaulted
fn notebook_ref(notebook: Notebook, fallback_name: Option<&str>) -> NoteResult<NotebookRef> {
    let guid = notebook
        .guid
        .ok_or_else(|| NoteError::Remote("notebook without a guid in reply".to_string()))?;
    let name = notebook
        .name
        .or_else(|| fallback_name.map(str::to_string))
        .unwrap_or_default();
    Ok(NotebookRef {
        name,
        guid,
        is_default: notebook.default_notebook.unwrap_or(false),
    })
}
