//! Notes — typed model of the session-authorized notes REST API.
//!
//! `GET /notes`, `POST /notes`, `PUT /notes/:id`, `DELETE /notes/:id`.
//! Every route answers 401 `{ "error": "Unauthorized" }` without a valid
//! session, and other failures carry an `{ "error": ... }` body.
//!
//! [`NoteList`] is the local copy a UI renders. Edits are applied to it
//! before the server confirms them and rolled back if the request fails.
//! The HTTP client lives behind the `notes` feature.

#[cfg(feature = "notes")]
pub mod client;
#[cfg(feature = "notes")]
pub use client::NotesClient;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A stored note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

/// Request body for creating or replacing a note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteBody {
    pub title: String,
    pub content: String,
}

impl NoteBody {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        NoteBody {
            title: title.into(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum NotesError {
    #[error("Not signed in")]
    Unauthorized,
    #[error("Notes API returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("Invalid session cookie")]
    InvalidSession,
    #[cfg(feature = "notes")]
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Malformed response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Map a failed response to an error, reading the `{ "error": ... }` body
/// when there is one. The error value may be a string or any JSON value.
pub fn error_from_response(status: u16, body: &str) -> NotesError {
    if status == 401 {
        return NotesError::Unauthorized;
    }
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("error").cloned())
        .map(|e| match e {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        })
        .unwrap_or_else(|| body.trim().to_string());
    NotesError::Api { status, message }
}

/// URL builder for the notes routes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotesEndpoint {
    base: String,
}

impl NotesEndpoint {
    /// `base` is the API root (e.g. `https://example.com/api`); a trailing
    /// slash is ignored. An empty base yields relative URLs.
    pub fn new(base: impl Into<String>) -> Self {
        let mut base = base.into();
        while base.ends_with('/') {
            base.pop();
        }
        NotesEndpoint { base }
    }

    pub fn collection(&self) -> String {
        format!("{}/notes", self.base)
    }

    pub fn item(&self, id: &str) -> String {
        format!("{}/notes/{}", self.base, id)
    }
}

/// Copy of the list taken before an optimistic edit.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "keep the snapshot to roll back if the request fails"]
pub struct Snapshot {
    previous: Vec<Note>,
}

/// Local note list with optimistic edits.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NoteList {
    notes: Vec<Note>,
}

impl NoteList {
    pub fn new(notes: Vec<Note>) -> Self {
        NoteList { notes }
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn get(&self, id: &str) -> Option<&Note> {
        self.notes.iter().find(|n| n.id == id)
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Replace the list with the server's copy.
    pub fn replace(&mut self, notes: Vec<Note>) {
        self.notes = notes;
    }

    /// Apply an edit locally ahead of the server.
    pub fn update(&mut self, id: &str, body: &NoteBody) -> Snapshot {
        let snapshot = self.snapshot();
        if let Some(note) = self.notes.iter_mut().find(|n| n.id == id) {
            note.title = body.title.clone();
            note.content = body.content.clone();
        }
        snapshot
    }

    /// Remove a note locally ahead of the server.
    pub fn remove(&mut self, id: &str) -> Snapshot {
        let snapshot = self.snapshot();
        self.notes.retain(|n| n.id != id);
        snapshot
    }

    pub fn rollback(&mut self, snapshot: Snapshot) {
        self.notes = snapshot.previous;
    }

    /// Finish an optimistic edit: keep it on success, restore the snapshot
    /// on failure. The result is passed through.
    pub fn settle<T>(
        &mut self,
        snapshot: Snapshot,
        result: Result<T, NotesError>,
    ) -> Result<T, NotesError> {
        if result.is_err() {
            self.rollback(snapshot);
        }
        result
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            previous: self.notes.clone(),
        }
    }
}
