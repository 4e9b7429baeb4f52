//! HTTP client for the notes API.

use reqwest::header::{COOKIE, HeaderMap, HeaderValue};
use reqwest::{Client, Response};

use super::{Note, NoteBody, NotesEndpoint, NotesError, error_from_response};

/// Async client bound to one API root and (optionally) one session.
#[derive(Debug, Clone)]
pub struct NotesClient {
    http: Client,
    endpoint: NotesEndpoint,
}

impl NotesClient {
    /// Client without explicit credentials (a browser host sends its own
    /// session cookie).
    pub fn new(base_url: impl Into<String>) -> Result<Self, NotesError> {
        Ok(NotesClient {
            http: Client::builder().build()?,
            endpoint: NotesEndpoint::new(base_url),
        })
    }

    /// Client that sends `cookie` (e.g. `next-auth.session-token=...`) with
    /// every request.
    pub fn with_session(base_url: impl Into<String>, cookie: &str) -> Result<Self, NotesError> {
        let mut headers = HeaderMap::new();
        let value = HeaderValue::from_str(cookie).map_err(|_| NotesError::InvalidSession)?;
        headers.insert(COOKIE, value);
        Ok(NotesClient {
            http: Client::builder().default_headers(headers).build()?,
            endpoint: NotesEndpoint::new(base_url),
        })
    }

    /// `GET /notes` — the signed-in user's notes.
    pub async fn list(&self) -> Result<Vec<Note>, NotesError> {
        let response = self.http.get(self.endpoint.collection()).send().await?;
        decode(check(response).await?).await
    }

    /// `POST /notes`.
    pub async fn create(&self, body: &NoteBody) -> Result<(), NotesError> {
        let response = self
            .http
            .post(self.endpoint.collection())
            .json(body)
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    /// `PUT /notes/:id`. Returns the updated note if the server sent it back.
    pub async fn update(&self, id: &str, body: &NoteBody) -> Result<Option<Note>, NotesError> {
        let response = self
            .http
            .put(self.endpoint.item(id))
            .json(body)
            .send()
            .await?;
        let updated: Vec<Note> = decode(check(response).await?).await?;
        Ok(updated.into_iter().next())
    }

    /// `DELETE /notes/:id`.
    pub async fn delete(&self, id: &str) -> Result<(), NotesError> {
        let response = self.http.delete(self.endpoint.item(id)).send().await?;
        check(response).await?;
        Ok(())
    }
}

async fn check(response: Response) -> Result<Response, NotesError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    tracing::debug!("notes: {status} {body}");
    Err(error_from_response(status.as_u16(), &body))
}

async fn decode<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, NotesError> {
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}
