//! Session error types

use thiserror::Error;

use crate::api::ApiError;

#[derive(Error, Debug)]
pub enum SessionError {
    /// Login was refused or could not reach the backend.
    #[error("Login failed: {0}")]
    Auth(#[source] ApiError),

    /// Profile or permission/menu retrieval failed.
    #[error("Failed to fetch user info: {0}")]
    Fetch(#[source] ApiError),

    /// The session was replaced or ended while user info was loading.
    #[error("Session changed while loading user info")]
    Superseded,

    #[error("Storage error: {0}")]
    Storage(#[from] pylon_storage::StorageError),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SessionError {
    /// The collaborator error behind an `Auth` or `Fetch` failure.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            SessionError::Auth(e) | SessionError::Fetch(e) => Some(e),
            _ => None,
        }
    }

    /// Whether the backend rejected the current credential.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self.api_error(), Some(ApiError::Unauthorized))
    }
}
