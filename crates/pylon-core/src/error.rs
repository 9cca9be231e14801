//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Storage error: {0}")]
    Storage(#[from] pylon_storage::StorageError),

    #[error("Session error: {0}")]
    Session(#[from] pylon_session::SessionError),

    #[error("Backend client error: {0}")]
    Client(#[from] pylon_session::ApiError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}
