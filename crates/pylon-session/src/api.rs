//! Backend collaborators consumed by the session store

use async_trait::async_trait;
use thiserror::Error;

use crate::types::{Credentials, PermMenu, TokenGrant, UserProfile};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Rejected by backend (code {code}): {message}")]
    Rejected { code: i64, message: String },

    #[error("Invalid response body: {0}")]
    Decode(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> Result<TokenGrant, ApiError>;
}

/// Reads scoped to the operator identified by `token`.
#[async_trait]
pub trait ProfileApi: Send + Sync {
    async fn person(&self, token: &str) -> Result<UserProfile, ApiError>;

    async fn perm_menu(&self, token: &str) -> Result<PermMenu, ApiError>;
}
