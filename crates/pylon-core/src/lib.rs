//! Pylon Core
//!
//! Wires storage, the backend client and the session store into one
//! context object for the console.

mod config;
mod console;
mod error;

pub use config::Config;
pub use console::Console;
pub use error::CoreError;

// Re-export core components
pub use pylon_client::{ApiConfig, HttpApi, ProxyRule};
pub use pylon_session::{
    ApiError, AuthApi, Credentials, MenuItem, MenuNode, MenuType, PermMenu, ProfileApi, RouteTag,
    SessionError, SessionPhase, SessionState, SessionStore, StateObserver, TokenGrant,
    UserProfile,
};
pub use pylon_storage::{Database, DurableKv, StorageError};

pub type Result<T> = std::result::Result<T, CoreError>;

/// Initialize logging
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt().with_env_filter(filter).with_target(true).init();
}
