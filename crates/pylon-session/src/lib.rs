//! Pylon Session Management
//!
//! Holds the signed-in operator's session for the admin console:
//! - access and refresh tokens, persisted with their own expiry
//! - user profile, permission codes and menus, mirrored to durable storage
//! - open UI tabs ("tags"), kept in memory only
//!
//! The store is an explicit context object. Consumers receive a handle,
//! there is no process-wide instance.

mod api;
mod error;
mod menu;
mod observer;
mod state;
mod store;
mod types;

pub use api::{ApiError, AuthApi, ProfileApi};
pub use error::SessionError;
pub use menu::{build_menu_tree, MenuNode};
pub use observer::{PersistObserver, PersistedSnapshot, StateObserver, DEFAULT_PERSIST_KEY};
pub use state::{SessionPhase, SessionState};
pub use store::{SessionStore, REFRESH_TOKEN_KEY, TOKEN_KEY};
pub use types::{Credentials, MenuItem, MenuType, PermMenu, RouteTag, TokenGrant, UserProfile};

pub type Result<T> = std::result::Result<T, SessionError>;
