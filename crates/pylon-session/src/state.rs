//! Session state and its derived phase
//!
//! ```text
//! Anonymous
//!   ↓ login
//! Authenticated
//!   ↓ fetch user info
//! Loaded
//!   ↓ logout
//! Anonymous
//! ```
//!
//! `ProfileOnly` appears only at startup, when the persisted profile has
//! outlived the token's expiry.

use serde::{Deserialize, Serialize};

use crate::types::{MenuItem, RouteTag, UserProfile};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    /// Access credential, empty when signed out
    pub token: String,
    pub refresh_token: String,
    pub info: Option<UserProfile>,
    pub perms: Vec<String>,
    pub menus: Vec<MenuItem>,
    /// Open UI tabs, never persisted
    pub tags: Vec<RouteTag>,
}

impl SessionState {
    pub fn has_token(&self) -> bool {
        !self.token.is_empty()
    }

    pub fn has_profile(&self) -> bool {
        self.info.is_some()
    }

    pub fn phase(&self) -> SessionPhase {
        match (self.has_token(), self.has_profile()) {
            (false, false) => SessionPhase::Anonymous,
            (true, false) => SessionPhase::Authenticated,
            (true, true) => SessionPhase::Loaded,
            (false, true) => SessionPhase::ProfileOnly,
        }
    }

    pub fn has_perm(&self, code: &str) -> bool {
        self.perms.iter().any(|p| p == code)
    }

    /// Resets every field to its empty value.
    pub(crate) fn clear(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Anonymous,
    /// Token present, profile not loaded yet
    Authenticated,
    Loaded,
    /// Restored profile without a live token
    ProfileOnly,
}

impl SessionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionPhase::Anonymous => "anonymous",
            SessionPhase::Authenticated => "authenticated",
            SessionPhase::Loaded => "loaded",
            SessionPhase::ProfileOnly => "profile_only",
        }
    }
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
