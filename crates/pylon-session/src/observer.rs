//! Commit observers
//!
//! The store calls every observer after each committed transition with a
//! copy of the new state. The state lock is already released, so an
//! observer may read the store. Commits are serialized and observers see
//! them in order.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use pylon_storage::DurableKv;

use crate::state::SessionState;
use crate::types::{MenuItem, UserProfile};
use crate::Result;

/// Namespace key of the persisted snapshot.
pub const DEFAULT_PERSIST_KEY: &str = "persist:user";

/// Must not mutate the store it observes.
pub trait StateObserver: Send + Sync {
    fn on_commit(&self, state: &SessionState) -> Result<()>;
}

/// The whitelisted part of the state that survives restarts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedSnapshot {
    pub info: Option<UserProfile>,
    #[serde(default)]
    pub perms: Vec<String>,
    #[serde(default)]
    pub menus: Vec<MenuItem>,
}

impl PersistedSnapshot {
    pub fn from_state(state: &SessionState) -> Self {
        Self {
            info: state.info.clone(),
            perms: state.perms.clone(),
            menus: state.menus.clone(),
        }
    }

    /// Reads the snapshot stored under `key`. A snapshot that no longer
    /// decodes is logged and treated as absent.
    pub fn load(kv: &dyn DurableKv, key: &str) -> Result<Option<Self>> {
        let Some(raw) = kv.get(key)? else {
            return Ok(None);
        };

        match serde_json::from_str(&raw) {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Ignoring unreadable persisted snapshot");
                Ok(None)
            }
        }
    }

    /// Copies the snapshot into `state`, leaving tokens and tags alone.
    pub fn apply_to(self, state: &mut SessionState) {
        state.info = self.info;
        state.perms = self.perms;
        state.menus = self.menus;
    }
}

/// Mirrors `info`, `perms` and `menus` to durable storage.
pub struct PersistObserver {
    kv: Arc<dyn DurableKv>,
    key: String,
    /// Last written payload, to skip commits that only touched other fields
    last_written: Mutex<Option<String>>,
}

impl PersistObserver {
    pub fn new(kv: Arc<dyn DurableKv>) -> Self {
        Self::with_key(kv, DEFAULT_PERSIST_KEY)
    }

    pub fn with_key(kv: Arc<dyn DurableKv>, key: impl Into<String>) -> Self {
        Self {
            kv,
            key: key.into(),
            last_written: Mutex::new(None),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl StateObserver for PersistObserver {
    fn on_commit(&self, state: &SessionState) -> Result<()> {
        let payload = serde_json::to_string(&PersistedSnapshot::from_state(state))?;

        let mut last = self.last_written.lock();
        if last.as_deref() == Some(payload.as_str()) {
            return Ok(());
        }

        self.kv.set(&self.key, &payload, None)?;
        tracing::debug!(key = %self.key, "Persisted session snapshot");
        *last = Some(payload);

        Ok(())
    }
}
