//! Console context
//!
//! The one object the UI layer holds. It owns durable storage and the
//! session store, and hands the store out to consumers explicitly.

use std::sync::Arc;

use pylon_client::HttpApi;
use pylon_session::{AuthApi, ProfileApi, SessionStore};
use pylon_storage::Database;

use crate::config::Config;
use crate::Result;

pub struct Console {
    config: Config,
    db: Database,
    store: SessionStore,
}

impl Console {
    /// Opens storage at the configured path and talks to the configured
    /// backend over HTTP.
    pub fn new(config: Config) -> Result<Self> {
        if let Some(parent) = config.database_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = Database::open(&config.database_path)?;
        let api = Arc::new(HttpApi::new(config.api.clone())?);

        Self::with_backend(config, db, api.clone(), api)
    }

    /// Builds a console over an already opened database and arbitrary
    /// backend collaborators.
    pub fn with_backend(
        config: Config,
        db: Database,
        auth: Arc<dyn AuthApi>,
        profile: Arc<dyn ProfileApi>,
    ) -> Result<Self> {
        let purged = db.purge_expired()?;
        let store = SessionStore::restore(Arc::new(db.clone()), auth, profile, &config.persist_key)?;

        tracing::info!(
            database = %config.database_path.display(),
            purged,
            phase = %store.phase(),
            "Console initialized"
        );

        Ok(Self { config, db, store })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Handle to the session store. Clones share the same state.
    pub fn session(&self) -> &SessionStore {
        &self.store
    }
}
