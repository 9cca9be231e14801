//! Session Store
//!
//! Owns the session state and is the only place it changes. Every
//! mutation is a whole-field replacement applied under the write lock.
//! Observers then see a copy of the committed state with the lock
//! released; commits are serialized so they arrive in order. Async
//! operations only suspend on backend calls, before any state is touched.

use futures_util::future::try_join;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

use pylon_storage::DurableKv;

use crate::api::{AuthApi, ProfileApi};
use crate::error::SessionError;
use crate::menu::{build_menu_tree, MenuNode};
use crate::observer::{PersistObserver, PersistedSnapshot, StateObserver};
use crate::state::{SessionPhase, SessionState};
use crate::types::{Credentials, MenuItem, PermMenu, RouteTag, TokenGrant, UserProfile};
use crate::Result;

/// Storage key of the access token.
pub const TOKEN_KEY: &str = "token";
/// Storage key of the refresh token.
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";

pub struct SessionStore {
    state: Arc<RwLock<SessionState>>,
    /// Held from mutation until the last observer returns
    commit_order: Arc<Mutex<()>>,
    observers: Arc<RwLock<Vec<Arc<dyn StateObserver>>>>,
    /// Durable storage for the token entries
    kv: Arc<dyn DurableKv>,
    auth: Arc<dyn AuthApi>,
    profile: Arc<dyn ProfileApi>,
}

impl SessionStore {
    /// Creates an empty store with no observers.
    pub fn new(
        kv: Arc<dyn DurableKv>,
        auth: Arc<dyn AuthApi>,
        profile: Arc<dyn ProfileApi>,
    ) -> Self {
        Self {
            state: Arc::new(RwLock::new(SessionState::default())),
            commit_order: Arc::new(Mutex::new(())),
            observers: Arc::new(RwLock::new(Vec::new())),
            kv,
            auth,
            profile,
        }
    }

    /// Seeds a store from durable storage and keeps `info`, `perms` and
    /// `menus` mirrored under `persist_key` from then on.
    pub fn restore(
        kv: Arc<dyn DurableKv>,
        auth: Arc<dyn AuthApi>,
        profile: Arc<dyn ProfileApi>,
        persist_key: &str,
    ) -> Result<Self> {
        let mut state = SessionState {
            token: read_token(kv.as_ref(), TOKEN_KEY)?,
            refresh_token: read_token(kv.as_ref(), REFRESH_TOKEN_KEY)?,
            ..SessionState::default()
        };
        if let Some(snapshot) = PersistedSnapshot::load(kv.as_ref(), persist_key)? {
            snapshot.apply_to(&mut state);
        }

        tracing::info!(
            phase = %state.phase(),
            perms = state.perms.len(),
            menus = state.menus.len(),
            "Restored session"
        );

        let store = Self::new(Arc::clone(&kv), auth, profile);
        *store.state.write() = state;
        store.subscribe(Arc::new(PersistObserver::with_key(kv, persist_key)));

        Ok(store)
    }

    /// Registers an observer called after every committed transition.
    /// Observers may read the store but must not mutate it from
    /// `on_commit`.
    pub fn subscribe(&self, observer: Arc<dyn StateObserver>) {
        self.observers.write().push(observer);
    }

    // === Operations ===

    /// Signs in and stores both tokens. The grant is returned unchanged.
    pub async fn login(&self, credentials: &Credentials) -> Result<TokenGrant> {
        let grant = self
            .auth
            .login(credentials)
            .await
            .map_err(SessionError::Auth)?;

        self.set_token(&grant, true)?;

        tracing::info!(username = %credentials.username, "Logged in");

        Ok(grant)
    }

    /// Loads the profile and the permission/menu set concurrently and
    /// commits them together. Nothing changes unless both reads succeed
    /// and the access token is still the one the reads were issued with.
    pub async fn fetch_user_info(&self) -> Result<(UserProfile, PermMenu)> {
        let token = self.token();

        let (person, perm_menu) =
            try_join(self.profile.person(&token), self.profile.perm_menu(&token))
                .await
                .map_err(SessionError::Fetch)?;

        let info = person.clone();
        let PermMenu { perms, menus } = perm_menu.clone();
        self.try_commit(move |state| {
            if state.token != token {
                return Err(SessionError::Superseded);
            }
            state.info = Some(info);
            state.perms = perms;
            state.menus = menus;
            Ok(())
        })?;

        tracing::info!(
            user_id = person.id,
            perms = perm_menu.perms.len(),
            menus = perm_menu.menus.len(),
            "Loaded user info"
        );

        Ok((person, perm_menu))
    }

    /// Stores the access token with its expiry. When `change_refresh` is
    /// set the refresh token is replaced as well, otherwise the held
    /// refresh token and its stored entry stay as they are.
    pub fn set_token(&self, grant: &TokenGrant, change_refresh: bool) -> Result<()> {
        write_token(self.kv.as_ref(), TOKEN_KEY, &grant.token, grant.expire)?;
        if change_refresh {
            write_token(
                self.kv.as_ref(),
                REFRESH_TOKEN_KEY,
                &grant.refresh_token,
                grant.refresh_expire,
            )?;
        }

        let token = grant.token.clone();
        let refresh_token = change_refresh.then(|| grant.refresh_token.clone());
        self.commit(move |state| {
            state.token = token;
            if let Some(refresh_token) = refresh_token {
                state.refresh_token = refresh_token;
            }
        })?;

        tracing::debug!(
            expire = grant.expire,
            refresh_changed = change_refresh,
            "Token updated"
        );

        Ok(())
    }

    /// Replaces both tokens.
    pub fn set_token_pair(&self, grant: &TokenGrant) -> Result<()> {
        self.set_token(grant, true)
    }

    /// Replaces only the access token, as after a token refresh.
    pub fn set_access_token(&self, token: impl Into<String>, expire: u64) -> Result<()> {
        let grant = TokenGrant {
            token: token.into(),
            refresh_token: String::new(),
            expire,
            refresh_expire: 0,
        };
        self.set_token(&grant, false)
    }

    /// Clears the whole session and drops the stored tokens. Local only.
    pub fn logout(&self) -> Result<()> {
        let committed = self.commit(SessionState::clear);

        self.kv.remove(TOKEN_KEY)?;
        self.kv.remove(REFRESH_TOKEN_KEY)?;

        tracing::info!("Logged out");

        committed
    }

    /// Replaces the open tabs wholesale.
    pub fn set_tags(&self, tags: Vec<RouteTag>) -> Result<()> {
        self.commit(move |state| state.tags = tags)
    }

    // === Reads ===

    pub fn snapshot(&self) -> SessionState {
        self.state.read().clone()
    }

    pub fn token(&self) -> String {
        self.state.read().token.clone()
    }

    pub fn refresh_token(&self) -> String {
        self.state.read().refresh_token.clone()
    }

    pub fn info(&self) -> Option<UserProfile> {
        self.state.read().info.clone()
    }

    pub fn perms(&self) -> Vec<String> {
        self.state.read().perms.clone()
    }

    pub fn menus(&self) -> Vec<MenuItem> {
        self.state.read().menus.clone()
    }

    pub fn tags(&self) -> Vec<RouteTag> {
        self.state.read().tags.clone()
    }

    pub fn phase(&self) -> SessionPhase {
        self.state.read().phase()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.read().has_token()
    }

    pub fn has_perm(&self, code: &str) -> bool {
        self.state.read().has_perm(code)
    }

    /// Navigation tree of the granted menus.
    pub fn menu_tree(&self) -> Vec<MenuNode> {
        build_menu_tree(&self.state.read().menus)
    }

    fn commit<F>(&self, mutate: F) -> Result<()>
    where
        F: FnOnce(&mut SessionState),
    {
        self.try_commit(move |state| {
            mutate(state);
            Ok(())
        })
    }

    /// Applies `mutate` and runs every observer on the result. A mutation
    /// that fails must leave the state untouched; no observer runs then.
    /// All observers run even if one fails; the first failure is returned.
    fn try_commit<F>(&self, mutate: F) -> Result<()>
    where
        F: FnOnce(&mut SessionState) -> Result<()>,
    {
        let _order = self.commit_order.lock();

        let committed = {
            let mut state = self.state.write();
            mutate(&mut state)?;
            state.clone()
        };
        let observers = self.observers.read().clone();

        let mut first_error = None;
        for observer in &observers {
            if let Err(e) = observer.on_commit(&committed) {
                tracing::error!(error = %e, "Session observer failed");
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl Clone for SessionStore {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            commit_order: Arc::clone(&self.commit_order),
            observers: Arc::clone(&self.observers),
            kv: Arc::clone(&self.kv),
            auth: Arc::clone(&self.auth),
            profile: Arc::clone(&self.profile),
        }
    }
}

/// Tokens are stored JSON-encoded; a missing, expired or unreadable entry
/// reads as the empty token.
fn read_token(kv: &dyn DurableKv, key: &str) -> Result<String> {
    let Some(raw) = kv.get(key)? else {
        return Ok(String::new());
    };

    match serde_json::from_str::<String>(&raw) {
        Ok(token) => Ok(token),
        Err(e) => {
            tracing::warn!(key = %key, error = %e, "Ignoring unreadable token entry");
            Ok(String::new())
        }
    }
}

fn write_token(kv: &dyn DurableKv, key: &str, token: &str, ttl_secs: u64) -> Result<()> {
    let raw = serde_json::to_string(token)?;
    kv.set(key, &raw, Some(ttl_secs))?;
    Ok(())
}
