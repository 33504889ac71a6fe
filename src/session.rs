//! Session Store: the single source of truth for who is logged in.

use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::{
    models::Identity,
    storage::{StorageError, StorageState, TOKEN_KEY, USER_KEY},
};

/// Session
///
/// A point-in-time snapshot of the store. Consumers read snapshots; they never hold
/// the store's lock across their own work.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Session {
    pub identity: Option<Identity>,
    /// True until the durable store has been consulted once.
    pub is_resolving: bool,
    /// True while the Auth Gateway has a credential exchange in flight.
    pub is_pending: bool,
    pub last_error: Option<String>,
}

impl Session {
    /// Login controls are disabled while this is true.
    pub fn is_busy(&self) -> bool {
        self.is_resolving || self.is_pending
    }
}

#[derive(Debug)]
struct Inner {
    identity: Option<Identity>,
    token: Option<String>,
    initialized: bool,
    pending: bool,
    last_error: Option<String>,
}

/// SessionStore
///
/// Owns the current `Identity` and bearer token, mirrored to the injected
/// `KeyValueStore`. Only the Auth Gateway mutates it; every other component reads
/// snapshots through `snapshot()`/`get()`.
pub struct SessionStore {
    storage: StorageState,
    inner: RwLock<Inner>,
}

/// SessionState
///
/// The shared handle to the process-wide Session Store.
pub type SessionState = Arc<SessionStore>;

impl SessionStore {
    pub fn new(storage: StorageState) -> Self {
        Self {
            storage,
            inner: RwLock::new(Inner {
                identity: None,
                token: None,
                initialized: false,
                pending: false,
                last_error: None,
            }),
        }
    }

    /// initialize
    ///
    /// Reads a previously persisted session. Only the first call touches storage;
    /// later calls return the in-memory identity.
    ///
    /// A `user` document without a `token` (or vice versa) is not authoritative and is
    /// treated as absent, as is a `user` document that does not parse. Storage read
    /// failures are logged and also resolve to "no session": a broken store must not
    /// leave the dashboard stuck on its loading screen.
    pub fn initialize(&self) -> Option<Identity> {
        let mut inner = self.inner.write();
        if inner.initialized {
            return inner.identity.clone();
        }

        match self.read_persisted() {
            Ok(Some((identity, token))) => {
                debug!(email = %identity.email, role = %identity.role, "restored persisted session");
                inner.identity = Some(identity);
                inner.token = Some(token);
            }
            Ok(None) => debug!("no persisted session"),
            Err(e) => error!("failed to read persisted session: {}", e),
        }

        inner.initialized = true;
        inner.identity.clone()
    }

    fn read_persisted(&self) -> Result<Option<(Identity, String)>, StorageError> {
        let user = self.storage.get(USER_KEY)?;
        let token = self.storage.get(TOKEN_KEY)?;

        match (user, token) {
            (Some(user), Some(token)) => match serde_json::from_str::<Identity>(&user) {
                Ok(identity) => Ok(Some((identity, token))),
                Err(e) => {
                    warn!("ignoring unreadable persisted user: {}", e);
                    Ok(None)
                }
            },
            (Some(_), None) => {
                warn!("ignoring persisted user without a token");
                Ok(None)
            }
            (None, Some(_)) => {
                warn!("ignoring persisted token without a user");
                Ok(None)
            }
            (None, None) => Ok(None),
        }
    }

    /// Current identity, or `None`. Never blocks on I/O.
    pub fn get(&self) -> Option<Identity> {
        self.inner.read().identity.clone()
    }

    pub fn snapshot(&self) -> Session {
        let inner = self.inner.read();
        Session {
            identity: inner.identity.clone(),
            is_resolving: !inner.initialized,
            is_pending: inner.pending,
            last_error: inner.last_error.clone(),
        }
    }

    /// set
    ///
    /// Replaces the identity in memory and in durable storage. The identity is
    /// persisted together with the held token in one batch; with no token held the
    /// call fails with `StorageError::MissingToken` and nothing is written. On any
    /// failure the in-memory identity is left unchanged.
    pub fn set(&self, identity: Identity) -> Result<(), StorageError> {
        let serialized = serde_json::to_string(&identity)?;
        let mut inner = self.inner.write();
        let token = inner.token.clone().ok_or(StorageError::MissingToken)?;
        self.storage
            .put_many(&[(TOKEN_KEY, token), (USER_KEY, serialized)])?;
        inner.identity = Some(identity);
        inner.initialized = true;
        Ok(())
    }

    /// establish
    ///
    /// Persists identity and token together in one atomic batch, then publishes them in
    /// memory. Used by the Auth Gateway after a successful credential exchange.
    pub fn establish(&self, identity: Identity, token: String) -> Result<(), StorageError> {
        let serialized = serde_json::to_string(&identity)?;
        let mut inner = self.inner.write();
        self.storage
            .put_many(&[(TOKEN_KEY, token.clone()), (USER_KEY, serialized)])?;
        inner.identity = Some(identity);
        inner.token = Some(token);
        inner.initialized = true;
        Ok(())
    }

    /// clear
    ///
    /// Drops identity and token from memory unconditionally, then removes both keys
    /// from durable storage in one batch. A storage failure is reported but the
    /// in-memory session is already gone.
    pub fn clear(&self) -> Result<(), StorageError> {
        let mut inner = self.inner.write();
        inner.identity = None;
        inner.token = None;
        inner.initialized = true;
        self.storage.remove_many(&[TOKEN_KEY, USER_KEY])
    }

    pub fn token(&self) -> Option<String> {
        self.inner.read().token.clone()
    }

    /// True when a bearer token is held.
    pub fn is_authenticated(&self) -> bool {
        self.inner.read().token.is_some()
    }

    pub fn last_error(&self) -> Option<String> {
        self.inner.read().last_error.clone()
    }

    pub(crate) fn set_error(&self, message: Option<String>) {
        self.inner.write().last_error = message;
    }

    /// Marks a credential exchange as in flight. Returns false if one already is.
    pub(crate) fn begin_request(&self) -> bool {
        let mut inner = self.inner.write();
        if inner.pending {
            return false;
        }
        inner.pending = true;
        true
    }

    pub(crate) fn end_request(&self) {
        self.inner.write().pending = false;
    }
}
