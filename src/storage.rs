use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs,
    io::{self, Write},
    path::PathBuf,
    sync::Arc,
};
use thiserror::Error;

/// Storage key holding the opaque bearer token.
pub const TOKEN_KEY: &str = "token";
/// Storage key holding the serialized `Identity`.
pub const USER_KEY: &str = "user";

/// StorageError
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("session storage I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("session storage document is malformed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An identity write was attempted while no bearer token is held. Persisting the
    /// user alone would leave a session that `initialize` refuses to restore.
    #[error("no session token is held")]
    MissingToken,

    /// Only produced by `MemoryStore::new_failing`.
    #[error("simulated storage failure")]
    Simulated,
}

// 1. KeyValueStore Contract
/// KeyValueStore
///
/// The durable client-side store behind the Session Store. Calls are synchronous:
/// a write has reached the backing medium when the call returns.
///
/// Batch operations are atomic. Either every entry of a `put_many`/`remove_many` is
/// applied or none is, which is what lets the session keep `token` and `user` as two
/// keys without ever exposing one without the other.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn put_many(&self, entries: &[(&str, String)]) -> Result<(), StorageError>;

    fn remove_many(&self, keys: &[&str]) -> Result<(), StorageError>;
}

/// StorageState
///
/// The concrete type used to share the durable store with the Session Store.
pub type StorageState = Arc<dyn KeyValueStore>;

// 2. The Real Implementation (JSON document on disk)
/// StoreDocument
///
/// On-disk layout of the session file.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreDocument {
    entries: BTreeMap<String, String>,
    updated_at: Option<DateTime<Utc>>,
}

/// FileStore
///
/// Keeps every key in a single JSON document. Each batch rewrites the whole document
/// to a sibling temp file and renames it over the original, so a crash mid-write
/// leaves either the old or the new document, never a mix.
pub struct FileStore {
    path: PathBuf,
    // Serialises read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    fn read_document(&self) -> Result<StoreDocument, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(StoreDocument::default()),
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(StoreDocument::default()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_document(&self, mut document: StoreDocument) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        document.updated_at = Some(Utc::now());

        let tmp = self.path.with_extension("json.tmp");
        let written = write_private(&tmp, &serde_json::to_vec_pretty(&document)?)
            .and_then(|_| fs::rename(&tmp, &self.path));
        if let Err(e) = written {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }
}

/// Writes `bytes` to `path`, readable by the owner only. The document holds the
/// bearer token.
fn write_private(path: &std::path::Path, bytes: &[u8]) -> io::Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    // A leftover temp file keeps its old mode through `open`.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o600))?;
    }
    file.write_all(bytes)?;
    file.sync_all()
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let _guard = self.lock.lock();
        Ok(self.read_document()?.entries.get(key).cloned())
    }

    fn put_many(&self, entries: &[(&str, String)]) -> Result<(), StorageError> {
        let _guard = self.lock.lock();
        let mut document = self.read_document()?;
        for (key, value) in entries {
            document.entries.insert((*key).to_string(), value.clone());
        }
        self.write_document(document)
    }

    fn remove_many(&self, keys: &[&str]) -> Result<(), StorageError> {
        let _guard = self.lock.lock();
        let mut document = self.read_document()?;
        let before = document.entries.len();
        for key in keys {
            document.entries.remove(*key);
        }
        if document.entries.len() == before && !self.path.exists() {
            return Ok(());
        }
        self.write_document(document)
    }
}

// 3. The Mock Implementation (For Unit Tests)
/// MemoryStore
///
/// An in-process implementation of `KeyValueStore` used by tests and by callers that
/// do not want a session to outlive the process.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
    /// When true, every write returns `StorageError::Simulated` and leaves the
    /// entries untouched. Reads keep working.
    pub should_fail: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    /// Pre-populates the store, bypassing `should_fail`.
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let store = Self::new();
        store.entries.lock().extend(
            entries
                .into_iter()
                .map(|(key, value)| (key.into(), value.into())),
        );
        store
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.lock().contains_key(key)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn put_many(&self, entries: &[(&str, String)]) -> Result<(), StorageError> {
        if self.should_fail {
            return Err(StorageError::Simulated);
        }
        let mut map = self.entries.lock();
        for (key, value) in entries {
            map.insert((*key).to_string(), value.clone());
        }
        Ok(())
    }

    fn remove_many(&self, keys: &[&str]) -> Result<(), StorageError> {
        if self.should_fail {
            return Err(StorageError::Simulated);
        }
        let mut map = self.entries.lock();
        for key in keys {
            map.remove(*key);
        }
        Ok(())
    }
}
