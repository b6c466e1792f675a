use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, MutexGuard},
};

use shared::domain::{Session, StoredUser};
use thiserror::Error;
use tracing::{debug, warn};

/// Key of the bearer token written by the login flow.
pub const TOKEN_STORAGE_KEY: &str = "jwt";

#[derive(Debug, Error)]
pub enum SessionStoreError {
    #[error("failed to access session file '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("session file '{path}' is not a JSON object of strings: {source}")]
    Malformed {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to encode session entry: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Browser-storage shaped persistence. Only the login and logout flows write.
pub trait KeyValueStore: Send + Sync {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), SessionStoreError>;
    fn remove_item(&self, key: &str) -> Result<(), SessionStoreError>;
    fn clear(&self) -> Result<(), SessionStoreError>;
}

fn lock_entries(
    entries: &Mutex<BTreeMap<String, String>>,
) -> MutexGuard<'_, BTreeMap<String, String>> {
    entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        lock_entries(&self.entries).get(key).cloned()
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), SessionStoreError> {
        lock_entries(&self.entries).insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), SessionStoreError> {
        lock_entries(&self.entries).remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionStoreError> {
        lock_entries(&self.entries).clear();
        Ok(())
    }
}

/// JSON-file backed store for the command-line front end. Every write is
/// flushed to disk before returning.
pub struct FileStorage {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStorage {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SessionStoreError> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => BTreeMap::new(),
            Ok(raw) => serde_json::from_str(&raw).map_err(|source| SessionStoreError::Malformed {
                path: path.clone(),
                source,
            })?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(SessionStoreError::Io { path, source }),
        };
        debug!(path = %path.display(), entries = entries.len(), "opened session file");
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<(), SessionStoreError> {
        let io_err = |source: std::io::Error| SessionStoreError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let raw = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, raw).map_err(io_err)
    }
}

impl KeyValueStore for FileStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        lock_entries(&self.entries).get(key).cloned()
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), SessionStoreError> {
        let mut entries = lock_entries(&self.entries);
        entries.insert(key.to_string(), value.to_string());
        self.persist(&entries)
    }

    fn remove_item(&self, key: &str) -> Result<(), SessionStoreError> {
        let mut entries = lock_entries(&self.entries);
        if entries.remove(key).is_some() {
            self.persist(&entries)?;
        }
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionStoreError> {
        let mut entries = lock_entries(&self.entries);
        entries.clear();
        self.persist(&entries)
    }
}

/// Parses the `"user"` entry. Absent or unreadable entries are `NoSession`.
pub fn read_session(store: &dyn KeyValueStore) -> Session {
    let Some(raw) = store.get_item(Session::STORAGE_KEY) else {
        return Session::NoSession;
    };
    match serde_json::from_str::<StoredUser>(&raw) {
        Ok(user) => Session::from(user),
        Err(err) => {
            warn!(error = %err, "ignoring malformed session entry");
            Session::NoSession
        }
    }
}

/// Writes the session entry. Used by the login flow, never by controllers.
pub fn sign_in(store: &dyn KeyValueStore, user: &StoredUser) -> Result<(), SessionStoreError> {
    let raw = serde_json::to_string(user)?;
    store.set_item(Session::STORAGE_KEY, &raw)
}

/// Read-only view of the session store handed to controllers.
#[derive(Clone)]
pub struct SessionReader {
    store: Arc<dyn KeyValueStore>,
}

impl SessionReader {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn current(&self) -> Session {
        read_session(self.store.as_ref())
    }

    pub fn email(&self) -> String {
        self.current().email().unwrap_or_default().to_string()
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
