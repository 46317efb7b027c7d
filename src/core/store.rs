//! # Local Store
//!
//! Client-side key/value persistence, the terminal counterpart of browser
//! local storage. Two keys matter: the backend auth token and the phone of
//! the last selected Telegram account.
//!
//! The map lives in `<data dir>/storage.json`. Every mutation rewrites the
//! file with an atomic rename (write `.tmp`, then `rename()`).

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use log::{debug, warn};

pub const AUTH_TOKEN_KEY: &str = "auth_token";
pub const SELECTED_ACCOUNT_KEY: &str = "telegram_selected_account";

const STORE_FILE: &str = "storage.json";

#[derive(Debug)]
pub enum StoreError {
    Io(io::Error),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Io(e) => write!(f, "store I/O error: {e}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// String key/value store, optionally backed by a JSON file.
#[derive(Debug, Default)]
pub struct LocalStore {
    path: Option<PathBuf>,
    values: BTreeMap<String, String>,
}

/// The store is shared between the HTTP client, the auth session and the
/// TUI runtime. Access is synchronous and short.
pub type SharedStore = Arc<Mutex<LocalStore>>;

impl LocalStore {
    /// A store that never touches disk.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open (or create) the store under `dir`.
    ///
    /// A corrupt file is logged and replaced by an empty store rather than
    /// blocking startup.
    pub fn open(dir: &Path) -> Result<Self, StoreError> {
        fs::create_dir_all(dir).map_err(StoreError::Io)?;
        let path = dir.join(STORE_FILE);
        let values = if path.exists() {
            let raw = fs::read_to_string(&path).map_err(StoreError::Io)?;
            match serde_json::from_str(&raw) {
                Ok(values) => values,
                Err(e) => {
                    warn!("Ignoring unreadable store at {}: {}", path.display(), e);
                    BTreeMap::new()
                }
            }
        } else {
            BTreeMap::new()
        };
        debug!("Opened local store at {} ({} keys)", path.display(), values.len());
        Ok(Self {
            path: Some(path),
            values,
        })
    }

    pub fn into_shared(self) -> SharedStore {
        Arc::new(Mutex::new(self))
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    pub fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
        self.flush();
    }

    pub fn remove(&mut self, key: &str) {
        if self.values.remove(key).is_some() {
            self.flush();
        }
    }

    /// Persist the map. Failures are logged; the in-memory value stays
    /// authoritative for the rest of the run.
    fn flush(&self) {
        let Some(path) = &self.path else {
            return;
        };
        if let Err(e) = atomic_write_json(path, &self.values) {
            warn!("Failed to persist local store: {}", e);
        }
    }
}

/// Lock the shared store, recovering from a poisoned mutex.
pub fn lock(store: &SharedStore) -> MutexGuard<'_, LocalStore> {
    store.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Atomically write `data` as JSON to `path` (via `.tmp` + rename).
fn atomic_write_json<T: serde::Serialize>(path: &Path, data: &T) -> io::Result<()> {
    let tmp_path = path.with_extension("tmp");
    let json = serde_json::to_string_pretty(data)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    fs::write(&tmp_path, json)?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}
