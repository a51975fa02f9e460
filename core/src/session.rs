//! Admin session: the bearer token and where it is persisted.
//!
//! # Design
//! The token is the only state shared between pages. It lives behind the
//! `TokenStore` trait (get/set/clear) and is reached through a `Session`
//! handle that is injected into `ApiClient` and into whatever gates a
//! protected page. The client never expires a token on its own; a stale one
//! shows up as a 401 from the backend.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;
use tracing::info;

/// Key the token is stored under.
pub const TOKEN_KEY: &str = "adminToken";

#[derive(Debug, Error)]
pub enum SessionError {
    /// No token is stored; the caller should send the user to the login page.
    #[error("not logged in")]
    NotAuthenticated,

    #[error("session storage failed: {0}")]
    Io(#[from] io::Error),

    #[error("session file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Persistent key/value storage for the session token.
pub trait TokenStore: Send + Sync {
    fn get(&self) -> Result<Option<String>, SessionError>;
    fn set(&self, token: &str) -> Result<(), SessionError>;
    fn clear(&self) -> Result<(), SessionError>;
}

/// Process-local store, lost on exit.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self) -> Result<Option<String>, SessionError> {
        Ok(self.token.lock().unwrap_or_else(PoisonError::into_inner).clone())
    }

    fn set(&self, token: &str) -> Result<(), SessionError> {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

/// JSON file holding a string map, with the token under [`TOKEN_KEY`].
///
/// Other keys in the file are preserved. Concurrent writers from separate
/// processes are not coordinated: the last write wins.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<BTreeMap<String, String>, SessionError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, entries: &BTreeMap<String, String>) -> Result<(), SessionError> {
        fs::write(&self.path, serde_json::to_string_pretty(entries)?)?;
        Ok(())
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self) -> Result<Option<String>, SessionError> {
        Ok(self.read()?.remove(TOKEN_KEY))
    }

    fn set(&self, token: &str) -> Result<(), SessionError> {
        let mut entries = self.read()?;
        entries.insert(TOKEN_KEY.to_string(), token.to_string());
        self.write(&entries)
    }

    fn clear(&self) -> Result<(), SessionError> {
        let mut entries = self.read()?;
        if entries.remove(TOKEN_KEY).is_some() {
            self.write(&entries)?;
        }
        Ok(())
    }
}

/// Cloneable handle over a shared `TokenStore`.
#[derive(Clone)]
pub struct Session {
    store: Arc<dyn TokenStore>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session").finish_non_exhaustive()
    }
}

impl Session {
    pub fn new(store: impl TokenStore + 'static) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(MemoryTokenStore::new())
    }

    pub fn token(&self) -> Result<Option<String>, SessionError> {
        self.store.get()
    }

    /// The access gate for protected pages.
    pub fn require_token(&self) -> Result<String, SessionError> {
        self.token()?.ok_or(SessionError::NotAuthenticated)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.token(), Ok(Some(_)))
    }

    pub fn store_token(&self, token: &str) -> Result<(), SessionError> {
        self.store.set(token)?;
        info!("session token stored");
        Ok(())
    }

    pub fn logout(&self) -> Result<(), SessionError> {
        self.store.clear()?;
        info!("session cleared");
        Ok(())
    }
}
