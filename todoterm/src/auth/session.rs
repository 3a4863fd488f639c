//! Process-wide session flags and opaque token persistence.

use std::collections::HashMap;
use std::path::PathBuf;

use parking_lot::RwLock;

/// Key under which the auth token is persisted.
pub const AUTH_TOKEN: &str = "auth-token";

/// Process-wide session flags.
///
/// Explicit shared state with documented writers: only the login flow
/// writes these flags (via the crate-private setters); everything else
/// reads.
#[derive(Debug, Default)]
pub struct SessionState {
    flags: RwLock<SessionFlags>,
}

#[derive(Debug, Default, Clone, Copy)]
struct SessionFlags {
    logged_in: bool,
    captcha_required: bool,
}

impl SessionState {
    /// Creates a fresh session (logged out, no captcha demanded).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a login has succeeded in this process.
    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.flags.read().logged_in
    }

    /// Whether the server has demanded a captcha for the next login.
    #[must_use]
    pub fn captcha_required(&self) -> bool {
        self.flags.read().captcha_required
    }

    pub(crate) fn set_logged_in(&self, logged_in: bool) {
        self.flags.write().logged_in = logged_in;
    }

    pub(crate) fn set_captcha_required(&self, captcha_required: bool) {
        self.flags.write().captcha_required = captcha_required;
    }
}

/// Errors that can occur while accessing a token store.
#[derive(Debug, thiserror::Error)]
pub enum TokenStoreError {
    /// The backing file could not be read or written.
    #[error("failed to access token store at {path}: {source}")]
    Io {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Opaque key-value persistence for auth tokens.
///
/// The store never interprets values; callers decide what a key means
/// (see [`AUTH_TOKEN`]).
pub trait TokenStore: Send + Sync {
    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`TokenStoreError`] when the backing storage fails.
    fn put(&self, key: &str, value: &str) -> Result<(), TokenStoreError>;

    /// Returns the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`TokenStoreError`] when the backing storage fails.
    fn get(&self, key: &str) -> Result<Option<String>, TokenStoreError>;

    /// Removes the value stored under `key`; absent keys are a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`TokenStoreError`] when the backing storage fails.
    fn remove(&self, key: &str) -> Result<(), TokenStoreError>;
}

impl<S: TokenStore + ?Sized> TokenStore for std::sync::Arc<S> {
    fn put(&self, key: &str, value: &str) -> Result<(), TokenStoreError> {
        (**self).put(key, value)
    }

    fn get(&self, key: &str) -> Result<Option<String>, TokenStoreError> {
        (**self).get(key)
    }

    fn remove(&self, key: &str) -> Result<(), TokenStoreError> {
        (**self).remove(key)
    }
}

/// Token store backed by one file per key under a directory.
#[derive(Debug)]
pub struct FileTokenStore {
    dir: PathBuf,
}

impl FileTokenStore {
    /// Creates a store rooted at `dir`; the directory is created lazily on
    /// the first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }
}

impl TokenStore for FileTokenStore {
    fn put(&self, key: &str, value: &str) -> Result<(), TokenStoreError> {
        std::fs::create_dir_all(&self.dir).map_err(|source| TokenStoreError::Io {
            path: self.dir.clone(),
            source,
        })?;
        let path = self.path_for(key);
        std::fs::write(&path, value).map_err(|source| TokenStoreError::Io { path, source })
    }

    fn get(&self, key: &str) -> Result<Option<String>, TokenStoreError> {
        let path = self.path_for(key);
        match std::fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(TokenStoreError::Io { path, source }),
        }
    }

    fn remove(&self, key: &str) -> Result<(), TokenStoreError> {
        let path = self.path_for(key);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(TokenStoreError::Io { path, source }),
        }
    }
}

/// In-memory token store for tests.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryTokenStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for MemoryTokenStore {
    fn put(&self, key: &str, value: &str) -> Result<(), TokenStoreError> {
        self.entries
            .write()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<String>, TokenStoreError> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn remove(&self, key: &str) -> Result<(), TokenStoreError> {
        self.entries.write().remove(key);
        Ok(())
    }
}
