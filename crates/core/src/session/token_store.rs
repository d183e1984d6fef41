//! Persisted session token
//!
//! A single token string under a fixed location that survives restarts and
//! is removed on logout or when the server rejects it.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::{Error, Result};

/// Storage for the bearer token
pub trait TokenStore: Send + Sync {
    /// Read the token, `None` when nothing is stored
    fn load(&self) -> Result<Option<String>>;

    /// Replace the stored token
    fn save(&self, token: &str) -> Result<()>;

    /// Remove the stored token. Removing a missing token succeeds.
    fn clear(&self) -> Result<()>;
}

/// Token kept in a file, readable only by the owner on unix
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
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path).map_err(|e| {
            Error::TokenStore(format!("failed to read {}: {}", self.path.display(), e))
        })?;
        let token = content.trim();
        Ok((!token.is_empty()).then(|| token.to_string()))
    }

    fn save(&self, token: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                Error::TokenStore(format!("failed to create {}: {}", parent.display(), e))
            })?;
        }
        fs::write(&self.path, token).map_err(|e| {
            Error::TokenStore(format!("failed to write {}: {}", self.path.display(), e))
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Err(e) = fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600)) {
                tracing::warn!("failed to chmod 0600 {}: {}", self.path.display(), e);
            }
        }

        Ok(())
    }

    fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path).map_err(|e| {
                Error::TokenStore(format!("failed to delete {}: {}", self.path.display(), e))
            })?;
        }
        Ok(())
    }
}

/// Process-local token, for tests and throwaway sessions
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.token.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<String>> {
        Ok(self.slot().clone())
    }

    fn save(&self, token: &str) -> Result<()> {
        *self.slot() = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.slot() = None;
        Ok(())
    }
}
