use std::path::PathBuf;
use std::sync::Mutex;

use crate::errors::CoreError;

/// Fixed storage key for the persisted bearer token. The browser build of
/// the original app used the same name for its localStorage entry; the
/// file-backed store uses it as the file name.
pub const TOKEN_STORAGE_KEY: &str = "access_token";

/// Durable home of the session token.
///
/// The persisted token is the sole durable record of a session; everything
/// else (profile, derived flags) is rebuilt from it at startup. Mutated
/// only by `SessionManager` through login/register/logout.
pub trait TokenStore: Send + Sync {
    /// Read the stored token, if any. A missing token is `Ok(None)`.
    fn load(&self) -> Result<Option<String>, CoreError>;

    /// Persist the token, replacing any previous one.
    fn save(&self, token: &str) -> Result<(), CoreError>;

    /// Remove the stored token. Idempotent — clearing an empty store is Ok.
    fn clear(&self) -> Result<(), CoreError>;
}

/// Token store backed by a single file under the given directory,
/// surviving process restarts the way localStorage survives reloads.
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            path: dir.into().join(TOKEN_STORAGE_KEY),
        }
    }

    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<String>, CoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => {
                let token = contents.trim();
                if token.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(token.to_string()))
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, token: &str) -> Result<(), CoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, token)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), CoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory token store for tests and sessions that should not outlive
/// the process.
#[derive(Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seed a token, as if a previous session had persisted it.
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<String>, CoreError> {
        Ok(self
            .token
            .lock()
            .map_err(|_| CoreError::Storage("token store lock poisoned".into()))?
            .clone())
    }

    fn save(&self, token: &str) -> Result<(), CoreError> {
        *self
            .token
            .lock()
            .map_err(|_| CoreError::Storage("token store lock poisoned".into()))? =
            Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), CoreError> {
        *self
            .token
            .lock()
            .map_err(|_| CoreError::Storage("token store lock poisoned".into()))? = None;
        Ok(())
    }
}
