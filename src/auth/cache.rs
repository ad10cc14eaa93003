//! Two-tier cache for the exchanged bearer token.
//!
//! At most one token is cached per process: an in-memory copy behind a
//! read/write lock, mirrored by a single JSON record on disk so the token
//! survives across invocations. The durable tier is opportunistically
//! consistent across processes; a stale or concurrently overwritten record
//! simply fails the validity check and falls through to a fresh exchange.

use std::path::{Path, PathBuf};
use std::sync::RwLock;

use tracing::{debug, warn};

use super::token::CachedToken;
use super::AuthError;

/// File name of the durable cache record, under the config directory.
const CACHE_FILE_NAME: &str = ".lazycommit.token.cache";

/// File permissions for the cache record (Unix only): owner read/write.
#[cfg(unix)]
const FILE_MODE: u32 = 0o600;

/// Directory permissions (Unix only): owner read/write/execute.
#[cfg(unix)]
const DIR_MODE: u32 = 0o700;

/// Process-wide cache of the current bearer token.
///
/// Constructed with the directory the durable record lives in; tests can
/// point instances at independent temporary directories.
pub struct TokenCache {
    memory: RwLock<Option<CachedToken>>,
    path: PathBuf,
}

impl TokenCache {
    /// Create a cache whose durable record lives under `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            memory: RwLock::new(None),
            path: dir.into().join(CACHE_FILE_NAME),
        }
    }

    /// Path of the durable cache record.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Return a valid cached token for `credential`, if any.
    ///
    /// Checks the in-memory tier first; a durable hit is promoted into
    /// memory. Returns a copy, never an alias into the cache.
    pub fn get(&self, credential: &str) -> Option<CachedToken> {
        {
            let guard = self.memory.read().expect("lock poisoned");
            if let Some(cached) = guard.as_ref() {
                if cached.is_valid_for(credential) {
                    return Some(cached.clone());
                }
            }
        }

        let cached = self.load()?;
        if !cached.is_valid_for(credential) {
            return None;
        }

        debug!("promoted durable token cache record into memory");
        let mut guard = self.memory.write().expect("lock poisoned");
        *guard = Some(cached.clone());
        Some(cached)
    }

    /// Persist a freshly exchanged token to both tiers.
    ///
    /// The memory tier is updated even when the durable write fails, so a
    /// disk problem degrades to per-invocation caching.
    pub fn save(
        &self,
        token: &str,
        expires_at: i64,
        credential: &str,
    ) -> Result<(), AuthError> {
        let record = CachedToken::new(token, expires_at, credential);
        {
            let mut guard = self.memory.write().expect("lock poisoned");
            *guard = Some(record.clone());
        }
        self.store(&record)
    }

    /// Remove the cached token from both tiers. A missing durable record
    /// is not an error.
    pub fn invalidate(&self) {
        {
            let mut guard = self.memory.write().expect("lock poisoned");
            *guard = None;
        }

        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to remove token cache file");
            }
        }
    }

    /// Read the durable record. Absent and unreadable files are both a
    /// cache miss; unreadable ones additionally log a warning.
    fn load(&self) -> Option<CachedToken> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to read token cache file");
                return None;
            }
        };

        match serde_json::from_str(&content) {
            Ok(cached) => Some(cached),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "ignoring corrupt token cache file");
                None
            }
        }
    }

    fn store(&self, record: &CachedToken) -> Result<(), AuthError> {
        let dir = self
            .path
            .parent()
            .ok_or_else(|| AuthError::Storage("token cache path has no parent".into()))?;

        if !dir.exists() {
            std::fs::create_dir_all(dir).map_err(|e| {
                AuthError::Storage(format!(
                    "failed to create cache directory '{}': {e}",
                    dir.display()
                ))
            })?;

            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                let perms = std::fs::Permissions::from_mode(DIR_MODE);
                std::fs::set_permissions(dir, perms).map_err(|e| {
                    AuthError::Storage(format!(
                        "failed to set directory permissions on '{}': {e}",
                        dir.display()
                    ))
                })?;
            }
        }

        let content = serde_json::to_string(record)
            .map_err(|e| AuthError::Storage(format!("failed to serialize token cache: {e}")))?;

        // Write to a temp file first, then rename, so a concurrent reader
        // sees either the old or the new full record. On Unix the 0600 mode
        // is set at creation time so the token is never world-readable.
        let temp_path = self.path.with_extension("tmp");

        #[cfg(unix)]
        {
            use std::io::Write;
            use std::os::unix::fs::OpenOptionsExt;
            let mut file = std::fs::OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(FILE_MODE)
                .open(&temp_path)
                .map_err(|e| {
                    AuthError::Storage(format!(
                        "failed to create temp file '{}': {e}",
                        temp_path.display()
                    ))
                })?;
            file.write_all(content.as_bytes()).map_err(|e| {
                AuthError::Storage(format!(
                    "failed to write temp file '{}': {e}",
                    temp_path.display()
                ))
            })?;
        }

        #[cfg(not(unix))]
        {
            std::fs::write(&temp_path, &content).map_err(|e| {
                AuthError::Storage(format!(
                    "failed to write temp file '{}': {e}",
                    temp_path.display()
                ))
            })?;
        }

        if let Err(e) = std::fs::rename(&temp_path, &self.path) {
            let _ = std::fs::remove_file(&temp_path);
            return Err(AuthError::Storage(format!(
                "failed to rename '{}' to '{}': {e}",
                temp_path.display(),
                self.path.display()
            )));
        }

        Ok(())
    }
}
