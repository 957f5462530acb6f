//! auth::cache
//!
//! Local ScanID cache at `<config-dir>/scan/tokens.json`.
//!
//! # Format
//!
//! A single JSON object mapping registry username to the last ScanID
//! negotiated for it:
//!
//! ```json
//! {"alice":"eyJhbGciOi...","bob":"eyJhbGciOi..."}
//! ```
//!
//! # Design
//!
//! - Reads never fail. A missing file, an unreadable file, or content that is
//!   not a JSON object of strings all mean "no token cached"; the caller can
//!   always recover by negotiating a new token.
//! - Writes are read-modify-write. Entries of other usernames are preserved;
//!   corrupt content is replaced by a fresh map.
//! - The file mode of an existing cache is kept; new files get
//!   [`DEFAULT_CACHE_MODE`] (Unix only).
//! - Writes go to a uniquely named temp file in the same directory which is
//!   then renamed over the cache, so a reader never sees a half-written file.
//!   Concurrent writers race as last-writer-wins.
//!
//! # Example
//!
//! ```ignore
//! use hubscan::auth::TokenCache;
//!
//! let cache = TokenCache::new(paths.tokens_path());
//! if cache.get_local_token("alice").is_none() {
//!     cache.update_local_token("alice", &fresh_token)?;
//! }
//! ```

use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

use uuid::Uuid;

use super::errors::PersistenceError;
use super::token_fingerprint;

/// Mode given to a cache file that does not exist yet.
pub const DEFAULT_CACHE_MODE: u32 = 0o644;

/// Username to ScanID. Ordered so the file content is stable.
pub type TokenMap = BTreeMap<String, String>;

/// Parse cache content, falling back to an empty map on any parse error.
///
/// # Example
///
/// ```
/// use hubscan::auth::cache::parse_token_map;
///
/// assert!(parse_token_map(b"").is_empty());
/// assert!(parse_token_map(b"\"not json\"").is_empty());
/// assert_eq!(parse_token_map(br#"{"alice":"T1"}"#).len(), 1);
/// ```
pub fn parse_token_map(content: &[u8]) -> TokenMap {
    match serde_json::from_slice::<TokenMap>(content) {
        Ok(map) => map,
        Err(err) => {
            tracing::debug!(target: "hubscan.cache", error = %err, "token cache unparsable, treating as empty");
            TokenMap::new()
        }
    }
}

/// File-backed map of registry username to ScanID.
#[derive(Debug, Clone)]
pub struct TokenCache {
    /// Path to the cache file.
    path: PathBuf,
}

impl TokenCache {
    /// Create a cache backed by the file at `path`. Nothing is read yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the cache file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Return the cached token for `username`, if any.
    ///
    /// Never fails: a missing, unreadable, or corrupt file yields `None`, as
    /// does an empty entry.
    pub fn get_local_token(&self, username: &str) -> Option<String> {
        let content = match fs::read(&self.path) {
            Ok(content) => content,
            Err(err) => {
                if err.kind() != ErrorKind::NotFound {
                    tracing::debug!(target: "hubscan.cache", path = %self.path.display(), error = %err, "token cache unreadable");
                }
                return None;
            }
        };

        let token = parse_token_map(&content)
            .remove(username)
            .filter(|token| !token.is_empty());

        if let Some(ref token) = token {
            tracing::debug!(
                target: "hubscan.cache",
                username,
                fingerprint = %token_fingerprint(token),
                "found cached token"
            );
        }
        token
    }

    /// Set the token for `username`, keeping every other entry.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] if the existing file cannot be inspected
    /// or read (other than not existing), or the new content cannot be
    /// written. Corrupt content is not an error; it is replaced.
    pub fn update_local_token(&self, username: &str, token: &str) -> Result<(), PersistenceError> {
        let mode = self.existing_mode()?;
        let mut tokens = self.read_for_update()?;
        tokens.insert(username.to_string(), token.to_string());
        self.write_tokens(&tokens, mode)?;

        tracing::debug!(
            target: "hubscan.cache",
            username,
            fingerprint = %token_fingerprint(token),
            path = %self.path.display(),
            "stored token"
        );
        Ok(())
    }

    /// Remove the entry for `username`.
    ///
    /// Returns whether an entry was removed. The file is left untouched when
    /// there was nothing to remove.
    pub fn remove_local_token(&self, username: &str) -> Result<bool, PersistenceError> {
        let mode = self.existing_mode()?;
        let mut tokens = self.read_for_update()?;
        if tokens.remove(username).is_none() {
            return Ok(false);
        }
        self.write_tokens(&tokens, mode)?;

        tracing::debug!(target: "hubscan.cache", username, "removed token");
        Ok(true)
    }

    /// Mode bits of the current file, `None` if it does not exist.
    fn existing_mode(&self) -> Result<Option<u32>, PersistenceError> {
        match fs::metadata(&self.path) {
            Ok(metadata) => Ok(Some(permission_bits(&metadata))),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(PersistenceError::Stat {
                path: self.path.clone(),
                source,
            }),
        }
    }

    /// Current entries; missing or corrupt content starts a new map.
    fn read_for_update(&self) -> Result<TokenMap, PersistenceError> {
        match fs::read(&self.path) {
            Ok(content) => Ok(parse_token_map(&content)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(TokenMap::new()),
            Err(source) => Err(PersistenceError::Read {
                path: self.path.clone(),
                source,
            }),
        }
    }

    /// Write the map through a temp file and rename it over the cache.
    fn write_tokens(&self, tokens: &TokenMap, mode: Option<u32>) -> Result<(), PersistenceError> {
        let content = serde_json::to_string(tokens)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| PersistenceError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let temp_path = self.temp_path();
        let write_error = |source| PersistenceError::Write {
            path: self.path.clone(),
            source,
        };

        let result = (|| {
            let mut file = OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&temp_path)?;

            #[cfg(unix)]
            file.set_permissions(fs::Permissions::from_mode(
                mode.unwrap_or(DEFAULT_CACHE_MODE),
            ))?;
            #[cfg(not(unix))]
            let _ = mode;

            file.write_all(content.as_bytes())?;
            file.sync_all()?;
            drop(file);

            fs::rename(&temp_path, &self.path)
        })();

        if result.is_err() {
            let _ = fs::remove_file(&temp_path);
        }
        result.map_err(write_error)
    }

    /// Sibling temp file, unique per write.
    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "tokens.json".to_string());
        self.path
            .with_file_name(format!(".{}.{}.tmp", name, Uuid::new_v4().simple()))
    }
}

#[cfg(unix)]
fn permission_bits(metadata: &fs::Metadata) -> u32 {
    metadata.permissions().mode() & 0o7777
}

#[cfg(not(unix))]
fn permission_bits(_metadata: &fs::Metadata) -> u32 {
    DEFAULT_CACHE_MODE
}
