//! auth::errors
//!
//! Error types for ScanID validation, caching, and negotiation.
//!
//! # Design
//!
//! Validation failures ([`TokenError`]) all lead to the same recovery,
//! a fresh negotiation; they are kept apart so diagnostics and tests can tell
//! which check rejected a cached token. Negotiation and persistence failures
//! reach the caller through [`AuthError`].
//!
//! Error messages MUST NOT contain tokens or credentials.
//!
//! # Example
//!
//! ```
//! use hubscan::auth::{AuthError, TokenError};
//!
//! let err = TokenError::KeyMismatch;
//! assert_eq!(err.to_string(), "invalid token: key identifier does not match");
//!
//! assert!(AuthError::NotLoggedIn.needs_login());
//! ```

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::hub::{FetchError, HubError};

/// Why a ScanID token was rejected.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TokenError {
    /// No token to check.
    #[error("empty token")]
    Empty,

    /// The token is not a well-formed compact JWS.
    #[error("invalid token: {0}")]
    Invalid(String),

    /// The header names no key, or a key that is not in the key set.
    #[error("invalid token: key identifier does not match")]
    KeyMismatch,

    /// The signature does not verify against the matched key.
    #[error("invalid token: signature does not match the content: {0}")]
    Signature(String),

    /// The expiry claim is further in the past than the leeway allows.
    #[error("token has expired at {expired_at}")]
    Expired {
        /// The token's `exp` claim.
        expired_at: DateTime<Utc>,
    },
}

/// Failure to read or write the local token map.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("failed to inspect token cache '{path}': {source}")]
    Stat {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to read token cache '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to create token cache directory '{path}': {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write token cache '{path}': {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to serialize token cache: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Errors surfaced by [`Authenticator`](super::Authenticator).
#[derive(Debug, Error)]
pub enum AuthError {
    /// The caller has no registry identity.
    #[error(
        "You need to be logged in to Docker Hub to use scan feature.\n\
         please login to Docker Hub using the Docker Login command"
    )]
    NotLoggedIn,

    /// Hub rejected or failed the credential login.
    #[error("authentication on Docker Hub failed, you must be logged in: {0}")]
    Authentication(#[source] HubError),

    /// Login succeeded but the ScanID could not be obtained.
    #[error("failed to negotiate a scan token with Docker Hub: {0}")]
    Negotiation(#[source] HubError),

    /// The verification keys could not be retrieved.
    #[error(transparent)]
    KeySet(#[from] FetchError),

    /// The local token map could not be updated.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    /// The HTTP client could not be set up.
    #[error("failed to initialize HTTP client: {0}")]
    HttpClient(String),

    /// The operation was interrupted before it completed.
    #[error("operation cancelled")]
    Cancelled,
}

impl AuthError {
    /// True if the user has to (re-)login to the registry to recover.
    pub fn needs_login(&self) -> bool {
        match self {
            AuthError::NotLoggedIn => true,
            AuthError::Authentication(err) => err.is_unauthorized(),
            _ => false,
        }
    }

    /// True for network failures a caller may retry.
    pub fn is_transient(&self) -> bool {
        match self {
            AuthError::Authentication(err) | AuthError::Negotiation(err) => err.is_transient(),
            AuthError::KeySet(err) => err.is_transient(),
            _ => false,
        }
    }
}
