//! auth - ScanID authentication and caching
//!
//! This module obtains the signed ScanID token that authorizes scan requests,
//! reusing a locally cached token while it is still valid.
//!
//! # Architecture
//!
//! The auth system:
//! - Keeps one ScanID per registry username in `<config-dir>/scan/tokens.json`
//! - Verifies cached tokens against the Hub key set before reuse
//! - Negotiates a fresh token through Hub when the cached one is missing or rejected
//! - Never exposes tokens or credentials in logs, errors, or debug output
//!
//! # Components
//!
//! - [`Identity`] - registry username plus credential
//! - [`TokenCache`] - the local token map
//! - [`TokenValidator`] - signature and expiry checks
//! - [`Authenticator`] - orchestration, implements [`ScanTokenProvider`]
//!
//! # Security
//!
//! Tokens MUST never appear in:
//! - logs (including --debug)
//! - error messages
//! - debug output
//!
//! Logs carry [`token_fingerprint`] instead.
//!
//! # Example
//!
//! ```no_run
//! use hubscan::auth::{Authenticator, Identity, ScanTokenProvider};
//! use hubscan::core::config::Settings;
//!
//! # async fn run(settings: Settings) -> Result<(), hubscan::auth::AuthError> {
//! let auth = Authenticator::connect(&settings).await?;
//! let token = auth.scan_token(&Identity::new("alice", "secret")).await?;
//! # let _ = token;
//! # Ok(())
//! # }
//! ```

mod authenticator;
pub mod cache;
mod errors;
mod identity;
pub mod validator;

#[cfg(test)]
pub(crate) mod testutil;

// Re-export public types
pub use authenticator::{Authenticator, IssuedToken, TokenOrigin, TokenStatus};
pub use cache::TokenCache;
pub use errors::{AuthError, PersistenceError, TokenError};
pub use identity::Identity;
pub use validator::{TokenValidator, DEFAULT_LEEWAY};

use sha2::{Digest, Sha256};

/// Trait for providing ScanID tokens to the scan invocation.
///
/// # Implementation Notes
///
/// Implementors must:
/// - Return a token valid at the time of the call
/// - Never log or expose token values
#[async_trait::async_trait]
pub trait ScanTokenProvider: Send + Sync {
    /// Returns a usable ScanID for `identity`.
    ///
    /// # Errors
    ///
    /// - [`AuthError::NotLoggedIn`] if the identity has no username
    /// - [`AuthError::Authentication`] if Hub rejects the credentials
    /// - [`AuthError::Negotiation`] if no ScanID could be obtained
    async fn scan_token(&self, identity: &Identity) -> Result<String, AuthError>;
}

/// Short, stable, non-reversible identifier for a token, safe to log.
pub fn token_fingerprint(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    let mut hex = hex::encode(digest);
    hex.truncate(12);
    hex
}
