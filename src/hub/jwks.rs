//! hub::jwks
//!
//! Key-set resolution for ScanID signature verification.
//!
//! # Design
//!
//! The identity provider publishes its signing keys as a standard JWKS
//! document. [`fetch_key_set`] is a pure function of a URL: one GET, no
//! retries, no disk state. Every failure mode maps to its own
//! [`FetchError`] variant so callers can tell a dead network from a broken
//! document.
//!
//! [`KeySetResolver`] adds an optional in-memory soft TTL on top. A key set
//! older than the TTL is refetched before it is used again, so a key rotated
//! on the server is never trusted locally for longer than the TTL.
//!
//! # Example
//!
//! ```ignore
//! use hubscan::hub::{fetch_key_set, HubInstance};
//!
//! let client = reqwest::Client::new();
//! let keys = fetch_key_set(&client, HubInstance::Production.jwks_url()).await?;
//! if let Some(jwk) = keys.find("key-id") {
//!     // verify with jwk
//! }
//! ```

use std::sync::RwLock;
use std::time::{Duration, Instant};

use jsonwebtoken::jwk::{Jwk, JwkSet};
use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::Client;
use thiserror::Error;

use super::client::CLIENT_USER_AGENT;

/// Default soft TTL for an in-memory key set.
pub const DEFAULT_KEY_SET_TTL: Duration = Duration::from_secs(600);

/// Errors from fetching or parsing a key set.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request could not be sent or the body could not be read.
    #[error("failed to fetch JWKS: {0}")]
    Network(String),

    /// The server answered with a non-2xx status.
    #[error("failed to fetch JWKS: invalid status code {status}")]
    Status {
        /// HTTP status code
        status: u16,
    },

    /// The server answered 2xx with nothing in the body.
    #[error("failed to fetch JWKS: invalid jwks.json file")]
    EmptyBody,

    /// The body is not a JWKS document.
    #[error("invalid JWKS: {0}")]
    Malformed(String),
}

impl FetchError {
    /// Network-level failures may succeed if the caller retries.
    pub fn is_transient(&self) -> bool {
        matches!(self, FetchError::Network(_))
            || matches!(self, FetchError::Status { status } if *status >= 500)
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Network(err.to_string())
    }
}

/// A parsed set of public verification keys.
#[derive(Debug, Clone)]
pub struct KeySet {
    keys: JwkSet,
}

impl Default for KeySet {
    fn default() -> Self {
        Self {
            keys: JwkSet { keys: Vec::new() },
        }
    }
}

impl KeySet {
    /// Wrap an already parsed JWKS.
    pub fn new(keys: JwkSet) -> Self {
        Self { keys }
    }

    /// Parse a JWKS JSON document.
    ///
    /// # Example
    ///
    /// ```
    /// use hubscan::hub::KeySet;
    ///
    /// let keys = KeySet::from_json(r#"{"keys": []}"#).unwrap();
    /// assert!(keys.is_empty());
    ///
    /// assert!(KeySet::from_json("not json").is_err());
    /// ```
    pub fn from_json(json: &str) -> Result<Self, FetchError> {
        if json.trim().is_empty() {
            return Err(FetchError::EmptyBody);
        }
        let keys: JwkSet =
            serde_json::from_str(json).map_err(|e| FetchError::Malformed(e.to_string()))?;
        Ok(Self { keys })
    }

    /// Find the key with the given key identifier.
    pub fn find(&self, kid: &str) -> Option<&Jwk> {
        self.keys
            .keys
            .iter()
            .find(|jwk| jwk.common.key_id.as_deref() == Some(kid))
    }

    /// Key identifiers in publication order. Keys without a `kid` are skipped.
    pub fn key_ids(&self) -> Vec<&str> {
        self.keys
            .keys
            .iter()
            .filter_map(|jwk| jwk.common.key_id.as_deref())
            .collect()
    }

    /// Number of keys in the set.
    pub fn len(&self) -> usize {
        self.keys.keys.len()
    }

    /// True when the set holds no keys.
    pub fn is_empty(&self) -> bool {
        self.keys.keys.is_empty()
    }
}

/// Fetch and parse the JWKS document at `url`.
///
/// # Errors
///
/// - [`FetchError::Network`] if the request fails
/// - [`FetchError::Status`] on a non-2xx answer
/// - [`FetchError::EmptyBody`] if the body is empty
/// - [`FetchError::Malformed`] if the body is not a JWKS document
pub async fn fetch_key_set(client: &Client, url: &str) -> Result<KeySet, FetchError> {
    tracing::debug!(target: "hubscan.jwks", url, "fetching key set");

    let response = client
        .get(url)
        .header(ACCEPT, "application/json")
        .header(USER_AGENT, CLIENT_USER_AGENT)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        tracing::debug!(target: "hubscan.jwks", status = status.as_u16(), "key set fetch rejected");
        return Err(FetchError::Status {
            status: status.as_u16(),
        });
    }

    let body = response.text().await?;
    let keys = KeySet::from_json(&body)?;

    tracing::debug!(target: "hubscan.jwks", kids = ?keys.key_ids(), "key set fetched");
    Ok(keys)
}

/// A key set together with the instant it was fetched.
#[derive(Debug, Clone)]
pub struct CachedKeySet {
    /// The keys.
    pub keys: KeySet,
    /// When the keys were fetched.
    pub fetched_at: Instant,
}

impl CachedKeySet {
    /// Record a freshly fetched key set.
    pub fn new(keys: KeySet) -> Self {
        Self {
            keys,
            fetched_at: Instant::now(),
        }
    }

    /// True if the keys are older than `ttl`.
    pub fn is_stale(&self, ttl: Duration) -> bool {
        self.is_stale_at(ttl, Instant::now())
    }

    /// Deterministic variant of [`CachedKeySet::is_stale`].
    pub fn is_stale_at(&self, ttl: Duration, now: Instant) -> bool {
        now.saturating_duration_since(self.fetched_at) > ttl
    }
}

/// Resolves the key set for a JWKS URL, refetching once the soft TTL lapses.
#[derive(Debug)]
pub struct KeySetResolver {
    client: Client,
    url: String,
    ttl: Duration,
    cached: RwLock<Option<CachedKeySet>>,
}

impl KeySetResolver {
    /// Create a resolver for `url` with the default TTL.
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self::with_ttl(client, url, DEFAULT_KEY_SET_TTL)
    }

    /// Create a resolver with a custom soft TTL.
    pub fn with_ttl(client: Client, url: impl Into<String>, ttl: Duration) -> Self {
        Self {
            client,
            url: url.into(),
            ttl,
            cached: RwLock::new(None),
        }
    }

    /// The JWKS URL this resolver reads.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Return the current key set, fetching it if absent or stale.
    pub async fn resolve(&self) -> Result<KeySet, FetchError> {
        if let Ok(cached) = self.cached.read() {
            if let Some(entry) = cached.as_ref().filter(|c| !c.is_stale(self.ttl)) {
                return Ok(entry.keys.clone());
            }
        }

        let keys = fetch_key_set(&self.client, &self.url).await?;
        if let Ok(mut cached) = self.cached.write() {
            *cached = Some(CachedKeySet::new(keys.clone()));
        }
        Ok(keys)
    }
}
