//! hub - remote side of ScanID negotiation
//!
//! # Components
//!
//! - [`HubInstance`] - production/staging endpoints, chosen once at startup
//! - [`HubClient`] - credential login and ScanID issuance
//! - [`KeySet`] / [`fetch_key_set`] / [`KeySetResolver`] - JWKS resolution
//!
//! The [`HubApi`] trait is the seam the authenticator depends on, so the
//! orchestration can be driven by a test double as well as by [`HubClient`].

pub mod client;
pub mod instance;
pub mod jwks;

use std::time::Duration;

use secrecy::SecretString;

pub use client::{HubClient, HubError, CLIENT_USER_AGENT};
pub use instance::{HubInstance, INSTANCE_ENV_VAR, LOGIN_PATH, SCAN_TOKEN_PATH};
pub use jwks::{
    fetch_key_set, CachedKeySet, FetchError, KeySet, KeySetResolver, DEFAULT_KEY_SET_TTL,
};

use crate::auth::Identity;

/// Default timeout applied to every Hub and JWKS request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// The two Hub calls needed to obtain a ScanID.
///
/// # Errors
///
/// Both calls fail with [`HubError`] on transport errors, on any non-200
/// answer, and on bodies the endpoint does not produce.
#[async_trait::async_trait]
pub trait HubApi: Send + Sync {
    /// Exchange registry credentials for a short-lived bearer token.
    async fn login(&self, identity: &Identity) -> Result<SecretString, HubError>;

    /// Exchange a bearer token for a signed ScanID token.
    async fn negotiate_scan_id(&self, bearer: &SecretString) -> Result<String, HubError>;
}

/// Build the HTTP client shared by the Hub client and the key-set resolver.
pub fn build_http_client(timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(CLIENT_USER_AGENT)
        .build()
}
