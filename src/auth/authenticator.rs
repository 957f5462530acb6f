//! auth::authenticator
//!
//! Obtains a usable ScanID for an identity.
//!
//! # Flow
//!
//! 1. Reject an identity without a username.
//! 2. Look up the cached token and validate it; a valid one is returned
//!    without contacting Hub. Keys come from a fixed set or from a
//!    [`KeySetResolver`] that refetches them once its soft TTL lapses.
//! 3. Otherwise log in to Hub, negotiate a fresh ScanID, and persist it.
//!
//! A failure to persist the fresh token does not fail the call. It is
//! reported in [`IssuedToken::persist_error`] so the caller can tell the
//! user that caching did not happen.

use std::borrow::Cow;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::cache::TokenCache;
use super::errors::{AuthError, PersistenceError, TokenError};
use super::identity::Identity;
use super::validator::TokenValidator;
use super::{token_fingerprint, ScanTokenProvider};
use crate::core::config::Settings;
use crate::hub::{build_http_client, HubApi, HubClient, KeySetResolver};

/// Where an issued token came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenOrigin {
    /// The cached token was still valid.
    Cached,
    /// A fresh token was negotiated with Hub.
    Negotiated,
}

impl fmt::Display for TokenOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenOrigin::Cached => write!(f, "cached"),
            TokenOrigin::Negotiated => write!(f, "negotiated"),
        }
    }
}

/// A ScanID ready for use in the current invocation.
pub struct IssuedToken {
    pub token: String,
    pub origin: TokenOrigin,
    /// Set when a negotiated token could not be written to the cache.
    pub persist_error: Option<PersistenceError>,
}

impl IssuedToken {
    fn cached(token: String) -> Self {
        Self {
            token,
            origin: TokenOrigin::Cached,
            persist_error: None,
        }
    }
}

impl fmt::Debug for IssuedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuedToken")
            .field("token", &"[REDACTED]")
            .field("origin", &self.origin)
            .field("persist_error", &self.persist_error)
            .finish()
    }
}

/// What the cached token for a user would amount to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenStatus {
    /// The cached token would be reused.
    Valid,
    /// Nothing is cached for the user.
    Missing,
    /// A token is cached but would be replaced.
    Rejected(TokenError),
}

impl fmt::Display for TokenStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenStatus::Valid => write!(f, "valid"),
            TokenStatus::Missing => write!(f, "no cached token"),
            TokenStatus::Rejected(reason) => write!(f, "{}", reason),
        }
    }
}

/// Where the verification keys come from.
enum KeySource {
    /// Keys resolved by the caller, used as is.
    Fixed(TokenValidator),
    /// Keys refetched whenever the resolver's soft TTL has lapsed.
    Resolved {
        resolver: KeySetResolver,
        leeway: Duration,
    },
}

impl KeySource {
    async fn validator(&self) -> Result<Cow<'_, TokenValidator>, AuthError> {
        match self {
            KeySource::Fixed(validator) => Ok(Cow::Borrowed(validator)),
            KeySource::Resolved { resolver, leeway } => {
                let keys = resolver.resolve().await?;
                Ok(Cow::Owned(TokenValidator::with_leeway(keys, *leeway)))
            }
        }
    }
}

/// Composes the Hub client, key source, and token cache.
pub struct Authenticator {
    hub: Box<dyn HubApi>,
    keys: KeySource,
    cache: TokenCache,
}

impl Authenticator {
    /// Assemble an authenticator around a fixed key set.
    ///
    /// The validator carries an already-resolved key set, so [`get_token`]
    /// on a valid cached token performs no network call at all.
    ///
    /// [`get_token`]: Authenticator::get_token
    pub fn new(hub: Box<dyn HubApi>, validator: TokenValidator, cache: TokenCache) -> Self {
        Self {
            hub,
            keys: KeySource::Fixed(validator),
            cache,
        }
    }

    /// Assemble an authenticator whose keys come from `resolver`.
    ///
    /// Keys are fetched lazily and refetched once older than the resolver's
    /// TTL, so a long-lived authenticator picks up rotated keys.
    pub fn with_resolver(
        hub: Box<dyn HubApi>,
        resolver: KeySetResolver,
        leeway: Duration,
        cache: TokenCache,
    ) -> Self {
        Self {
            hub,
            keys: KeySource::Resolved { resolver, leeway },
            cache,
        }
    }

    /// Build an authenticator for `settings`.
    ///
    /// The key set is fetched here once so an unreachable JWKS endpoint
    /// fails early; later lookups reuse it until the TTL lapses.
    pub async fn connect(settings: &Settings) -> Result<Self, AuthError> {
        let client = build_http_client(settings.request_timeout)
            .map_err(|e| AuthError::HttpClient(e.to_string()))?;

        let resolver = KeySetResolver::new(client.clone(), settings.jwks_url.clone());
        let keys = resolver.resolve().await?;
        debug!(
            target: "hubscan.auth",
            instance = %settings.instance,
            url = resolver.url(),
            keys = keys.len(),
            "key set resolved"
        );

        Ok(Self::with_resolver(
            Box::new(HubClient::new(settings.hub_url.clone(), client)),
            resolver,
            settings.leeway,
            TokenCache::new(settings.tokens_path.clone()),
        ))
    }

    /// The token cache backing this authenticator.
    pub fn cache(&self) -> &TokenCache {
        &self.cache
    }

    /// Return a valid ScanID for `identity`, negotiating one if needed.
    ///
    /// # Errors
    ///
    /// - [`AuthError::NotLoggedIn`] if the identity has no username
    /// - [`AuthError::KeySet`] if a cached token exists but the keys to check it cannot be fetched
    /// - [`AuthError::Authentication`] if Hub rejects the credentials
    /// - [`AuthError::Negotiation`] if the ScanID request fails
    pub async fn get_token(&self, identity: &Identity) -> Result<IssuedToken, AuthError> {
        if identity.is_anonymous() {
            return Err(AuthError::NotLoggedIn);
        }
        let username = identity.username();

        if let Some(token) = self.cached_token(username).await? {
            return Ok(IssuedToken::cached(token));
        }

        let token = self.negotiate(identity).await?;

        let persist_error = match self.cache.update_local_token(username, &token) {
            Ok(()) => None,
            Err(err) => {
                warn!(
                    target: "hubscan.auth",
                    username,
                    error = %err,
                    "scan token obtained but not cached"
                );
                Some(err)
            }
        };

        Ok(IssuedToken {
            token,
            origin: TokenOrigin::Negotiated,
            persist_error,
        })
    }

    /// The cached token for `username` if it would be reused as is.
    ///
    /// Needs no credential and never contacts Hub; only the key set may be
    /// fetched.
    pub async fn cached_token(&self, username: &str) -> Result<Option<String>, AuthError> {
        let (token, status) = self.check_cached(username).await?;
        match (token, status) {
            (Some(token), TokenStatus::Valid) => {
                debug!(
                    target: "hubscan.auth",
                    username,
                    fingerprint = %token_fingerprint(&token),
                    "using cached scan token"
                );
                Ok(Some(token))
            }
            (_, TokenStatus::Rejected(reason)) => {
                debug!(
                    target: "hubscan.auth",
                    username,
                    %reason,
                    "cached scan token rejected"
                );
                Ok(None)
            }
            _ => {
                debug!(target: "hubscan.auth", username, "no cached scan token");
                Ok(None)
            }
        }
    }

    /// Check the cached token for `username` without contacting Hub.
    pub async fn cached_token_status(&self, username: &str) -> Result<TokenStatus, AuthError> {
        Ok(self.check_cached(username).await?.1)
    }

    /// Drop the cached token for `username`. Returns whether one existed.
    pub fn forget(&self, username: &str) -> Result<bool, AuthError> {
        Ok(self.cache.remove_local_token(username)?)
    }

    async fn check_cached(
        &self,
        username: &str,
    ) -> Result<(Option<String>, TokenStatus), AuthError> {
        let Some(token) = self.cache.get_local_token(username) else {
            return Ok((None, TokenStatus::Missing));
        };

        let validator = self.keys.validator().await?;
        let status = match validator.check_validity(&token) {
            Ok(()) => TokenStatus::Valid,
            Err(reason) => TokenStatus::Rejected(reason),
        };
        Ok((Some(token), status))
    }

    async fn negotiate(&self, identity: &Identity) -> Result<String, AuthError> {
        let bearer = self
            .hub
            .login(identity)
            .await
            .map_err(AuthError::Authentication)?;

        let token = self
            .hub
            .negotiate_scan_id(&bearer)
            .await
            .map_err(AuthError::Negotiation)?;

        debug!(
            target: "hubscan.auth",
            username = identity.username(),
            fingerprint = %token_fingerprint(&token),
            "negotiated scan token"
        );
        Ok(token)
    }
}

#[async_trait]
impl ScanTokenProvider for Authenticator {
    async fn scan_token(&self, identity: &Identity) -> Result<String, AuthError> {
        self.get_token(identity).await.map(|issued| issued.token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::testutil::TestSigner;
    use crate::hub::HubError;
    use chrono::Utc;
    use secrecy::{ExposeSecret, SecretString};
    use serde_json::json;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const KID: &str = "scan-key";

    #[derive(Default)]
    struct Calls {
        login: AtomicUsize,
        negotiate: AtomicUsize,
    }

    struct MockHub {
        calls: Arc<Calls>,
        login: Result<&'static str, u16>,
        scan_id: Result<String, u16>,
    }

    impl MockHub {
        fn issuing(scan_id: String) -> (Self, Arc<Calls>) {
            let calls = Arc::new(Calls::default());
            let hub = Self {
                calls: Arc::clone(&calls),
                login: Ok("hub-bearer"),
                scan_id: Ok(scan_id),
            };
            (hub, calls)
        }
    }

    fn status_error(code: u16) -> HubError {
        HubError::Status {
            status: format!("{} Test", code),
            code,
        }
    }

    #[async_trait]
    impl HubApi for MockHub {
        async fn login(&self, _identity: &Identity) -> Result<SecretString, HubError> {
            self.calls.login.fetch_add(1, Ordering::SeqCst);
            self.login
                .map(|bearer| SecretString::from(bearer.to_string()))
                .map_err(status_error)
        }

        async fn negotiate_scan_id(&self, bearer: &SecretString) -> Result<String, HubError> {
            self.calls.negotiate.fetch_add(1, Ordering::SeqCst);
            assert_eq!(bearer.expose_secret(), "hub-bearer");
            self.scan_id.clone().map_err(status_error)
        }
    }

    fn now() -> i64 {
        Utc::now().timestamp()
    }

    fn identity() -> Identity {
        Identity::new("alice", "hunter2")
    }

    fn authenticator(dir: &TempDir, signer: &TestSigner, hub: MockHub) -> Authenticator {
        Authenticator::new(
            Box::new(hub),
            TokenValidator::new(signer.key_set(KID)),
            TokenCache::new(dir.path().join("scan").join("tokens.json")),
        )
    }

    #[tokio::test]
    async fn empty_cache_negotiates_once_and_persists() {
        let dir = TempDir::new().expect("tempdir");
        let signer = TestSigner::generate();
        let fresh = signer.sign(Some(KID), now(), now() + 3600);
        let (hub, calls) = MockHub::issuing(fresh.clone());
        let auth = authenticator(&dir, &signer, hub);

        let issued = auth.get_token(&identity()).await.expect("token");

        assert_eq!(issued.token, fresh);
        assert_eq!(issued.origin, TokenOrigin::Negotiated);
        assert!(issued.persist_error.is_none());
        assert_eq!(calls.login.load(Ordering::SeqCst), 1);
        assert_eq!(calls.negotiate.load(Ordering::SeqCst), 1);
        assert_eq!(auth.cache().get_local_token("alice"), Some(fresh));
    }

    #[tokio::test]
    async fn valid_cached_token_skips_hub() {
        let dir = TempDir::new().expect("tempdir");
        let signer = TestSigner::generate();
        let cached = signer.sign(Some(KID), now(), now() + 3600);
        let (hub, calls) = MockHub::issuing("unused".into());
        let auth = authenticator(&dir, &signer, hub);
        auth.cache()
            .update_local_token("alice", &cached)
            .expect("seed");

        let issued = auth.get_token(&identity()).await.expect("token");

        assert_eq!(issued.token, cached);
        assert_eq!(issued.origin, TokenOrigin::Cached);
        assert_eq!(calls.login.load(Ordering::SeqCst), 0);
        assert_eq!(calls.negotiate.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn expired_cached_token_is_replaced() {
        let dir = TempDir::new().expect("tempdir");
        let signer = TestSigner::generate();
        let stale = signer.sign(Some(KID), now() - 7200, now() - 3600);
        let fresh = signer.sign(Some(KID), now(), now() + 3600);
        let (hub, calls) = MockHub::issuing(fresh.clone());
        let auth = authenticator(&dir, &signer, hub);
        auth.cache().update_local_token("alice", &stale).expect("seed");
        auth.cache().update_local_token("bob", &stale).expect("seed");

        let issued = auth.get_token(&identity()).await.expect("token");

        assert_eq!(issued.token, fresh);
        assert_eq!(calls.login.load(Ordering::SeqCst), 1);
        assert_eq!(auth.cache().get_local_token("alice"), Some(fresh));
        assert_eq!(auth.cache().get_local_token("bob"), Some(stale));
    }

    #[tokio::test]
    async fn token_for_unknown_key_is_replaced() {
        let dir = TempDir::new().expect("tempdir");
        let signer = TestSigner::generate();
        let other = TestSigner::generate();
        let foreign = other.sign(Some("other-key"), now(), now() + 3600);
        let fresh = signer.sign(Some(KID), now(), now() + 3600);
        let (hub, calls) = MockHub::issuing(fresh.clone());
        let auth = authenticator(&dir, &signer, hub);
        auth.cache().update_local_token("alice", &foreign).expect("seed");

        let issued = auth.get_token(&identity()).await.expect("token");

        assert_eq!(issued.origin, TokenOrigin::Negotiated);
        assert_eq!(calls.negotiate.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn corrupt_cache_negotiates() {
        let dir = TempDir::new().expect("tempdir");
        let signer = TestSigner::generate();
        let fresh = signer.sign(Some(KID), now(), now() + 3600);
        let (hub, calls) = MockHub::issuing(fresh.clone());
        let auth = authenticator(&dir, &signer, hub);
        fs::create_dir_all(dir.path().join("scan")).expect("mkdir");
        fs::write(auth.cache().path(), "{not json").expect("write");

        let issued = auth.get_token(&identity()).await.expect("token");

        assert_eq!(issued.token, fresh);
        assert_eq!(calls.login.load(Ordering::SeqCst), 1);
        assert_eq!(auth.cache().get_local_token("alice"), Some(fresh));
    }

    #[tokio::test]
    async fn login_failure_is_authentication_error() {
        let dir = TempDir::new().expect("tempdir");
        let signer = TestSigner::generate();
        let (mut hub, calls) = MockHub::issuing("unused".into());
        hub.login = Err(401);
        let auth = authenticator(&dir, &signer, hub);

        let err = auth.get_token(&identity()).await.unwrap_err();

        assert!(matches!(err, AuthError::Authentication(_)));
        assert!(err.needs_login());
        assert_eq!(calls.negotiate.load(Ordering::SeqCst), 0);
        assert!(!auth.cache().path().exists());
    }

    #[tokio::test]
    async fn scan_id_failure_is_negotiation_error() {
        let dir = TempDir::new().expect("tempdir");
        let signer = TestSigner::generate();
        let (mut hub, _calls) = MockHub::issuing(String::new());
        hub.scan_id = Err(500);
        let auth = authenticator(&dir, &signer, hub);

        let err = auth.get_token(&identity()).await.unwrap_err();

        assert!(matches!(err, AuthError::Negotiation(_)));
        assert!(err.is_transient());
        assert!(!auth.cache().path().exists());
    }

    #[tokio::test]
    async fn anonymous_identity_is_rejected_before_any_call() {
        let dir = TempDir::new().expect("tempdir");
        let signer = TestSigner::generate();
        let (hub, calls) = MockHub::issuing("unused".into());
        let auth = authenticator(&dir, &signer, hub);

        let err = auth.get_token(&Identity::new("  ", "pw")).await.unwrap_err();

        assert!(matches!(err, AuthError::NotLoggedIn));
        assert_eq!(calls.login.load(Ordering::SeqCst), 0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn persistence_failure_still_returns_token() {
        let dir = TempDir::new().expect("tempdir");
        let signer = TestSigner::generate();
        let fresh = signer.sign(Some(KID), now(), now() + 3600);
        let (hub, _calls) = MockHub::issuing(fresh.clone());
        // A regular file where the cache directory should be.
        let blocker = dir.path().join("scan");
        fs::write(&blocker, "not a directory").expect("write");
        let auth = authenticator(&dir, &signer, hub);

        let issued = auth.get_token(&identity()).await.expect("token");

        assert_eq!(issued.token, fresh);
        assert_eq!(issued.origin, TokenOrigin::Negotiated);
        assert!(issued.persist_error.is_some());
    }

    #[tokio::test]
    async fn scan_token_provider_returns_bare_token() {
        let dir = TempDir::new().expect("tempdir");
        let signer = TestSigner::generate();
        let fresh = signer.sign(Some(KID), now(), now() + 3600);
        let (hub, _calls) = MockHub::issuing(fresh.clone());
        let auth = authenticator(&dir, &signer, hub);
        let provider: &dyn ScanTokenProvider = &auth;

        assert_eq!(provider.scan_token(&identity()).await.expect("token"), fresh);
    }

    #[tokio::test]
    async fn cached_token_status_reports_reason() {
        let dir = TempDir::new().expect("tempdir");
        let signer = TestSigner::generate();
        let (hub, calls) = MockHub::issuing("unused".into());
        let auth = authenticator(&dir, &signer, hub);

        let status = auth.cached_token_status("alice").await.expect("status");
        assert_eq!(status, TokenStatus::Missing);
        assert_eq!(status.to_string(), "no cached token");

        let stale = signer.sign(Some(KID), now() - 7200, now() - 3600);
        auth.cache().update_local_token("alice", &stale).expect("seed");
        assert!(matches!(
            auth.cached_token_status("alice").await.expect("status"),
            TokenStatus::Rejected(TokenError::Expired { .. })
        ));

        let fresh = signer.sign(Some(KID), now(), now() + 3600);
        auth.cache().update_local_token("alice", &fresh).expect("seed");
        let status = auth.cached_token_status("alice").await.expect("status");
        assert_eq!(status, TokenStatus::Valid);
        assert_eq!(status.to_string(), "valid");
        assert_eq!(calls.login.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn cached_token_returns_only_reusable_tokens() {
        let dir = TempDir::new().expect("tempdir");
        let signer = TestSigner::generate();
        let (hub, calls) = MockHub::issuing("unused".into());
        let auth = authenticator(&dir, &signer, hub);

        assert_eq!(auth.cached_token("alice").await.expect("lookup"), None);

        let stale = signer.sign(Some(KID), now() - 7200, now() - 3600);
        auth.cache().update_local_token("alice", &stale).expect("seed");
        assert_eq!(auth.cached_token("alice").await.expect("lookup"), None);

        let fresh = signer.sign(Some(KID), now(), now() + 3600);
        auth.cache().update_local_token("alice", &fresh).expect("seed");
        assert_eq!(auth.cached_token("alice").await.expect("lookup"), Some(fresh));
        assert_eq!(calls.login.load(Ordering::SeqCst), 0);
        assert_eq!(calls.negotiate.load(Ordering::SeqCst), 0);
    }

    async fn serve_key_set(signer: &TestSigner, fetches: u64) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/jwks.json"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "keys": [signer.jwk(KID)] })),
            )
            .expect(fetches)
            .mount(&server)
            .await;
        server
    }

    fn resolving_authenticator(
        dir: &TempDir,
        server: &MockServer,
        ttl: Duration,
        hub: MockHub,
    ) -> Authenticator {
        let resolver = KeySetResolver::with_ttl(
            reqwest::Client::new(),
            format!("{}/jwks.json", server.uri()),
            ttl,
        );
        Authenticator::with_resolver(
            Box::new(hub),
            resolver,
            crate::auth::DEFAULT_LEEWAY,
            TokenCache::new(dir.path().join("scan").join("tokens.json")),
        )
    }

    #[tokio::test]
    async fn resolved_keys_are_reused_within_ttl() {
        let dir = TempDir::new().expect("tempdir");
        let signer = TestSigner::generate();
        let server = serve_key_set(&signer, 1).await;
        let (hub, calls) = MockHub::issuing("unused".into());
        let auth = resolving_authenticator(&dir, &server, Duration::from_secs(600), hub);
        let cached = signer.sign(Some(KID), now(), now() + 3600);
        auth.cache().update_local_token("alice", &cached).expect("seed");

        for _ in 0..2 {
            let issued = auth.get_token(&identity()).await.expect("token");
            assert_eq!(issued.origin, TokenOrigin::Cached);
        }
        assert_eq!(calls.login.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn resolved_keys_are_refetched_once_stale() {
        let dir = TempDir::new().expect("tempdir");
        let signer = TestSigner::generate();
        let server = serve_key_set(&signer, 2).await;
        let (hub, _calls) = MockHub::issuing("unused".into());
        let auth = resolving_authenticator(&dir, &server, Duration::ZERO, hub);
        let cached = signer.sign(Some(KID), now(), now() + 3600);
        auth.cache().update_local_token("alice", &cached).expect("seed");

        auth.get_token(&identity()).await.expect("first");
        tokio::time::sleep(Duration::from_millis(5)).await;
        auth.get_token(&identity()).await.expect("second");
    }

    #[tokio::test]
    async fn empty_cache_needs_no_key_set() {
        let dir = TempDir::new().expect("tempdir");
        let signer = TestSigner::generate();
        let server = serve_key_set(&signer, 0).await;
        let fresh = signer.sign(Some(KID), now(), now() + 3600);
        let (hub, calls) = MockHub::issuing(fresh.clone());
        let auth = resolving_authenticator(&dir, &server, Duration::from_secs(600), hub);

        let issued = auth.get_token(&identity()).await.expect("token");

        assert_eq!(issued.token, fresh);
        assert_eq!(calls.negotiate.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn forget_removes_only_that_user() {
        let dir = TempDir::new().expect("tempdir");
        let signer = TestSigner::generate();
        let (hub, _calls) = MockHub::issuing("unused".into());
        let auth = authenticator(&dir, &signer, hub);
        auth.cache().update_local_token("alice", "a").expect("seed");
        auth.cache().update_local_token("bob", "b").expect("seed");

        assert!(auth.forget("alice").expect("forget"));
        assert!(!auth.forget("alice").expect("forget again"));
        assert_eq!(auth.cache().get_local_token("alice"), None);
        assert_eq!(auth.cache().get_local_token("bob"), Some("b".to_string()));
    }

    #[test]
    fn issued_token_debug_is_redacted() {
        let issued = IssuedToken::cached("eyJsecret.payload.sig".into());
        let debug = format!("{:?}", issued);
        assert!(!debug.contains("eyJsecret"));
        assert!(debug.contains("REDACTED"));
        assert_eq!(TokenOrigin::Negotiated.to_string(), "negotiated");
    }
}
