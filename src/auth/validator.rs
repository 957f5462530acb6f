//! auth::validator
//!
//! ScanID verification against the published key set.
//!
//! # Checks
//!
//! A single pass, stopping at the first failure:
//!
//! 1. empty string → [`TokenError::Empty`]
//! 2. compact JWS header parses → else [`TokenError::Invalid`]
//! 3. header carries a `kid` → else [`TokenError::KeyMismatch`]
//! 4. `kid` is in the key set → else [`TokenError::KeyMismatch`]
//! 5. signature verifies with that key → else [`TokenError::Signature`]
//! 6. `exp >= now - leeway` → else [`TokenError::Expired`]
//!
//! The leeway is taken off "now", not added to the claim: with a 60s leeway a
//! token that expired 30s ago still passes, one that expired 90s ago does not.

use std::time::Duration;

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::jwk::Jwk;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::Deserialize;

use super::errors::TokenError;
use crate::hub::KeySet;

/// Clock skew tolerated past a token's expiry.
pub const DEFAULT_LEEWAY: Duration = Duration::from_secs(60);

/// Claims read from a ScanID. Everything else in the payload is ignored.
#[derive(Debug, Deserialize)]
struct ScanIdClaims {
    exp: i64,
}

/// Verifies ScanID tokens against a key set.
#[derive(Debug, Clone)]
pub struct TokenValidator {
    keys: KeySet,
    leeway: Duration,
}

impl TokenValidator {
    /// Create a validator with [`DEFAULT_LEEWAY`].
    pub fn new(keys: KeySet) -> Self {
        Self::with_leeway(keys, DEFAULT_LEEWAY)
    }

    /// Create a validator with a custom leeway.
    pub fn with_leeway(keys: KeySet, leeway: Duration) -> Self {
        Self { keys, leeway }
    }

    /// The key set tokens are checked against.
    pub fn keys(&self) -> &KeySet {
        &self.keys
    }

    /// The expiry leeway.
    pub fn leeway(&self) -> Duration {
        self.leeway
    }

    /// Check `token` against the current time. `Ok(())` means usable.
    pub fn check_validity(&self, token: &str) -> Result<(), TokenError> {
        self.check_validity_at(token, Utc::now().timestamp())
    }

    /// Check `token` against `now` (Unix seconds).
    ///
    /// Prefer [`check_validity`](Self::check_validity) outside of tests.
    pub fn check_validity_at(&self, token: &str, now: i64) -> Result<(), TokenError> {
        let result = self.verify(token, now);
        if let Err(ref err) = result {
            tracing::debug!(target: "hubscan.validator", reason = %err, "token rejected");
        }
        result
    }

    fn verify(&self, token: &str, now: i64) -> Result<(), TokenError> {
        if token.is_empty() {
            return Err(TokenError::Empty);
        }

        let header = decode_header(token).map_err(|e| TokenError::Invalid(e.to_string()))?;

        let kid = header
            .kid
            .as_deref()
            .filter(|kid| !kid.is_empty())
            .ok_or(TokenError::KeyMismatch)?;
        let jwk = self.keys.find(kid).ok_or(TokenError::KeyMismatch)?;

        ensure_algorithm_allowed(jwk, header.alg)?;
        let key = DecodingKey::from_jwk(jwk).map_err(|e| TokenError::Signature(e.to_string()))?;

        // Expiry is checked below with our own leeway rule.
        let mut validation = Validation::new(header.alg);
        validation.validate_exp = false;
        validation.validate_aud = false;

        let data = decode::<ScanIdClaims>(token, &key, &validation).map_err(classify)?;

        let leeway = i64::try_from(self.leeway.as_secs()).unwrap_or(i64::MAX);
        if data.claims.exp < now.saturating_sub(leeway) {
            return Err(TokenError::Expired {
                expired_at: DateTime::<Utc>::from_timestamp(data.claims.exp, 0)
                    .unwrap_or_default(),
            });
        }

        Ok(())
    }
}

/// Reject a header algorithm the key does not declare.
fn ensure_algorithm_allowed(jwk: &Jwk, alg: Algorithm) -> Result<(), TokenError> {
    let Some(declared) = jwk.common.key_algorithm.as_ref() else {
        return Ok(());
    };
    // Both enums serialize to their JOSE names ("ES256", ...).
    let declared = serde_json::to_value(declared).ok();
    let requested = serde_json::to_value(alg).ok();
    if declared.is_some() && declared == requested {
        Ok(())
    } else {
        Err(TokenError::Signature(format!(
            "algorithm {:?} not allowed for this key",
            alg
        )))
    }
}

fn classify(err: jsonwebtoken::errors::Error) -> TokenError {
    match err.kind() {
        ErrorKind::InvalidSignature
        | ErrorKind::InvalidAlgorithm
        | ErrorKind::InvalidEcdsaKey
        | ErrorKind::InvalidKeyFormat
        | ErrorKind::InvalidRsaKey(_) => TokenError::Signature(err.to_string()),
        _ => TokenError::Invalid(err.to_string()),
    }
}
