//! auth::identity
//!
//! Registry credentials supplied by the caller.
//!
//! An [`Identity`] is built by the CLI layer from registry login state and is
//! never persisted. The secret lives in a [`SecretString`] so it cannot be
//! printed by accident; `Debug` shows only the username.

use std::fmt;

use secrecy::{ExposeSecret, SecretString};

/// Registry username plus its opaque credential.
#[derive(Clone)]
pub struct Identity {
    username: String,
    secret: SecretString,
}

impl Identity {
    /// Create an identity from a username and credential.
    pub fn new(username: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            secret: SecretString::from(secret.into()),
        }
    }

    /// Registry username. Also the key of the local token map.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// The credential. Only the Hub client should expose it.
    pub fn secret(&self) -> &SecretString {
        &self.secret
    }

    /// True if no username is set, i.e. the user never logged in.
    pub fn is_anonymous(&self) -> bool {
        self.username.trim().is_empty()
    }

    pub(crate) fn expose_secret(&self) -> &str {
        self.secret.expose_secret()
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("username", &self.username)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}
