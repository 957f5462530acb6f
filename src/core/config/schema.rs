//! core::config::schema
//!
//! Schema of the optional `<config-dir>/scan/auth.toml` file.
//!
//! # Validation
//!
//! Values are validated after parsing: URLs must be http(s), the leeway is
//! capped, and request timeouts must be positive and bounded.

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::hub::HubInstance;

/// Largest accepted expiry leeway, in seconds.
pub const MAX_LEEWAY_SECS: u64 = 600;

/// Largest accepted request timeout, in seconds.
pub const MAX_REQUEST_TIMEOUT_SECS: u64 = 300;

/// Overrides read from `auth.toml`.
///
/// # Example
///
/// ```toml
/// instance = "staging"
/// hub_url = "https://hub-stage.docker.com"
/// jwks_url = "https://jwt-stage.docker.com/scan/.well-known/jwks.json"
/// leeway_secs = 60
/// request_timeout_secs = 30
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct AuthFileConfig {
    /// Hub instance (`prod` or `staging`)
    pub instance: Option<HubInstance>,

    /// Hub API base URL, overriding the instance default
    pub hub_url: Option<String>,

    /// JWKS URL, overriding the instance default
    pub jwks_url: Option<String>,

    /// Expiry leeway in seconds
    pub leeway_secs: Option<u64>,

    /// Per-request timeout in seconds
    pub request_timeout_secs: Option<u64>,
}

impl AuthFileConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is out of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(url) = &self.hub_url {
            validate_url("hub_url", url)?;
        }
        if let Some(url) = &self.jwks_url {
            validate_url("jwks_url", url)?;
        }

        if let Some(leeway) = self.leeway_secs {
            if leeway > MAX_LEEWAY_SECS {
                return Err(ConfigError::InvalidValue(format!(
                    "leeway_secs must be at most {}, got {}",
                    MAX_LEEWAY_SECS, leeway
                )));
            }
        }

        if let Some(timeout) = self.request_timeout_secs {
            if timeout == 0 || timeout > MAX_REQUEST_TIMEOUT_SECS {
                return Err(ConfigError::InvalidValue(format!(
                    "request_timeout_secs must be between 1 and {}, got {}",
                    MAX_REQUEST_TIMEOUT_SECS, timeout
                )));
            }
        }

        Ok(())
    }
}

fn validate_url(field: &str, url: &str) -> Result<(), ConfigError> {
    let valid = (url.starts_with("https://") || url.starts_with("http://"))
        && url.split("://").nth(1).is_some_and(|rest| !rest.is_empty());
    if valid {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue(format!(
            "{} must be an http(s) URL, got '{}'",
            field, url
        )))
    }
}
