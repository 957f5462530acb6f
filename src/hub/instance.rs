//! hub::instance
//!
//! Hub deployments the scan token can be negotiated against.
//!
//! # Selection
//!
//! The instance is chosen once at startup, from `$DOCKER_SCAN_HUB_INSTANCE`
//! or the `instance` key of the auth config file, and then passed explicitly
//! to the Hub client and key-set resolver. Nothing here reads the environment
//! on its own.
//!
//! # Example
//!
//! ```
//! use hubscan::hub::HubInstance;
//!
//! let instance = HubInstance::from_name(Some("staging"));
//! assert_eq!(instance.hub_url(), "https://hub-stage.docker.com");
//!
//! // Unknown or missing names fall back to production.
//! assert_eq!(HubInstance::from_name(Some("qa")), HubInstance::Production);
//! assert_eq!(HubInstance::from_name(None), HubInstance::Production);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// Environment variable selecting the Hub instance.
pub const INSTANCE_ENV_VAR: &str = "DOCKER_SCAN_HUB_INSTANCE";

/// Path of the credential login endpoint.
pub const LOGIN_PATH: &str = "/v2/users/login";

/// Path of the ScanID issuance endpoint.
pub const SCAN_TOKEN_PATH: &str = "/api/scan/v1/provider/token";

/// A Hub deployment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HubInstance {
    /// hub.docker.com
    #[default]
    #[serde(alias = "prod")]
    Production,
    /// hub-stage.docker.com
    Staging,
}

impl HubInstance {
    /// Resolve an instance name. `staging` selects staging, everything else
    /// (including `prod`, unknown values, and no value) selects production.
    pub fn from_name(name: Option<&str>) -> Self {
        match name.map(str::trim) {
            Some("staging") => HubInstance::Staging,
            _ => HubInstance::Production,
        }
    }

    /// Base URL of the Hub API.
    pub fn hub_url(&self) -> &'static str {
        match self {
            HubInstance::Production => "https://hub.docker.com",
            HubInstance::Staging => "https://hub-stage.docker.com",
        }
    }

    /// URL of the JWKS document used to verify ScanID tokens.
    pub fn jwks_url(&self) -> &'static str {
        match self {
            HubInstance::Production => "https://jwt.docker.com/scan/.well-known/jwks.json",
            HubInstance::Staging => "https://jwt-stage.docker.com/scan/.well-known/jwks.json",
        }
    }

    /// Canonical name, as accepted by [`HubInstance::from_name`].
    pub fn name(&self) -> &'static str {
        match self {
            HubInstance::Production => "prod",
            HubInstance::Staging => "staging",
        }
    }
}

impl fmt::Display for HubInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
