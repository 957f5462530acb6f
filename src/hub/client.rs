//! hub::client
//!
//! HTTP client for the two Hub calls behind a ScanID.
//!
//! # Negotiation
//!
//! 1. `POST /v2/users/login` with the registry credentials as JSON; the
//!    answer carries a short-lived bearer token in its `token` field.
//! 2. `GET /api/scan/v1/provider/token` with `Authorization: Bearer <token>`;
//!    the body, verbatim, is the signed ScanID.
//!
//! Keeping the two steps apart means the long-lived registry credential is
//! only ever sent to the login endpoint.
//!
//! # Example
//!
//! ```ignore
//! use hubscan::auth::Identity;
//! use hubscan::hub::{HubApi, HubClient, HubInstance};
//!
//! let client = HubClient::new(HubInstance::Production.hub_url(), reqwest::Client::new());
//! let bearer = client.login(&Identity::new("alice", "secret")).await?;
//! let scan_id = client.negotiate_scan_id(&bearer).await?;
//! ```

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::instance::{LOGIN_PATH, SCAN_TOKEN_PATH};
use super::HubApi;
use crate::auth::Identity;

/// User-Agent header for Hub and JWKS requests.
pub const CLIENT_USER_AGENT: &str = concat!("hubscan/", env!("CARGO_PKG_VERSION"));

/// Errors from Hub calls.
///
/// Messages never include the credential or any token.
#[derive(Debug, Error)]
pub enum HubError {
    /// The request could not be sent or the body could not be read.
    #[error("network error: {0}")]
    Network(String),

    /// Hub answered with something other than 200.
    #[error("bad status code \"{status}\"")]
    Status {
        /// Raw status line, e.g. `401 Unauthorized`.
        status: String,
        /// Numeric status code.
        code: u16,
    },

    /// Hub answered 200 with a body that is not what the endpoint returns.
    #[error("unexpected response from Hub: {0}")]
    MalformedResponse(String),
}

impl HubError {
    /// True when Hub rejected the credential itself.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, HubError::Status { code, .. } if *code == 401 || *code == 403)
    }

    /// True for failures a later retry might not see.
    pub fn is_transient(&self) -> bool {
        matches!(self, HubError::Network(_))
            || matches!(self, HubError::Status { code, .. } if *code >= 500)
    }
}

impl From<reqwest::Error> for HubError {
    fn from(err: reqwest::Error) -> Self {
        HubError::Network(err.without_url().to_string())
    }
}

/// Login request body.
#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

/// Login response body.
#[derive(Deserialize)]
struct LoginResponse {
    token: String,
}

/// Client for the Hub login and ScanID endpoints.
#[derive(Debug, Clone)]
pub struct HubClient {
    /// HTTP client.
    client: Client,

    /// Base URL of the Hub API, without trailing slash.
    base_url: String,
}

impl HubClient {
    /// Create a client for the Hub at `base_url`.
    pub fn new(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    /// Base URL this client talks to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn login_url(&self) -> String {
        format!("{}{}", self.base_url, LOGIN_PATH)
    }

    fn scan_token_url(&self) -> String {
        format!("{}{}", self.base_url, SCAN_TOKEN_PATH)
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            reqwest::header::USER_AGENT,
            HeaderValue::from_static(CLIENT_USER_AGENT),
        );
        headers
    }

    /// Fail on anything but 200, keeping the raw status line for diagnostics.
    fn check_status(response: &Response) -> Result<(), HubError> {
        let status = response.status();
        if status == reqwest::StatusCode::OK {
            return Ok(());
        }
        let line = match status.canonical_reason() {
            Some(reason) => format!("{} {}", status.as_u16(), reason),
            None => status.as_u16().to_string(),
        };
        Err(HubError::Status {
            status: line,
            code: status.as_u16(),
        })
    }
}

#[async_trait::async_trait]
impl HubApi for HubClient {
    async fn login(&self, identity: &Identity) -> Result<SecretString, HubError> {
        tracing::debug!(target: "hubscan.hub", username = identity.username(), "logging in to Hub");

        let request = LoginRequest {
            username: identity.username(),
            password: identity.expose_secret(),
        };

        let response = self
            .client
            .post(self.login_url())
            .headers(self.headers())
            .header(CONTENT_TYPE, "application/json")
            .json(&request)
            .send()
            .await?;

        Self::check_status(&response)?;
        let body = response.text().await?;

        let parsed: LoginResponse = serde_json::from_str(&body)
            .map_err(|e| HubError::MalformedResponse(format!("invalid login response: {}", e)))?;
        if parsed.token.is_empty() {
            return Err(HubError::MalformedResponse(
                "login response carries no token".to_string(),
            ));
        }

        Ok(SecretString::from(parsed.token))
    }

    async fn negotiate_scan_id(&self, bearer: &SecretString) -> Result<String, HubError> {
        tracing::debug!(target: "hubscan.hub", "requesting ScanID");

        let response = self
            .client
            .get(self.scan_token_url())
            .headers(self.headers())
            .header(AUTHORIZATION, format!("Bearer {}", bearer.expose_secret()))
            .send()
            .await?;

        Self::check_status(&response)?;
        let token = response.text().await?;

        if token.is_empty() {
            return Err(HubError::MalformedResponse(
                "empty ScanID response".to_string(),
            ));
        }
        Ok(token)
    }
}
