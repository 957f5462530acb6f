//! Shared fixtures for integration tests.
//!
//! Mints ES256 ScanIDs with a throwaway P-256 key and serves the matching
//! JWKS from a `wiremock` server.

#![allow(dead_code)]

use std::path::Path;
use std::time::Duration;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use ring::rand::SystemRandom;
use ring::signature::{EcdsaKeyPair, KeyPair, ECDSA_P256_SHA256_FIXED_SIGNING};
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use hubscan::core::config::Settings;
use hubscan::hub::{HubInstance, KeySet};

pub const KID: &str = "scan-signing-key";
pub const JWKS_PATH: &str = "/scan/.well-known/jwks.json";

pub struct TestSigner {
    pkcs8: Vec<u8>,
    x: String,
    y: String,
}

impl TestSigner {
    pub fn generate() -> Self {
        let rng = SystemRandom::new();
        let pkcs8 = EcdsaKeyPair::generate_pkcs8(&ECDSA_P256_SHA256_FIXED_SIGNING, &rng)
            .expect("generate P-256 key");
        let pair = EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_FIXED_SIGNING, pkcs8.as_ref(), &rng)
            .expect("load P-256 key");
        let point = pair.public_key().as_ref();
        Self {
            pkcs8: pkcs8.as_ref().to_vec(),
            x: URL_SAFE_NO_PAD.encode(&point[1..33]),
            y: URL_SAFE_NO_PAD.encode(&point[33..65]),
        }
    }

    pub fn jwks(&self) -> Value {
        json!({
            "keys": [{
                "use": "sig",
                "kty": "EC",
                "kid": KID,
                "crv": "P-256",
                "alg": "ES256",
                "x": self.x,
                "y": self.y,
            }]
        })
    }

    pub fn key_set(&self) -> KeySet {
        KeySet::from_json(&self.jwks().to_string()).expect("key set")
    }

    /// Token signed with this key, expiring `exp_offset` seconds from now.
    pub fn token(&self, exp_offset: i64) -> String {
        let now = chrono::Utc::now().timestamp();
        self.token_at(now, now + exp_offset)
    }

    pub fn token_at(&self, iat: i64, exp: i64) -> String {
        let mut header = Header::new(Algorithm::ES256);
        header.kid = Some(KID.to_string());
        encode(
            &header,
            &json!({ "iat": iat, "exp": exp, "sub": "scan" }),
            &EncodingKey::from_ec_der(&self.pkcs8),
        )
        .expect("sign token")
    }
}

/// Serve the signer's key set at [`JWKS_PATH`], expecting `calls` fetches.
pub async fn mount_jwks(server: &MockServer, signer: &TestSigner, calls: u64) {
    Mock::given(method("GET"))
        .and(path(JWKS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(signer.jwks()))
        .expect(calls)
        .mount(server)
        .await;
}

/// Settings pointing every endpoint at `server`, caching under `config_dir`.
pub fn settings_for(server: &MockServer, config_dir: &Path) -> Settings {
    Settings {
        instance: HubInstance::Production,
        hub_url: server.uri(),
        jwks_url: format!("{}{}", server.uri(), JWKS_PATH),
        tokens_path: config_dir.join("scan").join("tokens.json"),
        leeway: Duration::from_secs(60),
        request_timeout: Duration::from_secs(5),
    }
}

/// Write an `auth.toml` routing the CLI to `server`.
pub fn write_auth_config(server: &MockServer, config_dir: &Path) {
    let scan_dir = config_dir.join("scan");
    std::fs::create_dir_all(&scan_dir).expect("mkdir");
    std::fs::write(
        scan_dir.join("auth.toml"),
        format!(
            "hub_url = \"{}\"\njwks_url = \"{}{}\"\nrequest_timeout_secs = 5\n",
            server.uri(),
            server.uri(),
            JWKS_PATH
        ),
    )
    .expect("write auth.toml");
}

/// Read `scan/tokens.json` under `config_dir` as a JSON object.
pub fn read_tokens(config_dir: &Path) -> Value {
    let content =
        std::fs::read_to_string(config_dir.join("scan").join("tokens.json")).expect("read tokens");
    serde_json::from_str(&content).expect("tokens json")
}

/// Seed `scan/tokens.json` under `config_dir`.
pub fn write_tokens(config_dir: &Path, tokens: &Value) {
    let scan_dir = config_dir.join("scan");
    std::fs::create_dir_all(&scan_dir).expect("mkdir");
    std::fs::write(scan_dir.join("tokens.json"), tokens.to_string()).expect("write tokens");
}
