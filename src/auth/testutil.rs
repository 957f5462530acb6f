//! Signed ScanID fixtures for unit tests.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use ring::rand::SystemRandom;
use ring::signature::{EcdsaKeyPair, KeyPair, ECDSA_P256_SHA256_FIXED_SIGNING};
use serde_json::{json, Value};

use crate::hub::KeySet;

/// A fresh ES256 key pair that mints tokens and publishes its JWK.
pub(crate) struct TestSigner {
    pkcs8: Vec<u8>,
    x: String,
    y: String,
}

impl TestSigner {
    pub(crate) fn generate() -> Self {
        let rng = SystemRandom::new();
        let pkcs8 = EcdsaKeyPair::generate_pkcs8(&ECDSA_P256_SHA256_FIXED_SIGNING, &rng)
            .expect("generate P-256 key");
        let pair = EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_FIXED_SIGNING, pkcs8.as_ref(), &rng)
            .expect("load P-256 key");

        // Uncompressed point: 0x04 || x || y
        let point = pair.public_key().as_ref();
        Self {
            pkcs8: pkcs8.as_ref().to_vec(),
            x: URL_SAFE_NO_PAD.encode(&point[1..33]),
            y: URL_SAFE_NO_PAD.encode(&point[33..65]),
        }
    }

    pub(crate) fn jwk(&self, kid: &str) -> Value {
        json!({
            "use": "sig",
            "kty": "EC",
            "kid": kid,
            "crv": "P-256",
            "alg": "ES256",
            "x": self.x,
            "y": self.y,
        })
    }

    pub(crate) fn key_set(&self, kid: &str) -> KeySet {
        KeySet::from_json(&json!({ "keys": [self.jwk(kid)] }).to_string()).expect("key set")
    }

    pub(crate) fn sign(&self, kid: Option<&str>, iat: i64, exp: i64) -> String {
        self.sign_claims(kid, &json!({ "iat": iat, "exp": exp }))
    }

    pub(crate) fn sign_claims(&self, kid: Option<&str>, claims: &Value) -> String {
        let mut header = Header::new(Algorithm::ES256);
        header.kid = kid.map(str::to_string);
        encode(&header, claims, &EncodingKey::from_ec_der(&self.pkcs8)).expect("sign token")
    }
}
