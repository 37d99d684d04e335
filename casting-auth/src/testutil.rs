//! Test helpers for code that depends on token verification.
//!
//! Provides fixed RSA key pairs with their JWKS documents, a builder for
//! signed tokens, raw token forgery for attack cases and an in-memory
//! [`KeySource`]. Gated behind the `testutil` feature so none of it ends up
//! in production builds:
//!
//! ```toml
//! [dev-dependencies]
//! casting-auth = { path = "../casting-auth", features = ["testutil"] }
//! ```

use crate::error::AuthError;
use crate::keys::{KeySet, KeySource};
use crate::settings::AuthSettings;
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use http::header::AUTHORIZATION;
use http::{HeaderMap, HeaderValue};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde_json::{Map, Value, json};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

pub const PRIMARY_KID: &str = "agency-key-1";
pub const SECONDARY_KID: &str = "agency-key-2";
pub const TEST_DOMAIN: &str = "idp.example";
pub const TEST_ISSUER: &str = "https://idp.example/";
pub const TEST_AUDIENCE: &str = "agency-api";
pub const TEST_SUBJECT: &str = "auth0|casting-assistant";

const PRIMARY_PEM: &str = include_str!("../fixtures/primary_rsa.pem");
const SECONDARY_PEM: &str = include_str!("../fixtures/secondary_rsa.pem");
const PRIMARY_JWKS: &str = include_str!("../fixtures/jwks.json");
const ROTATED_JWKS: &str = include_str!("../fixtures/jwks_rotated.json");

/// JWKS publishing the primary key under [`PRIMARY_KID`].
pub fn primary_jwks() -> Value {
    serde_json::from_str(PRIMARY_JWKS).expect("primary JWKS fixture is valid JSON")
}

/// JWKS after rotation: only the secondary key, under [`SECONDARY_KID`].
pub fn rotated_jwks() -> Value {
    serde_json::from_str(ROTATED_JWKS).expect("rotated JWKS fixture is valid JSON")
}

/// Settings matching the defaults of [`TokenBuilder`].
pub fn test_settings() -> AuthSettings {
    AuthSettings::new(TEST_DOMAIN, TEST_AUDIENCE).expect("test settings are valid")
}

/// Headers carrying `Authorization: Bearer <token>`.
pub fn bearer_headers(token: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {token}")).expect("token is a valid header value"),
    );
    headers
}

/// Private key a test token is signed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestKey {
    Primary,
    Secondary,
}

impl TestKey {
    fn encoding_key(self) -> EncodingKey {
        let pem = match self {
            Self::Primary => PRIMARY_PEM,
            Self::Secondary => SECONDARY_PEM,
        };
        EncodingKey::from_rsa_pem(pem.as_bytes()).expect("fixture key is a valid RSA PEM")
    }
}

/// Builds tokens that pass verification against [`test_settings`] unless
/// told otherwise.
///
/// Defaults: issuer [`TEST_ISSUER`], audience [`TEST_AUDIENCE`], subject
/// [`TEST_SUBJECT`], issued now, expiring in one hour, key id
/// [`PRIMARY_KID`], signed with the primary key using RS256 and no
/// permissions claim.
#[derive(Debug, Clone)]
pub struct TokenBuilder {
    claims: Map<String, Value>,
    kid: Option<String>,
    key: TestKey,
    algorithm: Algorithm,
}

impl Default for TokenBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenBuilder {
    pub fn new() -> Self {
        let now = Utc::now().timestamp();
        let mut claims = Map::new();
        claims.insert("iss".into(), json!(TEST_ISSUER));
        claims.insert("sub".into(), json!(TEST_SUBJECT));
        claims.insert("aud".into(), json!(TEST_AUDIENCE));
        claims.insert("iat".into(), json!(now));
        claims.insert("exp".into(), json!(now + 3600));
        Self {
            claims,
            kid: Some(PRIMARY_KID.to_string()),
            key: TestKey::Primary,
            algorithm: Algorithm::RS256,
        }
    }

    pub fn permissions(self, permissions: &[&str]) -> Self {
        self.claim("permissions", json!(permissions))
    }

    pub fn subject(self, subject: &str) -> Self {
        self.claim("sub", json!(subject))
    }

    pub fn issuer(self, issuer: &str) -> Self {
        self.claim("iss", json!(issuer))
    }

    /// Sets `aud` to any JSON value, e.g. a string or a list of strings.
    pub fn audience(self, audience: Value) -> Self {
        self.claim("aud", audience)
    }

    pub fn expires_at(self, timestamp: i64) -> Self {
        self.claim("exp", json!(timestamp))
    }

    pub fn claim(mut self, name: &str, value: Value) -> Self {
        self.claims.insert(name.to_string(), value);
        self
    }

    pub fn without_claim(mut self, name: &str) -> Self {
        self.claims.remove(name);
        self
    }

    pub fn kid(mut self, kid: Option<&str>) -> Self {
        self.kid = kid.map(str::to_string);
        self
    }

    pub fn signed_with(mut self, key: TestKey) -> Self {
        self.key = key;
        self
    }

    /// Algorithm for the header and the signature; must be an RSA one.
    pub fn algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Signs the token with the selected RSA key.
    pub fn build(&self) -> String {
        let mut header = Header::new(self.algorithm);
        header.kid = self.kid.clone();
        jsonwebtoken::encode(&header, &self.claims, &self.key.encoding_key())
            .expect("Failed to encode test token")
    }

    /// Produces an `alg: none` token with an empty signature segment.
    pub fn build_unsigned(&self) -> String {
        let header = json!({ "alg": "none", "typ": "JWT", "kid": self.kid });
        format!("{}.", self.unsigned_prefix(&header))
    }

    /// Signs the token with HS256 using `secret`, as an attacker would when
    /// passing a public key off as a shared secret.
    pub fn build_hs256(&self, secret: &[u8]) -> String {
        let mut header = Header::new(Algorithm::HS256);
        header.kid = self.kid.clone();
        jsonwebtoken::encode(&header, &self.claims, &EncodingKey::from_secret(secret))
            .expect("Failed to encode HS256 test token")
    }

    /// Encodes an arbitrary header with the payload and a garbage signature.
    pub fn build_with_raw_header(&self, header: &Value) -> String {
        format!(
            "{}.{}",
            self.unsigned_prefix(header),
            URL_SAFE_NO_PAD.encode(b"not-a-signature")
        )
    }

    fn unsigned_prefix(&self, header: &Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(header.to_string());
        let payload = URL_SAFE_NO_PAD.encode(Value::Object(self.claims.clone()).to_string());
        format!("{header}.{payload}")
    }
}

/// In-memory [`KeySource`] serving a replaceable JWKS document.
pub struct StaticKeySource {
    document: Mutex<Option<Value>>,
    fetches: AtomicUsize,
    delay: Option<Duration>,
}

impl StaticKeySource {
    pub fn new(document: Value) -> Self {
        Self {
            document: Mutex::new(Some(document)),
            fetches: AtomicUsize::new(0),
            delay: None,
        }
    }

    /// A source whose every fetch fails until a document is supplied.
    pub fn failing() -> Self {
        Self {
            document: Mutex::new(None),
            fetches: AtomicUsize::new(0),
            delay: None,
        }
    }

    /// Delays every fetch, for timeout tests.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Serves `document` from the next fetch on.
    pub fn replace(&self, document: Value) {
        *self.document.lock().unwrap_or_else(PoisonError::into_inner) = Some(document);
    }

    /// Fails every fetch until a document is supplied again.
    pub fn clear(&self) {
        *self.document.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Number of fetch attempts so far, failed ones included.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KeySource for StaticKeySource {
    async fn fetch(&self) -> Result<KeySet, AuthError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let document = self
            .document
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        match document {
            Some(document) => KeySet::from_jwks(document.to_string().as_bytes()),
            None => Err(AuthError::key_set_unavailable()),
        }
    }
}
