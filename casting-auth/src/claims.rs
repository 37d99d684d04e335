use jsonwebtoken::Algorithm;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fmt;

/// The literal bearer string taken from an `Authorization` header.
///
/// Its `Debug` output is redacted so the token cannot leak into logs.
#[derive(Clone, PartialEq, Eq)]
pub struct RawToken(String);

impl RawToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for RawToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RawToken(<redacted>)")
    }
}

/// The `aud` claim, which may be a single value or a list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    Single(String),
    Many(Vec<String>),
}

impl Audience {
    /// Membership test; a token may target several audiences at once.
    pub fn contains(&self, audience: &str) -> bool {
        match self {
            Self::Single(value) => value == audience,
            Self::Many(values) => values.iter().any(|value| value == audience),
        }
    }

    fn into_vec(self) -> Vec<String> {
        match self {
            Self::Single(value) => vec![value],
            Self::Many(values) => values,
        }
    }
}

/// Payload of a token, as read after the signature checked out.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenPayload {
    #[serde(default)]
    pub(crate) sub: Option<String>,
    #[serde(default)]
    pub(crate) iss: Option<String>,
    #[serde(default)]
    pub(crate) aud: Option<Audience>,
    #[serde(default)]
    pub(crate) exp: Option<i64>,
    #[serde(default)]
    pub(crate) iat: Option<i64>,
    #[serde(default)]
    pub(crate) nbf: Option<i64>,
    #[serde(default)]
    pub(crate) permissions: Option<Vec<String>>,
}

/// Claims of a token that passed signature and claim validation.
///
/// Only the verifier can build this type. Holding a value means the token
/// was signed by a key from the provider's current key set and its issuer,
/// audience and lifetime were accepted. It belongs to a single request and
/// is never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedClaims {
    subject: String,
    permissions: BTreeSet<String>,
    issuer: String,
    audience: Vec<String>,
    expires_at: i64,
    issued_at: Option<i64>,
    algorithm: Algorithm,
    key_id: String,
}

impl DecodedClaims {
    pub(crate) fn from_verified(
        payload: TokenPayload,
        subject: String,
        issuer: String,
        audience: Audience,
        expires_at: i64,
        algorithm: Algorithm,
        key_id: String,
    ) -> Self {
        Self {
            subject,
            permissions: payload.permissions.unwrap_or_default().into_iter().collect(),
            issuer,
            audience: audience.into_vec(),
            expires_at,
            issued_at: payload.iat,
            algorithm,
            key_id,
        }
    }

    /// Caller identity (`sub`).
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Permissions granted by the token; empty when the claim was absent.
    pub fn permissions(&self) -> &BTreeSet<String> {
        &self.permissions
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn audience(&self) -> &[String] {
        &self.audience
    }

    /// Expiry as seconds since the Unix epoch.
    pub fn expires_at(&self) -> i64 {
        self.expires_at
    }

    pub fn issued_at(&self) -> Option<i64> {
        self.issued_at
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn key_id(&self) -> &str {
        &self.key_id
    }
}
