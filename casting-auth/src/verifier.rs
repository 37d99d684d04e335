//! Bearer token verification.
//!
//! Verification runs in a fixed order and stops at the first failure:
//! header extraction, structural decode, algorithm pinning, key lookup,
//! signature verification, then claim validation. Each stage fails with its
//! own [`AuthErrorKind`](crate::AuthErrorKind), so a signature problem is
//! never reported as a parse problem or the other way around.

use crate::claims::{DecodedClaims, RawToken, TokenPayload};
use crate::error::AuthError;
use crate::keys::{KeyResolver, SigningKey};
use crate::settings::AuthSettings;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use http::HeaderMap;
use http::header::AUTHORIZATION;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, Validation, decode};
use log::{debug, warn};
use serde::Deserialize;
use std::str::FromStr;
use std::sync::Arc;

/// Pulls the token out of an `Authorization: Bearer <token>` header.
pub fn extract_bearer(headers: &HeaderMap) -> Result<RawToken, AuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or_else(AuthError::missing_header)?
        .to_str()
        .map_err(|_| AuthError::not_bearer_token())?;

    let parts: Vec<&str> = value.split_whitespace().collect();
    match parts.as_slice() {
        [scheme, ..] if !scheme.eq_ignore_ascii_case("bearer") => Err(AuthError::wrong_scheme()),
        [] => Err(AuthError::wrong_scheme()),
        [_] => Err(AuthError::token_not_found()),
        [_, token] => Ok(RawToken::new(*token)),
        _ => Err(AuthError::not_bearer_token()),
    }
}

/// The JOSE header fields the verifier needs before trusting anything else.
#[derive(Debug, Deserialize)]
struct UnverifiedHeader {
    alg: String,
    #[serde(default)]
    kid: Option<String>,
}

/// Checks the three-segment shape and decodes the header segment.
fn decode_structure(token: &str) -> Result<UnverifiedHeader, AuthError> {
    let segments: Vec<&str> = token.split('.').collect();
    let [header, payload, signature] = segments.as_slice() else {
        return Err(AuthError::malformed_token());
    };
    if header.is_empty() || payload.is_empty() {
        return Err(AuthError::malformed_token());
    }
    // An empty signature is structurally fine; unsigned tokens are turned
    // away by algorithm pinning instead.
    for segment in [payload, signature] {
        URL_SAFE_NO_PAD
            .decode(segment)
            .map_err(|_| AuthError::malformed_token())?;
    }

    let header = URL_SAFE_NO_PAD
        .decode(header)
        .map_err(|_| AuthError::malformed_token())?;
    serde_json::from_slice(&header).map_err(|_| AuthError::malformed_token())
}

/// Verifies bearer tokens against the provider's key set and the configured
/// issuer, audience and algorithm.
#[derive(Debug, Clone)]
pub struct TokenVerifier {
    resolver: KeyResolver,
    settings: Arc<AuthSettings>,
}

impl TokenVerifier {
    pub fn new(resolver: KeyResolver, settings: AuthSettings) -> Self {
        Self {
            resolver,
            settings: Arc::new(settings),
        }
    }

    pub fn settings(&self) -> &AuthSettings {
        &self.settings
    }

    pub fn resolver(&self) -> &KeyResolver {
        &self.resolver
    }

    /// Verifies a token against the current time.
    pub async fn verify(&self, token: &RawToken) -> Result<DecodedClaims, AuthError> {
        self.verify_at(token, Utc::now().timestamp()).await
    }

    /// Verifies a token with `now` (seconds since the Unix epoch) as the
    /// single time reference for every time-based check.
    pub async fn verify_at(&self, token: &RawToken, now: i64) -> Result<DecodedClaims, AuthError> {
        let header = decode_structure(token.as_str())?;
        let algorithm = self.pin_algorithm(&header.alg)?;

        let key_id = header.kid.ok_or_else(|| {
            warn!("Rejected token without a key id");
            AuthError::unknown_key()
        })?;
        let key = self.resolver.resolve(&key_id).await?.ok_or_else(|| {
            warn!("Rejected token signed with unknown key id {key_id}");
            AuthError::unknown_key()
        })?;

        let payload = self.verify_signature(token, &key, algorithm)?;
        let claims = self.validate_claims(payload, now, algorithm, key_id)?;
        debug!(
            "Verified token for subject {} signed with key {}",
            claims.subject(),
            claims.key_id()
        );
        Ok(claims)
    }

    fn pin_algorithm(&self, declared: &str) -> Result<Algorithm, AuthError> {
        match Algorithm::from_str(declared) {
            Ok(algorithm) if algorithm == self.settings.algorithm => Ok(algorithm),
            _ => {
                warn!(
                    "Rejected token declaring algorithm {declared:?}, only {:?} is accepted",
                    self.settings.algorithm
                );
                Err(AuthError::unsupported_algorithm())
            }
        }
    }

    fn verify_signature(
        &self,
        token: &RawToken,
        key: &SigningKey,
        algorithm: Algorithm,
    ) -> Result<TokenPayload, AuthError> {
        if key.algorithm().is_some_and(|declared| declared != algorithm) {
            warn!(
                "Key {} is published for {:?}, not {:?}",
                key.key_id(),
                key.algorithm(),
                algorithm
            );
            return Err(AuthError::invalid_signature());
        }

        // Only the signature is checked here; claims are validated below
        // against a single clock reading.
        let mut validation = Validation::new(algorithm);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        decode::<TokenPayload>(token.as_str(), key.decoding_key(), &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::Base64(_) | ErrorKind::Json(_) | ErrorKind::Utf8(_) => {
                    AuthError::malformed_token()
                }
                ErrorKind::InvalidSignature => {
                    warn!("Rejected token with invalid signature for key {}", key.key_id());
                    AuthError::invalid_signature()
                }
                other => {
                    warn!("Rejected token during signature verification: {other:?}");
                    AuthError::invalid_signature()
                }
            })
    }

    fn validate_claims(
        &self,
        payload: TokenPayload,
        now: i64,
        algorithm: Algorithm,
        key_id: String,
    ) -> Result<DecodedClaims, AuthError> {
        let leeway = i64::try_from(self.settings.leeway_secs).unwrap_or(i64::MAX);

        let expires_at = payload.exp.ok_or_else(AuthError::missing_claim)?;
        if expires_at.saturating_add(leeway) <= now {
            return Err(AuthError::expired());
        }
        if payload.nbf.is_some_and(|nbf| nbf > now.saturating_add(leeway)) {
            return Err(AuthError::not_yet_valid());
        }

        let issuer = match payload.iss.as_deref() {
            Some(issuer) if issuer == self.settings.required_issuer => issuer.to_string(),
            _ => return Err(AuthError::wrong_issuer()),
        };
        let audience = match payload.aud.clone() {
            Some(audience) if audience.contains(&self.settings.required_audience) => audience,
            _ => return Err(AuthError::wrong_audience()),
        };
        let subject = match payload.sub.clone() {
            Some(subject) if !subject.is_empty() => subject,
            _ => return Err(AuthError::missing_claim()),
        };

        Ok(DecodedClaims::from_verified(
            payload, subject, issuer, audience, expires_at, algorithm, key_id,
        ))
    }
}
