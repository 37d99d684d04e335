use crate::claims::DecodedClaims;
use crate::error::{AuthError, SettingsError};
use crate::keys::{HttpKeySource, KeyResolver};
use crate::permissions::enforce;
use crate::settings::AuthSettings;
use crate::verifier::{TokenVerifier, extract_bearer};
use http::HeaderMap;
use log::{debug, warn};
use std::sync::Arc;

/// Single entry point for protecting an operation.
///
/// Runs header extraction, token verification and permission enforcement in
/// order and returns the verified claims only when all three pass. Cloning is
/// cheap and all clones share the same key cache.
#[derive(Debug, Clone)]
pub struct AuthorizationGate {
    verifier: TokenVerifier,
}

impl AuthorizationGate {
    pub fn new(verifier: TokenVerifier) -> Self {
        Self { verifier }
    }

    /// Builds a gate that reads keys from the provider's JWKS endpoint.
    pub fn from_settings(settings: AuthSettings) -> Result<Self, SettingsError> {
        let source = HttpKeySource::from_settings(&settings)?;
        let resolver = KeyResolver::from_settings(Arc::new(source), &settings);
        Ok(Self::new(TokenVerifier::new(resolver, settings)))
    }

    pub fn verifier(&self) -> &TokenVerifier {
        &self.verifier
    }

    pub fn resolver(&self) -> &KeyResolver {
        self.verifier.resolver()
    }

    /// Authorizes a request for `required_permission`.
    ///
    /// On failure nothing about the request has been acted upon, and the
    /// error carries the kind and description to answer with.
    pub async fn authorize(
        &self,
        headers: &HeaderMap,
        required_permission: &str,
    ) -> Result<DecodedClaims, AuthError> {
        match self.check(headers, required_permission).await {
            Ok(claims) => {
                debug!(
                    "Authorized {} for permission {required_permission}",
                    claims.subject()
                );
                Ok(claims)
            }
            Err(e) => {
                warn!(
                    "Denied request for permission {required_permission}: {} ({})",
                    e.code(),
                    e.description()
                );
                Err(e)
            }
        }
    }

    async fn check(
        &self,
        headers: &HeaderMap,
        required_permission: &str,
    ) -> Result<DecodedClaims, AuthError> {
        let token = extract_bearer(headers)?;
        let claims = self.verifier.verify(&token).await?;
        enforce(&claims, required_permission)?;
        Ok(claims)
    }
}
