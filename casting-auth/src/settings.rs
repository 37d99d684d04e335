use crate::error::SettingsError;
use jsonwebtoken::Algorithm;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

const WELL_KNOWN_JWKS_PATH: &str = ".well-known/jwks.json";

/// Largest accepted clock-skew leeway, in seconds.
pub const MAX_LEEWAY_SECS: u64 = 300;

/// Validated settings for token verification and key resolution.
#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub(crate) key_set_url: Url,
    pub(crate) required_issuer: String,
    pub(crate) required_audience: String,
    pub(crate) algorithm: Algorithm,
    pub(crate) leeway_secs: u64,
    pub(crate) key_cache_ttl: Option<Duration>,
    pub(crate) key_fetch_timeout: Duration,
}

impl AuthSettings {
    /// Creates settings for the given identity provider and API audience.
    ///
    /// The provider domain may be a bare host (`tenant.idp.example`) or a full
    /// origin (`http://127.0.0.1:8080`). The issuer defaults to the provider
    /// origin with a trailing slash and the algorithm to RS256.
    pub fn new(
        provider_domain: impl AsRef<str>,
        required_audience: impl Into<String>,
    ) -> Result<Self, SettingsError> {
        let domain = provider_domain.as_ref().trim();
        if domain.is_empty() {
            return Err(SettingsError::Missing("provider_domain"));
        }
        let required_audience = required_audience.into();
        if required_audience.is_empty() {
            return Err(SettingsError::Missing("required_audience"));
        }

        let origin = provider_origin(domain)?;
        Ok(Self {
            key_set_url: origin.join(WELL_KNOWN_JWKS_PATH)?,
            required_issuer: origin.to_string(),
            required_audience,
            algorithm: Algorithm::RS256,
            leeway_secs: 0,
            key_cache_ttl: None,
            key_fetch_timeout: Duration::from_secs(5),
        })
    }

    /// Overrides the issuer the tokens must carry.
    pub fn with_required_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.required_issuer = issuer.into();
        self
    }

    /// Pins the signing algorithm by its JOSE name, e.g. `RS256` or `ES256`.
    pub fn with_algorithm(mut self, name: &str) -> Result<Self, SettingsError> {
        self.algorithm = parse_pinned_algorithm(name)?;
        Ok(self)
    }

    /// Sets the tolerated clock skew, at most [`MAX_LEEWAY_SECS`].
    pub fn with_leeway(mut self, leeway_secs: u64) -> Result<Self, SettingsError> {
        if leeway_secs > MAX_LEEWAY_SECS {
            return Err(SettingsError::LeewayTooLarge(leeway_secs));
        }
        self.leeway_secs = leeway_secs;
        Ok(self)
    }

    /// Sets how long a fetched key set is trusted. `None` keeps it for the
    /// process lifetime, only refreshing on rotation.
    pub fn with_key_cache_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.key_cache_ttl = ttl;
        self
    }

    pub fn with_key_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.key_fetch_timeout = timeout;
        self
    }

    /// Replaces the well-known key set URL derived from the provider domain.
    pub fn with_key_set_url(mut self, url: &str) -> Result<Self, SettingsError> {
        self.key_set_url = Url::parse(url)?;
        Ok(self)
    }

    pub fn key_set_url(&self) -> &Url {
        &self.key_set_url
    }

    pub fn required_issuer(&self) -> &str {
        &self.required_issuer
    }

    pub fn required_audience(&self) -> &str {
        &self.required_audience
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn leeway_secs(&self) -> u64 {
        self.leeway_secs
    }

    pub fn key_cache_ttl(&self) -> Option<Duration> {
        self.key_cache_ttl
    }

    pub fn key_fetch_timeout(&self) -> Duration {
        self.key_fetch_timeout
    }
}

fn provider_origin(domain: &str) -> Result<Url, SettingsError> {
    let mut origin = if domain.contains("://") {
        domain.to_string()
    } else {
        format!("https://{domain}")
    };
    if !origin.ends_with('/') {
        origin.push('/');
    }
    Ok(Url::parse(&origin)?)
}

fn parse_pinned_algorithm(name: &str) -> Result<Algorithm, SettingsError> {
    let algorithm = Algorithm::from_str(name.trim())
        .map_err(|_| SettingsError::UnknownAlgorithm(name.to_string()))?;
    match algorithm {
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => {
            Err(SettingsError::SymmetricAlgorithm(name.to_string()))
        }
        _ => Ok(algorithm),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_bare_domain() {
        let settings = AuthSettings::new("agency.idp.example", "agency-api").unwrap();
        assert_eq!(
            settings.key_set_url().as_str(),
            "https://agency.idp.example/.well-known/jwks.json"
        );
        assert_eq!(settings.required_issuer(), "https://agency.idp.example/");
        assert_eq!(settings.algorithm(), Algorithm::RS256);
        assert_eq!(settings.leeway_secs(), 0);
        assert!(settings.key_cache_ttl().is_none());
    }

    #[test]
    fn test_domain_with_scheme_is_kept() {
        let settings = AuthSettings::new("http://127.0.0.1:9000", "agency-api").unwrap();
        assert_eq!(
            settings.key_set_url().as_str(),
            "http://127.0.0.1:9000/.well-known/jwks.json"
        );
        assert_eq!(settings.required_issuer(), "http://127.0.0.1:9000/");
    }

    #[test]
    fn test_symmetric_algorithm_rejected() {
        let result = AuthSettings::new("idp.example", "api")
            .unwrap()
            .with_algorithm("HS256");
        assert!(matches!(result, Err(SettingsError::SymmetricAlgorithm(_))));
    }

    #[test]
    fn test_unknown_algorithm_rejected() {
        let result = AuthSettings::new("idp.example", "api")
            .unwrap()
            .with_algorithm("none");
        assert!(matches!(result, Err(SettingsError::UnknownAlgorithm(_))));
    }

    #[test]
    fn test_leeway_is_bounded() {
        let settings = AuthSettings::new("idp.example", "api").unwrap();
        assert_eq!(
            settings
                .clone()
                .with_leeway(MAX_LEEWAY_SECS)
                .unwrap()
                .leeway_secs(),
            MAX_LEEWAY_SECS
        );
        assert!(matches!(
            settings.with_leeway(u64::MAX),
            Err(SettingsError::LeewayTooLarge(u64::MAX))
        ));
    }

    #[test]
    fn test_es256_can_be_pinned() {
        let settings = AuthSettings::new("idp.example", "api")
            .unwrap()
            .with_algorithm("ES256")
            .unwrap();
        assert_eq!(settings.algorithm(), Algorithm::ES256);
    }

    #[test]
    fn test_missing_values() {
        assert!(matches!(
            AuthSettings::new("", "api"),
            Err(SettingsError::Missing("provider_domain"))
        ));
        assert!(matches!(
            AuthSettings::new("idp.example", ""),
            Err(SettingsError::Missing("required_audience"))
        ));
    }
}
