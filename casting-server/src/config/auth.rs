//! Token validation configuration

use casting_auth::{AuthSettings, SettingsError};
use confique::Config;
use std::time::Duration;

/// Identity provider and token validation configuration
#[derive(Debug, Config, Clone)]
pub struct AuthConfig {
    /// Identity provider domain, e.g. `tenant.idp.example` (required)
    #[config(env = "CASTING_AUTH_PROVIDER_DOMAIN")]
    pub provider_domain: String,

    /// Audience tokens must be issued for (required)
    #[config(env = "CASTING_AUTH_REQUIRED_AUDIENCE")]
    pub required_audience: String,

    /// Issuer tokens must carry (default: `https://<provider_domain>/`)
    #[config(env = "CASTING_AUTH_REQUIRED_ISSUER")]
    pub required_issuer: Option<String>,

    /// The only accepted signing algorithm (default: RS256)
    #[config(env = "CASTING_AUTH_REQUIRED_ALGORITHM", default = "RS256")]
    pub required_algorithm: String,

    /// Tolerated clock skew for expiry checks in seconds, at most 300 (default: 0)
    #[config(env = "CASTING_AUTH_CLOCK_SKEW_LEEWAY_SECONDS", default = 0)]
    pub clock_skew_leeway_seconds: u64,

    /// How long fetched signing keys are trusted in seconds
    /// (default: unset, keys are kept until rotation)
    #[config(env = "CASTING_AUTH_KEY_CACHE_TTL_SECONDS")]
    pub key_cache_ttl_seconds: Option<u64>,

    /// Timeout for fetching the signing keys in seconds (default: 5)
    #[config(env = "CASTING_AUTH_KEY_FETCH_TIMEOUT_SECONDS", default = 5)]
    pub key_fetch_timeout_seconds: u64,

    /// Override for the well-known JWKS URL
    #[config(env = "CASTING_AUTH_JWKS_URL")]
    pub jwks_url: Option<String>,
}

impl AuthConfig {
    /// Validates the configuration into core settings
    pub fn to_settings(&self) -> Result<AuthSettings, SettingsError> {
        let mut settings = AuthSettings::new(&self.provider_domain, self.required_audience.clone())?
            .with_algorithm(&self.required_algorithm)?
            .with_leeway(self.clock_skew_leeway_seconds)?
            .with_key_cache_ttl(self.key_cache_ttl_seconds.map(Duration::from_secs))
            .with_key_fetch_timeout(Duration::from_secs(self.key_fetch_timeout_seconds));

        if let Some(issuer) = &self.required_issuer {
            settings = settings.with_required_issuer(issuer.clone());
        }
        if let Some(url) = &self.jwks_url {
            settings = settings.with_key_set_url(url)?;
        }
        Ok(settings)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use casting_auth::Algorithm;

    pub(crate) fn auth_config(provider_domain: &str) -> AuthConfig {
        AuthConfig {
            provider_domain: provider_domain.to_string(),
            required_audience: "agency-api".to_string(),
            required_issuer: None,
            required_algorithm: "RS256".to_string(),
            clock_skew_leeway_seconds: 0,
            key_cache_ttl_seconds: None,
            key_fetch_timeout_seconds: 5,
            jwks_url: None,
        }
    }

    #[test]
    fn test_defaults_derive_from_provider_domain() {
        let settings = auth_config("tenant.idp.example").to_settings().unwrap();
        assert_eq!(settings.required_issuer(), "https://tenant.idp.example/");
        assert_eq!(
            settings.key_set_url().as_str(),
            "https://tenant.idp.example/.well-known/jwks.json"
        );
        assert_eq!(settings.algorithm(), Algorithm::RS256);
        assert_eq!(settings.key_fetch_timeout(), Duration::from_secs(5));
        assert!(settings.key_cache_ttl().is_none());
    }

    #[test]
    fn test_overrides_are_applied() {
        let config = AuthConfig {
            required_issuer: Some("https://login.agency.example/".to_string()),
            required_algorithm: "ES256".to_string(),
            clock_skew_leeway_seconds: 30,
            key_cache_ttl_seconds: Some(600),
            jwks_url: Some("https://keys.agency.example/jwks.json".to_string()),
            ..auth_config("tenant.idp.example")
        };
        let settings = config.to_settings().unwrap();
        assert_eq!(settings.required_issuer(), "https://login.agency.example/");
        assert_eq!(settings.algorithm(), Algorithm::ES256);
        assert_eq!(settings.leeway_secs(), 30);
        assert_eq!(settings.key_cache_ttl(), Some(Duration::from_secs(600)));
        assert_eq!(
            settings.key_set_url().as_str(),
            "https://keys.agency.example/jwks.json"
        );
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let symmetric = AuthConfig {
            required_algorithm: "HS256".to_string(),
            ..auth_config("tenant.idp.example")
        };
        assert!(matches!(
            symmetric.to_settings(),
            Err(SettingsError::SymmetricAlgorithm(_))
        ));

        let no_audience = AuthConfig {
            required_audience: String::new(),
            ..auth_config("tenant.idp.example")
        };
        assert!(matches!(
            no_audience.to_settings(),
            Err(SettingsError::Missing("required_audience"))
        ));

        let huge_leeway = AuthConfig {
            clock_skew_leeway_seconds: u64::MAX,
            ..auth_config("tenant.idp.example")
        };
        assert!(matches!(
            huge_leeway.to_settings(),
            Err(SettingsError::LeewayTooLarge(u64::MAX))
        ));

        let bad_url = AuthConfig {
            jwks_url: Some("not a url".to_string()),
            ..auth_config("tenant.idp.example")
        };
        assert!(matches!(
            bad_url.to_settings(),
            Err(SettingsError::InvalidUrl(_))
        ));
    }
}
