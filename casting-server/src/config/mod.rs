use crate::config::auth::AuthConfig;
use confique::Config;

pub mod auth;

/// Optional configuration file read from the working directory
const CONFIG_FILE: &str = "casting.toml";

/// Main configuration structure for the casting server
#[derive(Debug, Config, Clone)]
pub struct CastingConfig {
    /// The port the server listens on (default: 8080)
    #[config(env = "CASTING_PORT", default = 8080)]
    pub port: u16,

    /// Fetch the signing keys at startup instead of on the first request (default: true)
    #[config(env = "CASTING_PREFETCH_KEYS", default = true)]
    pub prefetch_keys: bool,

    /// Token validation configuration
    #[config(nested)]
    pub auth: AuthConfig,
}

impl CastingConfig {
    /// Loads the configuration from the environment, then `casting.toml`, then defaults
    pub fn load() -> Result<Self, confique::Error> {
        Self::builder().env().file(CONFIG_FILE).load()
    }
}
