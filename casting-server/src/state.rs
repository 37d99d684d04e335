use crate::config::CastingConfig;
use crate::store::Catalog;
use casting_auth::{AuthorizationGate, SettingsError};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub gate: AuthorizationGate,
    pub catalog: Arc<Catalog>,
}

impl AppState {
    pub fn new(gate: AuthorizationGate, catalog: Catalog) -> Self {
        Self {
            gate,
            catalog: Arc::new(catalog),
        }
    }

    /// Builds the state with a gate reading keys from the configured provider
    pub fn from_config(config: &CastingConfig) -> Result<Self, SettingsError> {
        let settings = config.auth.to_settings()?;
        let gate = AuthorizationGate::from_settings(settings)?;
        Ok(Self::new(gate, Catalog::new()))
    }
}
