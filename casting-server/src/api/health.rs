use crate::openapi::HEALTH_TAG;
use crate::state::AppState;
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use log::warn;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Readiness of the service to verify tokens
#[derive(Debug, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct Health {
    success: bool,
    status: String,
    /// Number of signing keys currently usable for verification
    #[serde(default, skip_serializing_if = "Option::is_none")]
    signing_keys: Option<usize>,
    /// Reason the service is not ready
    #[serde(default, skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

impl IntoResponse for Health {
    fn into_response(self) -> Response {
        let status_code = if self.success {
            StatusCode::OK
        } else {
            StatusCode::SERVICE_UNAVAILABLE
        };
        (status_code, Json(self)).into_response()
    }
}

/// Reports whether the identity provider's signing keys are available
#[utoipa::path(
    get,
    path = "/health",
    tag = HEALTH_TAG,
    responses(
        (status = 200, description = "Signing keys are loaded", body = Health),
        (status = 503, description = "Signing keys cannot be fetched", body = Health)
    )
)]
pub(crate) async fn health_check(State(state): State<AppState>) -> Health {
    match state.gate.resolver().prefetch().await {
        Ok(count) => Health {
            success: true,
            status: "ok".to_string(),
            signing_keys: Some(count),
            message: None,
        },
        Err(err) => {
            warn!("Health check failed: {err}");
            Health {
                success: false,
                status: "error".to_string(),
                signing_keys: None,
                message: Some(err.description().to_string()),
            }
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
