use crate::store::CatalogError;
use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::response::IntoResponse;
use casting_auth::AuthError;
use http::StatusCode;
use log::debug;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Body of every error response
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq)]
pub struct ErrorBody {
    /// Always `false`
    pub success: bool,
    /// HTTP status code
    pub error: u16,
    /// Human-readable reason
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct ApiError {
    pub message: String,
    pub status_code: StatusCode,
}

impl ApiError {
    /// Create a new ApiError with a message and status code
    pub fn new<S: ToString>(message: S, status_code: StatusCode) -> Self {
        Self {
            message: message.to_string(),
            status_code,
        }
    }

    /// Not Found (404)
    pub fn not_found() -> Self {
        Self::new("resource not found", StatusCode::NOT_FOUND)
    }

    /// Unprocessable Entity (422)
    pub fn unprocessable() -> Self {
        Self::new("unprocessable", StatusCode::UNPROCESSABLE_ENTITY)
    }
}

/// Every authorization failure is answered with 401, permission denials included.
impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        Self::new(err.description(), err.status_hint())
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        debug!("{err}");
        Self::not_found()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        debug!("Rejected request body: {}", rejection.body_text());
        Self::unprocessable()
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        debug!("Rejected path: {}", rejection.body_text());
        Self::not_found()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let body = ErrorBody {
            success: false,
            error: self.status_code.as_u16(),
            message: self.message,
        };
        (self.status_code, Json(body)).into_response()
    }
}

/// Fallback for unknown routes
pub(crate) async fn not_found_fallback() -> ApiError {
    ApiError::not_found()
}
