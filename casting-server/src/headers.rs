use axum::extract::Request;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
};
use http::{Method, StatusCode};
use log::warn;

/// Cross-origin headers attached to responses
#[derive(Debug, Clone)]
pub struct CorsHeaders {
    allow_origin: HeaderValue,
    allow_headers: Vec<&'static str>,
    allow_methods: Vec<Method>,
}

impl Default for CorsHeaders {
    fn default() -> Self {
        Self {
            allow_origin: HeaderValue::from_static("*"),
            allow_headers: Vec::new(),
            allow_methods: Vec::new(),
        }
    }
}

impl CorsHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the request headers a browser may send
    pub fn allow_headers(mut self, headers: &[&'static str]) -> Self {
        self.allow_headers = headers.to_vec();
        self
    }

    /// Set the methods a browser may use
    pub fn allow_methods(mut self, methods: &[Method]) -> Self {
        self.allow_methods = methods.to_vec();
        self
    }

    fn joined(parts: impl Iterator<Item = String>) -> HeaderValue {
        let value = parts.collect::<Vec<_>>().join(", ");
        HeaderValue::from_str(&value).unwrap_or_else(|e| {
            warn!("failed to build CORS header value {value:?}: {e}");
            HeaderValue::from_static("")
        })
    }

    /// Apply headers to a response
    pub fn apply<B>(&self, response: &mut Response<B>) {
        let headers = response.headers_mut();
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, self.allow_origin.clone());
        headers.insert(
            ACCESS_CONTROL_ALLOW_HEADERS,
            Self::joined(self.allow_headers.iter().map(|h| h.to_string())),
        );
        headers.insert(
            ACCESS_CONTROL_ALLOW_METHODS,
            Self::joined(self.allow_methods.iter().map(|m| m.to_string())),
        );
    }
}

pub mod presets {
    use super::*;

    /// Headers the agency's browser clients expect on every response
    pub fn agency() -> CorsHeaders {
        CorsHeaders::new()
            .allow_headers(&["Content-Type", "Authorization", "true"])
            .allow_methods(&[
                Method::GET,
                Method::PATCH,
                Method::POST,
                Method::DELETE,
                Method::OPTIONS,
            ])
    }
}

/// Adds CORS headers to every response and answers preflight requests
/// before they reach routing or authorization.
pub(crate) async fn cors_middleware(request: Request, next: Next) -> Response {
    let cors = presets::agency();
    let mut response = if request.method() == Method::OPTIONS {
        StatusCode::OK.into_response()
    } else {
        next.run(request).await
    };
    cors.apply(&mut response);
    response
}
