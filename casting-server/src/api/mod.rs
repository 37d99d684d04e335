pub(crate) mod actors;
mod authn_middleware;
pub(crate) mod health;
pub(crate) mod movies;

use crate::state::AppState;
use axum::Router;

/// Combines all API routes into a single router
pub(super) fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(protected_routes(state))
}

/// Catalog routes, each method guarded by its own permission
fn protected_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(actors::router(state))
        .merge(movies::router(state))
}
