use crate::errors::ApiError;
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::MethodRouter,
};
use casting_auth::AuthorizationGate;

/// Permission a route requires, together with the gate that checks it
#[derive(Clone)]
pub(crate) struct PermissionGuard {
    gate: AuthorizationGate,
    permission: &'static str,
}

/// Wraps `route` so its handler only runs for callers holding `permission`.
///
/// The verified claims are available to the handler as
/// `Extension<DecodedClaims>`.
pub(crate) fn requires(
    state: &AppState,
    permission: &'static str,
    route: MethodRouter<AppState>,
) -> MethodRouter<AppState> {
    let guard = PermissionGuard {
        gate: state.gate.clone(),
        permission,
    };
    route.route_layer(middleware::from_fn_with_state(guard, permission_middleware))
}

async fn permission_middleware(
    State(guard): State<PermissionGuard>,
    mut request: Request,
    next: Next,
) -> Response {
    match guard
        .gate
        .authorize(request.headers(), guard.permission)
        .await
    {
        Ok(claims) => {
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        Err(err) => ApiError::from(err).into_response(),
    }
}
