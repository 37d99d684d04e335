use crate::api::authn_middleware::requires;
use crate::errors::{ApiError, ErrorBody};
use crate::models::{ActorCreatedResponse, ActorUpdate, ActorsResponse, DeletedResponse, NewActor};
use crate::openapi::ACTORS_TAG;
use crate::state::AppState;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Json, Path, State};
use axum::routing::{delete, get, patch, post};
use axum::{Extension, Router};
use casting_auth::DecodedClaims;
use log::info;

pub(super) fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/actors",
            requires(state, "get:actors", get(list_actors))
                .merge(requires(state, "post:actors", post(create_actor))),
        )
        .route(
            "/actors/{id}",
            requires(state, "patch:actors", patch(update_actor))
                .merge(requires(state, "delete:actors", delete(delete_actor))),
        )
}

#[utoipa::path(
    get,
    path = "/actors",
    tag = ACTORS_TAG,
    params(
        ("Authorization" = String, Header, description = "Bearer token with `get:actors`"),
    ),
    responses(
        (status = 200, description = "All actors", body = ActorsResponse),
        (status = 401, description = "Missing, invalid or insufficient token", body = ErrorBody)
    )
)]
pub(crate) async fn list_actors(State(state): State<AppState>) -> Json<ActorsResponse> {
    Json(ActorsResponse {
        success: true,
        actors: state.catalog.actors().await,
    })
}

#[utoipa::path(
    post,
    path = "/actors",
    tag = ACTORS_TAG,
    request_body = NewActor,
    params(
        ("Authorization" = String, Header, description = "Bearer token with `post:actors`"),
    ),
    responses(
        (status = 200, description = "Actor created", body = ActorCreatedResponse),
        (status = 401, description = "Missing, invalid or insufficient token", body = ErrorBody),
        (status = 422, description = "Name, age or gender missing", body = ErrorBody)
    )
)]
pub(crate) async fn create_actor(
    State(state): State<AppState>,
    Extension(claims): Extension<DecodedClaims>,
    payload: Result<Json<NewActor>, JsonRejection>,
) -> Result<Json<ActorCreatedResponse>, ApiError> {
    let Json(new_actor) = payload?;
    let actor = state.catalog.create_actor(new_actor).await;
    info!("{} created actor {}", claims.subject(), actor.id);
    Ok(Json(ActorCreatedResponse {
        success: true,
        actor: vec![actor],
    }))
}

#[utoipa::path(
    patch,
    path = "/actors/{id}",
    tag = ACTORS_TAG,
    request_body = ActorUpdate,
    params(
        ("id" = u64, Path, description = "Actor identifier"),
        ("Authorization" = String, Header, description = "Bearer token with `patch:actors`"),
    ),
    responses(
        (status = 200, description = "Actor updated", body = ActorsResponse),
        (status = 401, description = "Missing, invalid or insufficient token", body = ErrorBody),
        (status = 404, description = "No such actor", body = ErrorBody),
        (status = 422, description = "Body missing or malformed", body = ErrorBody)
    )
)]
pub(crate) async fn update_actor(
    State(state): State<AppState>,
    Extension(claims): Extension<DecodedClaims>,
    id: Result<Path<u64>, PathRejection>,
    payload: Result<Json<ActorUpdate>, JsonRejection>,
) -> Result<Json<ActorsResponse>, ApiError> {
    let Path(id) = id?;
    if !state.catalog.contains_actor(id).await {
        return Err(ApiError::not_found());
    }
    let Json(update) = payload?;

    let actor = state.catalog.update_actor(id, update).await?;
    info!("{} updated actor {id}", claims.subject());
    Ok(Json(ActorsResponse {
        success: true,
        actors: vec![actor],
    }))
}

#[utoipa::path(
    delete,
    path = "/actors/{id}",
    tag = ACTORS_TAG,
    params(
        ("id" = u64, Path, description = "Actor identifier"),
        ("Authorization" = String, Header, description = "Bearer token with `delete:actors`"),
    ),
    responses(
        (status = 200, description = "Actor and their roles removed", body = DeletedResponse),
        (status = 401, description = "Missing, invalid or insufficient token", body = ErrorBody),
        (status = 404, description = "No such actor", body = ErrorBody)
    )
)]
pub(crate) async fn delete_actor(
    State(state): State<AppState>,
    Extension(claims): Extension<DecodedClaims>,
    id: Result<Path<u64>, PathRejection>,
) -> Result<Json<DeletedResponse>, ApiError> {
    let Path(id) = id?;
    state.catalog.delete_actor(id).await?;
    info!("{} deleted actor {id}", claims.subject());
    Ok(Json(DeletedResponse {
        success: true,
        delete: id,
    }))
}
