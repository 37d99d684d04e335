use crate::api::authn_middleware::requires;
use crate::errors::{ApiError, ErrorBody};
use crate::models::{CastResponse, DeletedResponse, MovieUpdate, MoviesResponse, NewMovie, NewPerformance};
use crate::openapi::MOVIES_TAG;
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
            "/movies",
            requires(state, "get:movies", get(list_movies))
                .merge(requires(state, "post:movies", post(create_movie))),
        )
        .route(
            "/movies/{id}",
            requires(state, "patch:movies", patch(update_movie))
                .merge(requires(state, "delete:movies", delete(delete_movie))),
        )
        .route(
            "/movies/{id}/actors",
            requires(state, "get:movies", get(list_cast))
                .merge(requires(state, "patch:movies", post(add_to_cast))),
        )
        .route(
            "/movies/{id}/actors/{actor_id}",
            requires(state, "patch:movies", delete(remove_from_cast)),
        )
}

#[utoipa::path(
    get,
    path = "/movies",
    tag = MOVIES_TAG,
    params(
        ("Authorization" = String, Header, description = "Bearer token with `get:movies`"),
    ),
    responses(
        (status = 200, description = "All movies", body = MoviesResponse),
        (status = 401, description = "Missing, invalid or insufficient token", body = ErrorBody)
    )
)]
pub(crate) async fn list_movies(State(state): State<AppState>) -> Json<MoviesResponse> {
    Json(MoviesResponse {
        success: true,
        movies: state.catalog.movies().await,
    })
}

#[utoipa::path(
    post,
    path = "/movies",
    tag = MOVIES_TAG,
    request_body = NewMovie,
    params(
        ("Authorization" = String, Header, description = "Bearer token with `post:movies`"),
    ),
    responses(
        (status = 200, description = "Movie created", body = MoviesResponse),
        (status = 401, description = "Missing, invalid or insufficient token", body = ErrorBody),
        (status = 422, description = "Title or release date missing", body = ErrorBody)
    )
)]
pub(crate) async fn create_movie(
    State(state): State<AppState>,
    Extension(claims): Extension<DecodedClaims>,
    payload: Result<Json<NewMovie>, JsonRejection>,
) -> Result<Json<MoviesResponse>, ApiError> {
    let Json(new_movie) = payload?;
    let movie = state.catalog.create_movie(new_movie).await;
    info!("{} created movie {}", claims.subject(), movie.id);
    Ok(Json(MoviesResponse {
        success: true,
        movies: vec![movie],
    }))
}

#[utoipa::path(
    patch,
    path = "/movies/{id}",
    tag = MOVIES_TAG,
    request_body = MovieUpdate,
    params(
        ("id" = u64, Path, description = "Movie identifier"),
        ("Authorization" = String, Header, description = "Bearer token with `patch:movies`"),
    ),
    responses(
        (status = 200, description = "Movie updated", body = MoviesResponse),
        (status = 401, description = "Missing, invalid or insufficient token", body = ErrorBody),
        (status = 404, description = "No such movie", body = ErrorBody),
        (status = 422, description = "Body missing or malformed", body = ErrorBody)
    )
)]
pub(crate) async fn update_movie(
    State(state): State<AppState>,
    Extension(claims): Extension<DecodedClaims>,
    id: Result<Path<u64>, PathRejection>,
    payload: Result<Json<MovieUpdate>, JsonRejection>,
) -> Result<Json<MoviesResponse>, ApiError> {
    let Path(id) = id?;
    if !state.catalog.contains_movie(id).await {
        return Err(ApiError::not_found());
    }
    let Json(update) = payload?;

    let movie = state.catalog.update_movie(id, update).await?;
    info!("{} updated movie {id}", claims.subject());
    Ok(Json(MoviesResponse {
        success: true,
        movies: vec![movie],
    }))
}

#[utoipa::path(
    delete,
    path = "/movies/{id}",
    tag = MOVIES_TAG,
    params(
        ("id" = u64, Path, description = "Movie identifier"),
        ("Authorization" = String, Header, description = "Bearer token with `delete:movies`"),
    ),
    responses(
        (status = 200, description = "Movie and its cast list removed", body = DeletedResponse),
        (status = 401, description = "Missing, invalid or insufficient token", body = ErrorBody),
        (status = 404, description = "No such movie", body = ErrorBody)
    )
)]
pub(crate) async fn delete_movie(
    State(state): State<AppState>,
    Extension(claims): Extension<DecodedClaims>,
    id: Result<Path<u64>, PathRejection>,
) -> Result<Json<DeletedResponse>, ApiError> {
    let Path(id) = id?;
    state.catalog.delete_movie(id).await?;
    info!("{} deleted movie {id}", claims.subject());
    Ok(Json(DeletedResponse {
        success: true,
        delete: id,
    }))
}

#[utoipa::path(
    get,
    path = "/movies/{id}/actors",
    tag = MOVIES_TAG,
    params(
        ("id" = u64, Path, description = "Movie identifier"),
        ("Authorization" = String, Header, description = "Bearer token with `get:movies`"),
    ),
    responses(
        (status = 200, description = "Actors cast in the movie with their ratings", body = CastResponse),
        (status = 401, description = "Missing, invalid or insufficient token", body = ErrorBody),
        (status = 404, description = "No such movie", body = ErrorBody)
    )
)]
pub(crate) async fn list_cast(
    State(state): State<AppState>,
    id: Result<Path<u64>, PathRejection>,
) -> Result<Json<CastResponse>, ApiError> {
    let Path(id) = id?;
    Ok(Json(CastResponse {
        success: true,
        actors: state.catalog.cast(id).await?,
    }))
}

#[utoipa::path(
    post,
    path = "/movies/{id}/actors",
    tag = MOVIES_TAG,
    request_body = NewPerformance,
    params(
        ("id" = u64, Path, description = "Movie identifier"),
        ("Authorization" = String, Header, description = "Bearer token with `patch:movies`"),
    ),
    responses(
        (status = 200, description = "Actor cast in the movie", body = CastResponse),
        (status = 401, description = "Missing, invalid or insufficient token", body = ErrorBody),
        (status = 404, description = "No such movie or actor", body = ErrorBody),
        (status = 422, description = "Body missing or malformed", body = ErrorBody)
    )
)]
pub(crate) async fn add_to_cast(
    State(state): State<AppState>,
    Extension(claims): Extension<DecodedClaims>,
    id: Result<Path<u64>, PathRejection>,
    payload: Result<Json<NewPerformance>, JsonRejection>,
) -> Result<Json<CastResponse>, ApiError> {
    let Path(id) = id?;
    if !state.catalog.contains_movie(id).await {
        return Err(ApiError::not_found());
    }
    let Json(performance) = payload?;

    let member = state.catalog.add_performance(id, performance).await?;
    info!(
        "{} cast actor {} in movie {id}",
        claims.subject(),
        member.actor.id
    );
    Ok(Json(CastResponse {
        success: true,
        actors: vec![member],
    }))
}

#[utoipa::path(
    delete,
    path = "/movies/{id}/actors/{actor_id}",
    tag = MOVIES_TAG,
    params(
        ("id" = u64, Path, description = "Movie identifier"),
        ("actor_id" = u64, Path, description = "Actor identifier"),
        ("Authorization" = String, Header, description = "Bearer token with `patch:movies`"),
    ),
    responses(
        (status = 200, description = "Actor removed from the cast", body = DeletedResponse),
        (status = 401, description = "Missing, invalid or insufficient token", body = ErrorBody),
        (status = 404, description = "No such movie or cast member", body = ErrorBody)
    )
)]
pub(crate) async fn remove_from_cast(
    State(state): State<AppState>,
    Extension(claims): Extension<DecodedClaims>,
    ids: Result<Path<(u64, u64)>, PathRejection>,
) -> Result<Json<DeletedResponse>, ApiError> {
    let Path((id, actor_id)) = ids?;
    state.catalog.remove_performance(id, actor_id).await?;
    info!(
        "{} removed actor {actor_id} from movie {id}",
        claims.subject()
    );
    Ok(Json(DeletedResponse {
        success: true,
        delete: actor_id,
    }))
}
