use crate::api::{actors, health, movies};
use crate::errors::ErrorBody;
use crate::models::{
    Actor, ActorCreatedResponse, ActorUpdate, ActorsResponse, CastMember, CastResponse,
    DeletedResponse, Movie, MovieUpdate, MoviesResponse, NewActor, NewMovie, NewPerformance,
};
use utoipa::OpenApi;

pub(crate) const HEALTH_TAG: &str = "Health API";
pub(crate) const ACTORS_TAG: &str = "Actors API";
pub(crate) const MOVIES_TAG: &str = "Movies API";

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        actors::list_actors,
        actors::create_actor,
        actors::update_actor,
        actors::delete_actor,
        movies::list_movies,
        movies::create_movie,
        movies::update_movie,
        movies::delete_movie,
        movies::list_cast,
        movies::add_to_cast,
        movies::remove_from_cast,
    ),
    components(schemas(
        Actor,
        ActorCreatedResponse,
        ActorUpdate,
        ActorsResponse,
        CastMember,
        CastResponse,
        DeletedResponse,
        ErrorBody,
        health::Health,
        Movie,
        MovieUpdate,
        MoviesResponse,
        NewActor,
        NewMovie,
        NewPerformance,
    )),
    tags(
        (name = HEALTH_TAG, description = "Health check endpoints"),
        (name = ACTORS_TAG, description = "Actor management endpoints"),
        (name = MOVIES_TAG, description = "Movie and cast management endpoints"),
    ),
    info(
        title = "Casting Agency API",
        description = "Movies, actors and casting, guarded by bearer token permissions",
        version = "1.0.0"
    )
)]
pub(crate) struct ApiDoc;
