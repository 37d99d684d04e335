use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq)]
pub struct Actor {
    /// Unique identifier for the actor
    pub id: u64,
    pub name: String,
    pub age: u32,
    pub gender: String,
    /// Genres the actor works in
    #[serde(default)]
    pub genres: Vec<String>,
    /// Whether the actor is currently looking for roles
    #[serde(default)]
    pub seeking_work: bool,
}

/// Payload for creating an actor; name, age and gender are required
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq)]
pub struct NewActor {
    pub name: String,
    pub age: u32,
    pub gender: String,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub seeking_work: bool,
}

/// Partial actor update; absent fields are left untouched
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq, Default)]
pub struct ActorUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genres: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seeking_work: Option<bool>,
}

impl ActorUpdate {
    pub fn apply(self, actor: &mut Actor) {
        if let Some(name) = self.name {
            actor.name = name;
        }
        if let Some(age) = self.age {
            actor.age = age;
        }
        if let Some(gender) = self.gender {
            actor.gender = gender;
        }
        if let Some(genres) = self.genres {
            actor.genres = genres;
        }
        if let Some(seeking_work) = self.seeking_work {
            actor.seeking_work = seeking_work;
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq)]
pub struct Movie {
    /// Unique identifier for the movie
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub genres: Vec<String>,
    /// Release date as `YYYY-MM-DD`
    pub release_date: NaiveDate,
}

/// Payload for creating a movie; title and release date are required
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq)]
pub struct NewMovie {
    pub title: String,
    pub release_date: NaiveDate,
    #[serde(default)]
    pub genres: Vec<String>,
}

/// Partial movie update; absent fields are left untouched
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq, Default)]
pub struct MovieUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genres: Option<Vec<String>>,
}

impl MovieUpdate {
    pub fn apply(self, movie: &mut Movie) {
        if let Some(title) = self.title {
            movie.title = title;
        }
        if let Some(release_date) = self.release_date {
            movie.release_date = release_date;
        }
        if let Some(genres) = self.genres {
            movie.genres = genres;
        }
    }
}

/// An actor cast in a movie
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq)]
pub struct CastMember {
    pub actor: Actor,
    /// Rating of the actor's performance in this movie
    #[serde(default)]
    pub actor_rating: Option<i32>,
}

/// Payload for casting an actor in a movie
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq)]
pub struct NewPerformance {
    pub actor_id: u64,
    #[serde(default)]
    pub actor_rating: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq)]
pub struct ActorsResponse {
    pub success: bool,
    pub actors: Vec<Actor>,
}

/// Response for a created actor, under the singular `actor` key
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq)]
pub struct ActorCreatedResponse {
    pub success: bool,
    pub actor: Vec<Actor>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq)]
pub struct MoviesResponse {
    pub success: bool,
    pub movies: Vec<Movie>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq)]
pub struct CastResponse {
    pub success: bool,
    pub actors: Vec<CastMember>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq)]
pub struct DeletedResponse {
    pub success: bool,
    /// Identifier of the removed record
    pub delete: u64,
}
