use crate::models::{
    Actor, ActorUpdate, CastMember, Movie, MovieUpdate, NewActor, NewMovie, NewPerformance,
};
use std::collections::BTreeMap;
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Movie {0} not found")]
    MovieNotFound(u64),

    #[error("Actor {0} not found")]
    ActorNotFound(u64),
}

/// In-memory store of actors, movies and who performs in what.
#[derive(Debug, Default)]
pub struct Catalog {
    inner: RwLock<CatalogData>,
}

#[derive(Debug, Default)]
struct CatalogData {
    actors: BTreeMap<u64, Actor>,
    movies: BTreeMap<u64, Movie>,
    /// (movie id, actor id) -> performance rating
    performances: BTreeMap<(u64, u64), Option<i32>>,
    last_actor_id: u64,
    last_movie_id: u64,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn actors(&self) -> Vec<Actor> {
        self.inner.read().await.actors.values().cloned().collect()
    }

    pub async fn create_actor(&self, new: NewActor) -> Actor {
        let mut data = self.inner.write().await;
        data.last_actor_id += 1;
        let actor = Actor {
            id: data.last_actor_id,
            name: new.name,
            age: new.age,
            gender: new.gender,
            genres: new.genres,
            seeking_work: new.seeking_work,
        };
        data.actors.insert(actor.id, actor.clone());
        actor
    }

    pub async fn contains_actor(&self, id: u64) -> bool {
        self.inner.read().await.actors.contains_key(&id)
    }

    pub async fn update_actor(&self, id: u64, update: ActorUpdate) -> Result<Actor, CatalogError> {
        let mut data = self.inner.write().await;
        let actor = data
            .actors
            .get_mut(&id)
            .ok_or(CatalogError::ActorNotFound(id))?;
        update.apply(actor);
        Ok(actor.clone())
    }

    /// Removes an actor together with every role they were cast in.
    pub async fn delete_actor(&self, id: u64) -> Result<(), CatalogError> {
        let mut data = self.inner.write().await;
        data.actors
            .remove(&id)
            .ok_or(CatalogError::ActorNotFound(id))?;
        data.performances.retain(|(_, actor_id), _| *actor_id != id);
        Ok(())
    }

    pub async fn movies(&self) -> Vec<Movie> {
        self.inner.read().await.movies.values().cloned().collect()
    }

    pub async fn create_movie(&self, new: NewMovie) -> Movie {
        let mut data = self.inner.write().await;
        data.last_movie_id += 1;
        let movie = Movie {
            id: data.last_movie_id,
            title: new.title,
            genres: new.genres,
            release_date: new.release_date,
        };
        data.movies.insert(movie.id, movie.clone());
        movie
    }

    pub async fn contains_movie(&self, id: u64) -> bool {
        self.inner.read().await.movies.contains_key(&id)
    }

    pub async fn update_movie(&self, id: u64, update: MovieUpdate) -> Result<Movie, CatalogError> {
        let mut data = self.inner.write().await;
        let movie = data
            .movies
            .get_mut(&id)
            .ok_or(CatalogError::MovieNotFound(id))?;
        update.apply(movie);
        Ok(movie.clone())
    }

    /// Removes a movie together with its cast list.
    pub async fn delete_movie(&self, id: u64) -> Result<(), CatalogError> {
        let mut data = self.inner.write().await;
        data.movies
            .remove(&id)
            .ok_or(CatalogError::MovieNotFound(id))?;
        data.performances.retain(|(movie_id, _), _| *movie_id != id);
        Ok(())
    }

    pub async fn cast(&self, movie_id: u64) -> Result<Vec<CastMember>, CatalogError> {
        let data = self.inner.read().await;
        if !data.movies.contains_key(&movie_id) {
            return Err(CatalogError::MovieNotFound(movie_id));
        }
        Ok(data
            .performances
            .range((movie_id, 0)..=(movie_id, u64::MAX))
            .filter_map(|((_, actor_id), rating)| {
                data.actors.get(actor_id).map(|actor| CastMember {
                    actor: actor.clone(),
                    actor_rating: *rating,
                })
            })
            .collect())
    }

    /// Casts an actor in a movie, replacing the rating if already cast.
    pub async fn add_performance(
        &self,
        movie_id: u64,
        performance: NewPerformance,
    ) -> Result<CastMember, CatalogError> {
        let mut data = self.inner.write().await;
        if !data.movies.contains_key(&movie_id) {
            return Err(CatalogError::MovieNotFound(movie_id));
        }
        let actor = data
            .actors
            .get(&performance.actor_id)
            .cloned()
            .ok_or(CatalogError::ActorNotFound(performance.actor_id))?;
        data.performances
            .insert((movie_id, actor.id), performance.actor_rating);
        Ok(CastMember {
            actor,
            actor_rating: performance.actor_rating,
        })
    }

    pub async fn remove_performance(&self, movie_id: u64, actor_id: u64) -> Result<(), CatalogError> {
        let mut data = self.inner.write().await;
        if !data.movies.contains_key(&movie_id) {
            return Err(CatalogError::MovieNotFound(movie_id));
        }
        data.performances
            .remove(&(movie_id, actor_id))
            .map(|_| ())
            .ok_or(CatalogError::ActorNotFound(actor_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn new_actor(name: &str) -> NewActor {
        NewActor {
            name: name.to_string(),
            age: 40,
            gender: "female".to_string(),
            genres: vec!["drama".to_string()],
            seeking_work: true,
        }
    }

    fn new_movie(title: &str) -> NewMovie {
        NewMovie {
            title: title.to_string(),
            release_date: NaiveDate::from_ymd_opt(2024, 5, 17).unwrap(),
            genres: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_ids_are_assigned_in_order() {
        let catalog = Catalog::new();
        let first = catalog.create_actor(new_actor("Ada")).await;
        let second = catalog.create_actor(new_actor("Grace")).await;
        assert_eq!((first.id, second.id), (1, 2));

        catalog.delete_actor(second.id).await.unwrap();
        let third = catalog.create_actor(new_actor("Hedy")).await;
        assert_eq!(third.id, 3);
    }

    #[tokio::test]
    async fn test_partial_update_keeps_other_fields() {
        let catalog = Catalog::new();
        let actor = catalog.create_actor(new_actor("Ada")).await;
        let update = ActorUpdate {
            age: Some(41),
            ..Default::default()
        };

        let updated = catalog.update_actor(actor.id, update).await.unwrap();
        assert_eq!(updated.age, 41);
        assert_eq!(updated.name, "Ada");
        assert!(updated.seeking_work);
    }

    #[tokio::test]
    async fn test_missing_records() {
        let catalog = Catalog::new();
        assert_eq!(
            catalog.update_actor(9, ActorUpdate::default()).await,
            Err(CatalogError::ActorNotFound(9))
        );
        assert_eq!(catalog.delete_movie(3).await, Err(CatalogError::MovieNotFound(3)));
        assert_eq!(catalog.cast(3).await, Err(CatalogError::MovieNotFound(3)));
    }

    #[tokio::test]
    async fn test_cast_and_cascading_deletes() {
        let catalog = Catalog::new();
        let movie = catalog.create_movie(new_movie("Nightfall")).await;
        let other = catalog.create_movie(new_movie("Daybreak")).await;
        let ada = catalog.create_actor(new_actor("Ada")).await;
        let grace = catalog.create_actor(new_actor("Grace")).await;

        for (movie_id, actor_id) in [(movie.id, ada.id), (movie.id, grace.id), (other.id, ada.id)] {
            let performance = NewPerformance {
                actor_id,
                actor_rating: Some(4),
            };
            catalog.add_performance(movie_id, performance).await.unwrap();
        }
        assert_eq!(catalog.cast(movie.id).await.unwrap().len(), 2);

        catalog.delete_actor(ada.id).await.unwrap();
        let cast = catalog.cast(movie.id).await.unwrap();
        assert_eq!(cast.len(), 1);
        assert_eq!(cast[0].actor.id, grace.id);
        assert!(catalog.cast(other.id).await.unwrap().is_empty());

        catalog.delete_movie(movie.id).await.unwrap();
        let performance = NewPerformance {
            actor_id: grace.id,
            actor_rating: None,
        };
        assert_eq!(
            catalog.add_performance(movie.id, performance).await,
            Err(CatalogError::MovieNotFound(movie.id))
        );
    }

    #[tokio::test]
    async fn test_performance_requires_existing_actor() {
        let catalog = Catalog::new();
        let movie = catalog.create_movie(new_movie("Nightfall")).await;
        let performance = NewPerformance {
            actor_id: 42,
            actor_rating: None,
        };
        assert_eq!(
            catalog.add_performance(movie.id, performance).await,
            Err(CatalogError::ActorNotFound(42))
        );
        assert_eq!(
            catalog.remove_performance(movie.id, 42).await,
            Err(CatalogError::ActorNotFound(42))
        );
    }
}
