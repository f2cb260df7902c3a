use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Movie, User};

use super::{MovieStore, MutateFn, UserStore};

/// In-memory document store used by tests and local development.
///
/// Holding the write lock across each read-modify-write gives the same
/// per-document atomicity the Postgres store gets from row locking.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

#[derive(Default)]
struct Inner {
    users: HashMap<Uuid, User>,
    movies: HashMap<String, Movie>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert(&self, user: User) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        let taken = inner
            .users
            .values()
            .any(|existing| existing.username == user.username || existing.email == user.email);
        if taken {
            return Err(AppError::Conflict(
                "username or email already registered".to_string(),
            ));
        }
        inner.users.insert(user.id, user);
        Ok(())
    }

    async fn get(&self, id: Uuid) -> AppResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner
            .users
            .values()
            .find(|user| user.username == username)
            .cloned())
    }

    async fn mutate(&self, id: Uuid, mutation: MutateFn<User>) -> AppResult<User> {
        let mut inner = self.inner.write().await;
        let user = inner
            .users
            .get(&id)
            .ok_or_else(|| AppError::NotFound(format!("user {} not found", id)))?;

        // Apply to a copy so a failed mutation commits nothing.
        let mut updated = user.clone();
        mutation(&mut updated)?;
        inner.users.insert(id, updated.clone());
        Ok(updated)
    }
}

#[async_trait]
impl MovieStore for MemoryStore {
    async fn get(&self, tmdb_id: &str) -> AppResult<Option<Movie>> {
        let inner = self.inner.read().await;
        Ok(inner.movies.get(tmdb_id).cloned())
    }

    async fn insert_if_absent(&self, movie: Movie) -> AppResult<Movie> {
        let mut inner = self.inner.write().await;
        let stored = inner
            .movies
            .entry(movie.tmdb_id.clone())
            .or_insert(movie);
        Ok(stored.clone())
    }

    async fn mutate(&self, tmdb_id: &str, mutation: MutateFn<Movie>) -> AppResult<Movie> {
        let mut inner = self.inner.write().await;
        let movie = inner
            .movies
            .get(tmdb_id)
            .ok_or_else(|| AppError::NotFound(format!("movie {} not found", tmdb_id)))?;

        let mut updated = movie.clone();
        mutation(&mut updated)?;
        inner.movies.insert(tmdb_id.to_string(), updated.clone());
        Ok(updated)
    }
}
