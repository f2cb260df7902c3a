use async_trait::async_trait;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Movie, User};

use super::{MovieStore, MutateFn, UserStore};

/// Durable document store over Postgres JSONB.
///
/// Each user/movie document lives in a single row; `mutate` takes the row
/// lock (`SELECT ... FOR UPDATE`) for the duration of the read-modify-write,
/// which is the atomicity guarantee the aggregation layer relies on.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Creates a PostgreSQL connection pool
pub async fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    Ok(pool)
}

fn decode_doc<T: serde::de::DeserializeOwned>(doc: serde_json::Value) -> AppResult<T> {
    serde_json::from_value(doc)
        .map_err(|e| AppError::Internal(format!("document deserialization error: {}", e)))
}

fn encode_doc<T: serde::Serialize>(value: &T) -> AppResult<serde_json::Value> {
    serde_json::to_value(value)
        .map_err(|e| AppError::Internal(format!("document serialization error: {}", e)))
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[async_trait]
impl UserStore for PostgresStore {
    async fn insert(&self, user: User) -> AppResult<()> {
        let doc = encode_doc(&user)?;
        let result = sqlx::query("INSERT INTO users (id, username, email, doc) VALUES ($1, $2, $3, $4)")
            .bind(user.id)
            .bind(&user.username)
            .bind(&user.email)
            .bind(&doc)
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => Err(AppError::Conflict(
                "username or email already registered".to_string(),
            )),
            Err(e) => Err(e.into()),
        }
    }

    async fn get(&self, id: Uuid) -> AppResult<Option<User>> {
        let row = sqlx::query("SELECT doc FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(decode_doc(row.try_get("doc")?)?)),
            None => Ok(None),
        }
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let row = sqlx::query("SELECT doc FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(decode_doc(row.try_get("doc")?)?)),
            None => Ok(None),
        }
    }

    async fn mutate(&self, id: Uuid, mutation: MutateFn<User>) -> AppResult<User> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query("SELECT doc FROM users WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user {} not found", id)))?;

        let mut user: User = decode_doc(row.try_get("doc")?)?;
        // An error here drops the transaction and rolls back.
        mutation(&mut user)?;

        let doc = encode_doc(&user)?;
        sqlx::query("UPDATE users SET username = $2, email = $3, doc = $4 WHERE id = $1")
            .bind(id)
            .bind(&user.username)
            .bind(&user.email)
            .bind(&doc)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(user)
    }
}

#[async_trait]
impl MovieStore for PostgresStore {
    async fn get(&self, tmdb_id: &str) -> AppResult<Option<Movie>> {
        let row = sqlx::query("SELECT doc FROM movies WHERE tmdb_id = $1")
            .bind(tmdb_id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(decode_doc(row.try_get("doc")?)?)),
            None => Ok(None),
        }
    }

    async fn insert_if_absent(&self, movie: Movie) -> AppResult<Movie> {
        let doc = encode_doc(&movie)?;

        // Losing the insert race is fine; the subsequent read returns
        // whichever record won.
        sqlx::query("INSERT INTO movies (tmdb_id, doc) VALUES ($1, $2) ON CONFLICT (tmdb_id) DO NOTHING")
            .bind(&movie.tmdb_id)
            .bind(&doc)
            .execute(&self.pool)
            .await?;

        let row = sqlx::query("SELECT doc FROM movies WHERE tmdb_id = $1")
            .bind(&movie.tmdb_id)
            .fetch_one(&self.pool)
            .await?;

        decode_doc(row.try_get("doc")?)
    }

    async fn mutate(&self, tmdb_id: &str, mutation: MutateFn<Movie>) -> AppResult<Movie> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query("SELECT doc FROM movies WHERE tmdb_id = $1 FOR UPDATE")
            .bind(tmdb_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("movie {} not found", tmdb_id)))?;

        let mut movie: Movie = decode_doc(row.try_get("doc")?)?;
        mutation(&mut movie)?;

        let doc = encode_doc(&movie)?;
        sqlx::query("UPDATE movies SET doc = $2 WHERE tmdb_id = $1")
            .bind(tmdb_id)
            .bind(&doc)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(movie)
    }
}
