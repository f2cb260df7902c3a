use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{Movie, User};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

/// Fallible in-place mutation applied under the store's per-document
/// atomicity guarantee. Returning an error aborts the write.
pub type MutateFn<T> = Box<dyn FnOnce(&mut T) -> AppResult<()> + Send>;

/// Persistence for user account documents.
///
/// Implementations must make `mutate` an atomic read-modify-write per
/// document (write lock in memory, row lock in Postgres); callers never
/// re-check for interleaved writers.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts a new account. Fails with Conflict when the username or
    /// email is already taken.
    async fn insert(&self, user: User) -> AppResult<()>;

    async fn get(&self, id: Uuid) -> AppResult<Option<User>>;

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>>;

    /// Applies `mutation` to the document under per-document atomicity and
    /// returns the updated record. Fails with NotFound when absent.
    async fn mutate(&self, id: Uuid, mutation: MutateFn<User>) -> AppResult<User>;
}

/// Persistence for the local movie mirror, keyed by catalog ID.
#[async_trait]
pub trait MovieStore: Send + Sync {
    async fn get(&self, tmdb_id: &str) -> AppResult<Option<Movie>>;

    /// Persists `movie` unless a record with the same catalog ID already
    /// exists, returning whichever record is stored afterwards. Two
    /// concurrent first fetches therefore persist exactly one record.
    async fn insert_if_absent(&self, movie: Movie) -> AppResult<Movie>;

    /// Applies `mutation` under per-document atomicity and returns the
    /// updated record. Fails with NotFound when absent.
    async fn mutate(&self, tmdb_id: &str, mutation: MutateFn<Movie>) -> AppResult<Movie>;
}
