use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::Display;
use uuid::Uuid;

pub mod keyed_list;

pub use keyed_list::{Keyed, KeyedList, Upserted};

/// Chat history is trimmed to this many turns, oldest evicted first.
pub const CHAT_HISTORY_LIMIT: usize = 50;

/// Valid community/personal rating range, inclusive.
pub const RATING_MIN: u8 = 1;
pub const RATING_MAX: u8 = 10;

// ============================================================================
// Genres
// ============================================================================

/// Closed genre vocabulary (TMDB's movie/TV genre set).
///
/// Unknown genre names are rejected at deserialization, which is how bad
/// preference input surfaces as a validation error.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Genre {
    Action,
    Adventure,
    Animation,
    Comedy,
    Crime,
    Documentary,
    Drama,
    Family,
    Fantasy,
    History,
    Horror,
    Music,
    Mystery,
    Romance,
    ScienceFiction,
    TvMovie,
    Thriller,
    War,
    Western,
}

impl Display for Genre {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Genre::Action => "Action",
            Genre::Adventure => "Adventure",
            Genre::Animation => "Animation",
            Genre::Comedy => "Comedy",
            Genre::Crime => "Crime",
            Genre::Documentary => "Documentary",
            Genre::Drama => "Drama",
            Genre::Family => "Family",
            Genre::Fantasy => "Fantasy",
            Genre::History => "History",
            Genre::Horror => "Horror",
            Genre::Music => "Music",
            Genre::Mystery => "Mystery",
            Genre::Romance => "Romance",
            Genre::ScienceFiction => "Science Fiction",
            Genre::TvMovie => "TV Movie",
            Genre::Thriller => "Thriller",
            Genre::War => "War",
            Genre::Western => "Western",
        };
        write!(f, "{}", name)
    }
}

// ============================================================================
// User document
// ============================================================================

/// Profile fields editable by the owning user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub avatar_path: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
}

/// One entry on a user's watchlist, keyed by catalog movie ID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchlistEntry {
    pub movie_id: String,
    pub title: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    pub added_at: DateTime<Utc>,
}

impl Keyed for WatchlistEntry {
    type Key = str;

    fn key(&self) -> &str {
        &self.movie_id
    }
}

/// One entry in a user's personal watch log.
///
/// The optional rating here is the user's private log entry, distinct from
/// the community rating stored on the [`Movie`] record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchedEntry {
    pub movie_id: String,
    pub title: String,
    #[serde(default)]
    pub rating: Option<u8>,
    #[serde(default)]
    pub review: Option<String>,
    pub watched_at: DateTime<Utc>,
}

impl Keyed for WatchedEntry {
    type Key = str;

    fn key(&self) -> &str {
        &self.movie_id
    }
}

/// One message/response pair in a user's chat history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub id: Uuid,
    pub message: String,
    pub response: String,
    pub created_at: DateTime<Utc>,
}

impl ChatTurn {
    pub fn new(message: String, response: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            message,
            response,
            created_at: Utc::now(),
        }
    }
}

impl Keyed for ChatTurn {
    type Key = Uuid;

    fn key(&self) -> &Uuid {
        &self.id
    }
}

/// A user account document.
///
/// Embedded collections (watchlist, watched log, chat history) are owned by
/// the document and mutated only through the store's per-document mutation.
/// Accounts are soft-deleted via `is_active`, never removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    /// Opaque credential produced by the external identity collaborator.
    pub password_hash: String,
    #[serde(default)]
    pub profile: UserProfile,
    #[serde(default)]
    pub favorite_genres: BTreeSet<Genre>,
    #[serde(default)]
    pub watchlist: KeyedList<WatchlistEntry>,
    #[serde(default)]
    pub watched: KeyedList<WatchedEntry>,
    #[serde(default)]
    pub chat_history: KeyedList<ChatTurn>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub last_login: Option<DateTime<Utc>>,
}

impl User {
    pub fn new(username: String, email: String, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            username,
            email,
            password_hash,
            profile: UserProfile::default(),
            favorite_genres: BTreeSet::new(),
            watchlist: KeyedList::new(),
            watched: KeyedList::new(),
            chat_history: KeyedList::new(),
            is_active: true,
            created_at: Utc::now(),
            last_login: None,
        }
    }
}

// ============================================================================
// Movie document
// ============================================================================

/// Release lifecycle status as reported by the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MovieStatus {
    Rumored,
    Planned,
    #[serde(rename = "In Production")]
    InProduction,
    #[serde(rename = "Post Production")]
    PostProduction,
    Released,
    Canceled,
}

/// One community rating on a movie, keyed by the submitting user.
///
/// References the user by identity only; deactivating or deleting a user
/// leaves their ratings in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRating {
    pub user_id: Uuid,
    pub rating: u8,
    #[serde(default)]
    pub review: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Keyed for UserRating {
    type Key = Uuid;

    fn key(&self) -> &Uuid {
        &self.user_id
    }
}

/// AI output cached on the movie record alongside its generation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedText {
    pub text: String,
    pub last_updated: DateTime<Utc>,
}

impl CachedText {
    pub fn now(text: String) -> Self {
        Self {
            text,
            last_updated: Utc::now(),
        }
    }
}

/// Verbatim catalog response retained on first fetch.
///
/// Read-only: consumers may inspect it via [`CatalogSnapshot::as_json`] but
/// the aggregation layer never derives authoritative state from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CatalogSnapshot(serde_json::Value);

impl CatalogSnapshot {
    pub fn new(raw: serde_json::Value) -> Self {
        Self(raw)
    }

    pub fn as_json(&self) -> &serde_json::Value {
        &self.0
    }
}

/// Local mirror of one catalog entry plus community state.
///
/// Keyed by the external catalog ID. Catalog fields are denormalized on
/// first fetch and treated as authoritative afterwards; community ratings
/// and cached AI outputs live only here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub tmdb_id: String,
    pub title: String,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub release_date: Option<NaiveDate>,
    #[serde(default)]
    pub runtime_minutes: Option<u32>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub production_companies: Vec<String>,
    #[serde(default)]
    pub status: Option<MovieStatus>,
    #[serde(default)]
    pub user_ratings: KeyedList<UserRating>,
    #[serde(default)]
    pub reviews_summary: Option<CachedText>,
    #[serde(default)]
    pub recommendations: Option<CachedText>,
    pub catalog_snapshot: CatalogSnapshot,
    pub created_at: DateTime<Utc>,
}

impl Movie {
    /// Mean of all community ratings, rounded to one decimal. 0.0 when empty.
    ///
    /// Computed on demand so it can never go stale relative to
    /// `user_ratings`.
    pub fn average_user_rating(&self) -> f64 {
        if self.user_ratings.is_empty() {
            return 0.0;
        }
        let sum: u32 = self.user_ratings.iter().map(|r| u32::from(r.rating)).sum();
        let mean = f64::from(sum) / self.user_ratings.len() as f64;
        (mean * 10.0).round() / 10.0
    }
}

// ============================================================================
// View models
// ============================================================================

/// Updated community aggregate returned after a rating submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingSummary {
    pub average_user_rating: f64,
    pub total_ratings: usize,
}

/// Catalog-sourced sections of the detail view, re-fetched on every call.
///
/// Absent (`None` in [`MovieDetailView`]) when the catalog was unreachable
/// and the view degraded to local fields only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogExtras {
    #[serde(default)]
    pub credits: Option<serde_json::Value>,
    #[serde(default)]
    pub videos: Option<serde_json::Value>,
    #[serde(default)]
    pub reviews: Option<serde_json::Value>,
    #[serde(default)]
    pub similar: Option<serde_json::Value>,
}

/// Merged detail payload: locally mirrored catalog fields, the community
/// aggregate, and (when the catalog is reachable) fresh ancillary sections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieDetailView {
    pub tmdb_id: String,
    pub title: String,
    pub overview: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub runtime_minutes: Option<u32>,
    pub genres: Vec<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub status: Option<MovieStatus>,
    pub average_user_rating: f64,
    pub total_ratings: usize,
    pub user_ratings: Vec<UserRating>,
    pub reviews_summary: Option<CachedText>,
    /// None when the catalog re-fetch failed and the view degraded.
    pub catalog: Option<CatalogExtras>,
}

/// Pure aggregation over one user document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserStats {
    pub watchlist_count: usize,
    pub watched_count: usize,
    /// Mean of the ratings present in the personal watch log, one decimal.
    pub average_personal_rating: f64,
    pub favorite_genres: Vec<Genre>,
    pub chat_history_count: usize,
    pub account_age_days: i64,
    pub last_active: Option<DateTime<Utc>>,
}
