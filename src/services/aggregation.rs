use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{
    CachedText, CatalogSnapshot, KeyedList, Movie, MovieDetailView, RatingSummary, User,
    UserRating, UserStats, WatchedEntry, WatchlistEntry, RATING_MAX, RATING_MIN,
};
use crate::services::catalog::{CatalogClient, CatalogDetail, SearchPage};
use crate::services::generator::ContentGenerator;
use crate::store::{MovieStore, UserStore};

/// Cached AI outputs on a movie are regenerated once they are older than
/// this.
const AI_CACHE_MAX_AGE_HOURS: i64 = 24;

const RECOMMENDER_SYSTEM_INSTRUCTION: &str = "You are an expert movie critic and \
recommendation engine. You provide detailed, personalized movie and TV show \
recommendations based on user preferences. Recommendations should include the \
title, year, a brief description, and why it would appeal to someone who liked \
the given movie. Format your response in a clear, engaging way.";

const REVIEWER_SYSTEM_INSTRUCTION: &str = "You are a film critic who distills many \
viewer reviews into a short, balanced summary. Mention the consensus, notable \
praise, and common complaints. Keep it under 200 words.";

fn validate_rating(rating: u8) -> AppResult<()> {
    if !(RATING_MIN..=RATING_MAX).contains(&rating) {
        return Err(AppError::Validation(format!(
            "rating must be between {} and {}",
            RATING_MIN, RATING_MAX
        )));
    }
    Ok(())
}

fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// The aggregation layer: reconciles the external catalog with locally
/// stored user-generated content and produces merged view models.
///
/// All collaborators are injected so tests can substitute doubles.
pub struct Aggregator {
    catalog: Arc<dyn CatalogClient>,
    generator: Arc<dyn ContentGenerator>,
    movies: Arc<dyn MovieStore>,
    users: Arc<dyn UserStore>,
}

impl Aggregator {
    pub fn new(
        catalog: Arc<dyn CatalogClient>,
        generator: Arc<dyn ContentGenerator>,
        movies: Arc<dyn MovieStore>,
        users: Arc<dyn UserStore>,
    ) -> Self {
        Self {
            catalog,
            generator,
            movies,
            users,
        }
    }

    /// Catalog search passthrough; no local state involved.
    pub async fn search_catalog(&self, query: &str, page: u32) -> AppResult<SearchPage> {
        self.catalog.search(query, page).await
    }

    pub async fn trending(&self) -> AppResult<SearchPage> {
        self.catalog.trending().await
    }

    pub async fn popular(&self) -> AppResult<SearchPage> {
        self.catalog.popular().await
    }

    /// Write-through catalog lookup.
    ///
    /// A stored record is returned as-is, no staleness check; the local copy
    /// is authoritative once created. On a miss the full catalog detail is
    /// fetched, mapped into the local schema, persisted and returned. A
    /// catalog failure on the miss path is fatal and persists nothing.
    pub async fn get_or_create_movie(&self, catalog_id: &str) -> AppResult<Movie> {
        if let Some(movie) = self.movies.get(catalog_id).await? {
            return Ok(movie);
        }

        let detail = self.catalog.detail(catalog_id).await?;
        let movie = movie_from_detail(catalog_id, detail);

        tracing::info!(tmdb_id = %catalog_id, "Caching catalog entry locally");

        self.movies.insert_if_absent(movie).await
    }

    /// Merged detail payload.
    ///
    /// The catalog is re-queried on every call for the ancillary sections
    /// (credits, videos, reviews, similar); the community aggregate always
    /// comes from the local store. Unlike [`Self::get_or_create_movie`],
    /// a catalog failure here degrades to local fields only once a local
    /// record exists.
    pub async fn movie_detail_view(&self, catalog_id: &str) -> AppResult<MovieDetailView> {
        let movie = self.get_or_create_movie(catalog_id).await?;

        let catalog = match self.catalog.detail(catalog_id).await {
            Ok(detail) => Some(detail.extras),
            Err(AppError::CatalogUnavailable(reason)) => {
                tracing::warn!(
                    tmdb_id = %catalog_id,
                    reason = %reason,
                    "Catalog re-fetch failed, serving local fields only"
                );
                None
            }
            Err(e) => return Err(e),
        };

        Ok(MovieDetailView {
            tmdb_id: movie.tmdb_id.clone(),
            title: movie.title.clone(),
            overview: movie.overview.clone(),
            release_date: movie.release_date,
            runtime_minutes: movie.runtime_minutes,
            genres: movie.genres.clone(),
            poster_path: movie.poster_path.clone(),
            backdrop_path: movie.backdrop_path.clone(),
            status: movie.status,
            average_user_rating: movie.average_user_rating(),
            total_ratings: movie.user_ratings.len(),
            user_ratings: movie.user_ratings.iter().cloned().collect(),
            reviews_summary: movie.reviews_summary.clone(),
            catalog,
        })
    }

    /// Upserts one community rating and returns the fresh aggregate.
    ///
    /// Repeated submissions by the same user replace their entry rather
    /// than appending, so one user can never inflate the average. The store
    /// applies the whole read-modify-write atomically per document.
    pub async fn submit_rating(
        &self,
        catalog_id: &str,
        user_id: Uuid,
        rating: u8,
        review: Option<String>,
    ) -> AppResult<RatingSummary> {
        validate_rating(rating)?;

        self.get_or_create_movie(catalog_id).await?;

        let updated = self
            .movies
            .mutate(
                catalog_id,
                Box::new(move |movie| {
                    movie.user_ratings.upsert(UserRating {
                        user_id,
                        rating,
                        review,
                        created_at: Utc::now(),
                    });
                    Ok(())
                }),
            )
            .await?;

        tracing::info!(
            tmdb_id = %catalog_id,
            user_id = %user_id,
            rating = rating,
            total = updated.user_ratings.len(),
            "Rating submitted"
        );

        Ok(RatingSummary {
            average_user_rating: updated.average_user_rating(),
            total_ratings: updated.user_ratings.len(),
        })
    }

    /// Appends to the user's watchlist; a movie already present is a
    /// Conflict, not a silent merge.
    pub async fn add_to_watchlist(
        &self,
        user_id: Uuid,
        movie_id: String,
        title: String,
        poster_path: Option<String>,
    ) -> AppResult<User> {
        self.users
            .mutate(
                user_id,
                Box::new(move |user| {
                    let entry = WatchlistEntry {
                        movie_id,
                        title,
                        poster_path,
                        added_at: Utc::now(),
                    };
                    if !user.watchlist.insert_new(entry) {
                        return Err(AppError::Conflict(
                            "movie is already on the watchlist".to_string(),
                        ));
                    }
                    Ok(())
                }),
            )
            .await
    }

    /// Removes a watchlist entry. Idempotent: absent entries are a no-op.
    pub async fn remove_from_watchlist(&self, user_id: Uuid, movie_id: &str) -> AppResult<User> {
        let movie_id = movie_id.to_string();
        self.users
            .mutate(
                user_id,
                Box::new(move |user| {
                    user.watchlist.remove(&movie_id);
                    Ok(())
                }),
            )
            .await
    }

    /// Upserts an entry in the user's personal watch log.
    ///
    /// This is the user's private rating fact, independent of the community
    /// rating created by [`Self::submit_rating`]. Re-marking the same movie
    /// replaces rating, review and timestamp in place.
    pub async fn mark_watched(
        &self,
        user_id: Uuid,
        movie_id: String,
        title: String,
        rating: Option<u8>,
        review: Option<String>,
    ) -> AppResult<User> {
        if let Some(rating) = rating {
            validate_rating(rating)?;
        }

        self.users
            .mutate(
                user_id,
                Box::new(move |user| {
                    user.watched.upsert(WatchedEntry {
                        movie_id,
                        title,
                        rating,
                        review,
                        watched_at: Utc::now(),
                    });
                    Ok(())
                }),
            )
            .await
    }

    /// Pure aggregation over one user document; no mutation, no external
    /// calls.
    pub async fn user_stats(&self, user_id: Uuid) -> AppResult<UserStats> {
        let user = self
            .users
            .get(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user {} not found", user_id)))?;

        let ratings: Vec<u8> = user.watched.iter().filter_map(|entry| entry.rating).collect();
        let average_personal_rating = if ratings.is_empty() {
            0.0
        } else {
            let sum: u32 = ratings.iter().map(|r| u32::from(*r)).sum();
            round_to_tenth(f64::from(sum) / ratings.len() as f64)
        };

        Ok(UserStats {
            watchlist_count: user.watchlist.len(),
            watched_count: user.watched.len(),
            average_personal_rating,
            favorite_genres: user.favorite_genres.iter().copied().collect(),
            chat_history_count: user.chat_history.len(),
            account_age_days: (Utc::now() - user.created_at).num_days(),
            last_active: user.last_login,
        })
    }

    /// AI recommendations for one movie, cached on the record.
    ///
    /// A cached text younger than 24 hours is served as-is; otherwise the
    /// generator runs and the result is written back with a fresh timestamp.
    pub async fn movie_recommendations(&self, catalog_id: &str) -> AppResult<String> {
        let movie = self.get_or_create_movie(catalog_id).await?;

        if let Some(cached) = fresh_cached_text(movie.recommendations.as_ref()) {
            return Ok(cached);
        }

        let prompt = recommendation_prompt(&movie);
        let text = self
            .generator
            .generate(&prompt, RECOMMENDER_SYSTEM_INSTRUCTION)
            .await?;

        let stored = text.clone();
        self.movies
            .mutate(
                catalog_id,
                Box::new(move |movie| {
                    movie.recommendations = Some(CachedText::now(stored));
                    Ok(())
                }),
            )
            .await?;

        Ok(text)
    }

    /// AI summary of the catalog's viewer reviews, cached on the record.
    pub async fn reviews_summary(&self, catalog_id: &str) -> AppResult<String> {
        let movie = self.get_or_create_movie(catalog_id).await?;

        if let Some(cached) = fresh_cached_text(movie.reviews_summary.as_ref()) {
            return Ok(cached);
        }

        // Reviews come from the live catalog so the summary reflects the
        // current set, not the first-fetch snapshot.
        let detail = self.catalog.detail(catalog_id).await?;
        let prompt = review_summary_prompt(&movie, detail.extras.reviews.as_ref());

        let text = self
            .generator
            .generate(&prompt, REVIEWER_SYSTEM_INSTRUCTION)
            .await?;

        let stored = text.clone();
        self.movies
            .mutate(
                catalog_id,
                Box::new(move |movie| {
                    movie.reviews_summary = Some(CachedText::now(stored));
                    Ok(())
                }),
            )
            .await?;

        Ok(text)
    }
}

fn fresh_cached_text(cached: Option<&CachedText>) -> Option<String> {
    let cached = cached?;
    let age = Utc::now() - cached.last_updated;
    if age < Duration::hours(AI_CACHE_MAX_AGE_HOURS) {
        Some(cached.text.clone())
    } else {
        None
    }
}

fn recommendation_prompt(movie: &Movie) -> String {
    format!(
        "Based on the following movie/TV show, provide 5-7 similar recommendations:\n\n\
         Title: {}\n\
         Overview: {}\n\
         Community rating: {}/10\n\n\
         For each recommendation include the title and year, a brief description, \
         and why it would appeal to fans of this title.",
        movie.title,
        movie.overview.as_deref().unwrap_or(""),
        movie.average_user_rating(),
    )
}

fn review_summary_prompt(movie: &Movie, reviews: Option<&serde_json::Value>) -> String {
    let excerpts: Vec<String> = reviews
        .and_then(|r| r["results"].as_array())
        .map(|results| {
            results
                .iter()
                .take(8)
                .filter_map(|review| review["content"].as_str())
                .map(|content| {
                    let mut excerpt: String = content.chars().take(500).collect();
                    if content.chars().count() > 500 {
                        excerpt.push('…');
                    }
                    excerpt
                })
                .collect()
        })
        .unwrap_or_default();

    format!(
        "Summarize what viewers think of \"{}\" from these review excerpts:\n\n{}",
        movie.title,
        if excerpts.is_empty() {
            "(no reviews available)".to_string()
        } else {
            excerpts.join("\n---\n")
        }
    )
}

/// Maps catalog detail into the local schema 1:1, retaining the raw
/// response verbatim in the snapshot field.
fn movie_from_detail(catalog_id: &str, detail: CatalogDetail) -> Movie {
    Movie {
        tmdb_id: catalog_id.to_string(),
        title: detail.title,
        overview: detail.overview,
        release_date: detail.release_date,
        runtime_minutes: detail.runtime_minutes,
        genres: detail.genres,
        poster_path: detail.poster_path,
        backdrop_path: detail.backdrop_path,
        production_companies: detail.production_companies,
        status: detail.status,
        user_ratings: KeyedList::new(),
        reviews_summary: None,
        recommendations: None,
        catalog_snapshot: CatalogSnapshot::new(detail.raw),
        created_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CatalogExtras;
    use crate::services::catalog::MockCatalogClient;
    use crate::services::generator::MockContentGenerator;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn sample_detail(id: &str) -> CatalogDetail {
        CatalogDetail {
            id: id.to_string(),
            title: "The Matrix".to_string(),
            overview: Some("A hacker learns the truth.".to_string()),
            release_date: None,
            runtime_minutes: Some(136),
            genres: vec!["Action".to_string()],
            poster_path: Some("/matrix.jpg".to_string()),
            backdrop_path: None,
            production_companies: vec![],
            status: None,
            extras: CatalogExtras {
                credits: Some(json!({"cast": []})),
                videos: None,
                reviews: Some(json!({"results": [{"content": "Loved it"}]})),
                similar: None,
            },
            raw: json!({"id": 603, "title": "The Matrix"}),
        }
    }

    struct Harness {
        aggregator: Aggregator,
        store: MemoryStore,
    }

    fn harness(catalog: MockCatalogClient, generator: MockContentGenerator) -> Harness {
        let store = MemoryStore::new();
        let aggregator = Aggregator::new(
            Arc::new(catalog),
            Arc::new(generator),
            Arc::new(store.clone()),
            Arc::new(store.clone()),
        );
        Harness { aggregator, store }
    }

    async fn seed_user(store: &MemoryStore) -> Uuid {
        let user = User::new("alice".into(), "alice@example.com".into(), "h".into());
        let id = user.id;
        UserStore::insert(store, user).await.unwrap();
        id
    }

    #[tokio::test]
    async fn test_get_or_create_fetches_once_then_hits_cache() {
        let mut catalog = MockCatalogClient::new();
        catalog
            .expect_detail()
            .times(1)
            .returning(|id| Ok(sample_detail(id)));
        let h = harness(catalog, MockContentGenerator::new());

        let first = h.aggregator.get_or_create_movie("603").await.unwrap();
        let second = h.aggregator.get_or_create_movie("603").await.unwrap();

        assert_eq!(first.tmdb_id, "603");
        assert_eq!(first.title, second.title);
        // Exactly one persisted record; the expect_detail().times(1) above
        // proves the second call never reached the catalog.
        assert!(MovieStore::get(&h.store, "603").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_get_or_create_strict_fails_and_persists_nothing() {
        let mut catalog = MockCatalogClient::new();
        catalog
            .expect_detail()
            .returning(|_| Err(AppError::CatalogUnavailable("down".to_string())));
        let h = harness(catalog, MockContentGenerator::new());

        let err = h.aggregator.get_or_create_movie("603").await.unwrap_err();
        assert!(matches!(err, AppError::CatalogUnavailable(_)));
        assert!(MovieStore::get(&h.store, "603").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_detail_view_merges_fresh_catalog_sections() {
        let mut catalog = MockCatalogClient::new();
        catalog.expect_detail().returning(|id| Ok(sample_detail(id)));
        let h = harness(catalog, MockContentGenerator::new());

        let view = h.aggregator.movie_detail_view("603").await.unwrap();
        assert_eq!(view.title, "The Matrix");
        assert_eq!(view.average_user_rating, 0.0);
        let extras = view.catalog.expect("catalog sections present");
        assert!(extras.credits.is_some());
    }

    #[tokio::test]
    async fn test_detail_view_degrades_when_catalog_fails_after_mirror_exists() {
        let mut catalog = MockCatalogClient::new();
        // First call (cache fill) succeeds, every re-fetch fails.
        catalog
            .expect_detail()
            .times(1)
            .returning(|id| Ok(sample_detail(id)));
        catalog
            .expect_detail()
            .returning(|_| Err(AppError::CatalogUnavailable("down".to_string())));
        let h = harness(catalog, MockContentGenerator::new());

        h.aggregator.get_or_create_movie("603").await.unwrap();

        let view = h.aggregator.movie_detail_view("603").await.unwrap();
        assert_eq!(view.title, "The Matrix");
        assert!(view.catalog.is_none());
    }

    #[tokio::test]
    async fn test_submit_rating_upserts_per_user() {
        let mut catalog = MockCatalogClient::new();
        catalog.expect_detail().returning(|id| Ok(sample_detail(id)));
        let h = harness(catalog, MockContentGenerator::new());
        let user = Uuid::new_v4();

        let first = h
            .aggregator
            .submit_rating("42", user, 8, None)
            .await
            .unwrap();
        assert_eq!(first.average_user_rating, 8.0);
        assert_eq!(first.total_ratings, 1);

        let second = h
            .aggregator
            .submit_rating("42", user, 5, None)
            .await
            .unwrap();
        assert_eq!(second.average_user_rating, 5.0);
        assert_eq!(second.total_ratings, 1);

        let movie = MovieStore::get(&h.store, "42").await.unwrap().unwrap();
        assert_eq!(movie.user_ratings.len(), 1);
        assert_eq!(movie.user_ratings.get(&user).unwrap().rating, 5);
    }

    #[tokio::test]
    async fn test_submit_rating_averages_across_distinct_users() {
        let mut catalog = MockCatalogClient::new();
        catalog.expect_detail().returning(|id| Ok(sample_detail(id)));
        let h = harness(catalog, MockContentGenerator::new());

        h.aggregator
            .submit_rating("42", Uuid::new_v4(), 7, None)
            .await
            .unwrap();
        let summary = h
            .aggregator
            .submit_rating("42", Uuid::new_v4(), 8, None)
            .await
            .unwrap();

        assert_eq!(summary.average_user_rating, 7.5);
        assert_eq!(summary.total_ratings, 2);
    }

    #[tokio::test]
    async fn test_submit_rating_rejects_out_of_range() {
        let h = harness(MockCatalogClient::new(), MockContentGenerator::new());

        let err = h
            .aggregator
            .submit_rating("42", Uuid::new_v4(), 11, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = h
            .aggregator
            .submit_rating("42", Uuid::new_v4(), 0, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_watchlist_duplicate_is_conflict() {
        let h = harness(MockCatalogClient::new(), MockContentGenerator::new());
        let user_id = seed_user(&h.store).await;

        h.aggregator
            .add_to_watchlist(user_id, "m1".into(), "X".into(), None)
            .await
            .unwrap();
        let err = h
            .aggregator
            .add_to_watchlist(user_id, "m1".into(), "X".into(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let user = UserStore::get(&h.store, user_id).await.unwrap().unwrap();
        assert_eq!(user.watchlist.len(), 1);
    }

    #[tokio::test]
    async fn test_watchlist_remove_is_idempotent() {
        let h = harness(MockCatalogClient::new(), MockContentGenerator::new());
        let user_id = seed_user(&h.store).await;

        h.aggregator
            .add_to_watchlist(user_id, "m1".into(), "X".into(), None)
            .await
            .unwrap();
        let user = h
            .aggregator
            .remove_from_watchlist(user_id, "m1")
            .await
            .unwrap();
        assert!(user.watchlist.is_empty());

        // Removing again is not an error.
        let user = h
            .aggregator
            .remove_from_watchlist(user_id, "m1")
            .await
            .unwrap();
        assert!(user.watchlist.is_empty());
    }

    #[tokio::test]
    async fn test_mark_watched_upserts_by_movie() {
        let h = harness(MockCatalogClient::new(), MockContentGenerator::new());
        let user_id = seed_user(&h.store).await;

        h.aggregator
            .mark_watched(user_id, "m1".into(), "X".into(), Some(9), None)
            .await
            .unwrap();
        let user = h
            .aggregator
            .mark_watched(user_id, "m1".into(), "X".into(), Some(7), None)
            .await
            .unwrap();

        assert_eq!(user.watched.len(), 1);
        assert_eq!(user.watched.get("m1").unwrap().rating, Some(7));
    }

    #[tokio::test]
    async fn test_mark_watched_validates_rating() {
        let h = harness(MockCatalogClient::new(), MockContentGenerator::new());
        let user_id = seed_user(&h.store).await;

        let err = h
            .aggregator
            .mark_watched(user_id, "m1".into(), "X".into(), Some(11), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_user_stats_aggregates_personal_log() {
        let h = harness(MockCatalogClient::new(), MockContentGenerator::new());
        let user_id = seed_user(&h.store).await;

        h.aggregator
            .add_to_watchlist(user_id, "w1".into(), "A".into(), None)
            .await
            .unwrap();
        h.aggregator
            .mark_watched(user_id, "m1".into(), "B".into(), Some(7), None)
            .await
            .unwrap();
        h.aggregator
            .mark_watched(user_id, "m2".into(), "C".into(), Some(8), None)
            .await
            .unwrap();
        h.aggregator
            .mark_watched(user_id, "m3".into(), "D".into(), None, None)
            .await
            .unwrap();

        let stats = h.aggregator.user_stats(user_id).await.unwrap();
        assert_eq!(stats.watchlist_count, 1);
        assert_eq!(stats.watched_count, 3);
        // Mean over present ratings only: (7 + 8) / 2
        assert_eq!(stats.average_personal_rating, 7.5);
        assert_eq!(stats.chat_history_count, 0);
    }

    #[tokio::test]
    async fn test_user_stats_unknown_user_is_not_found() {
        let h = harness(MockCatalogClient::new(), MockContentGenerator::new());
        let err = h.aggregator.user_stats(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_movie_recommendations_cached_on_record() {
        let mut catalog = MockCatalogClient::new();
        catalog.expect_detail().returning(|id| Ok(sample_detail(id)));
        let mut generator = MockContentGenerator::new();
        generator
            .expect_generate()
            .times(1)
            .returning(|_, _| Ok("Watch Dark City.".to_string()));
        let h = harness(catalog, generator);

        let first = h.aggregator.movie_recommendations("603").await.unwrap();
        assert_eq!(first, "Watch Dark City.");

        // Second call is served from the cached text; times(1) above would
        // fail if the generator ran again.
        let second = h.aggregator.movie_recommendations("603").await.unwrap();
        assert_eq!(second, first);

        let movie = MovieStore::get(&h.store, "603").await.unwrap().unwrap();
        assert_eq!(movie.recommendations.unwrap().text, "Watch Dark City.");
    }

    #[tokio::test]
    async fn test_reviews_summary_uses_live_reviews() {
        let mut catalog = MockCatalogClient::new();
        catalog.expect_detail().returning(|id| Ok(sample_detail(id)));
        let mut generator = MockContentGenerator::new();
        generator
            .expect_generate()
            .withf(|prompt, _| prompt.contains("Loved it"))
            .returning(|_, _| Ok("Viewers loved it.".to_string()));
        let h = harness(catalog, generator);

        let summary = h.aggregator.reviews_summary("603").await.unwrap();
        assert_eq!(summary, "Viewers loved it.");
    }

    #[tokio::test]
    async fn test_generator_failure_surfaces_and_caches_nothing() {
        let mut catalog = MockCatalogClient::new();
        catalog.expect_detail().returning(|id| Ok(sample_detail(id)));
        let mut generator = MockContentGenerator::new();
        generator
            .expect_generate()
            .returning(|_, _| Err(AppError::GeneratorUnavailable("no key".to_string())));
        let h = harness(catalog, generator);

        let err = h.aggregator.movie_recommendations("603").await.unwrap_err();
        assert!(matches!(err, AppError::GeneratorUnavailable(_)));

        let movie = MovieStore::get(&h.store, "603").await.unwrap().unwrap();
        assert!(movie.recommendations.is_none());
    }
}
