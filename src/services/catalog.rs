use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cache::{Cache, CacheKey, LISTING_CACHE_TTL, SEARCH_CACHE_TTL};
use crate::cached;
use crate::error::{AppError, AppResult};
use crate::models::{CatalogExtras, MovieStatus};

/// Fixed timeout on every catalog request; a slow catalog surfaces as
/// CatalogUnavailable rather than a hung handler.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Search results are capped at the top entries after ranking.
const SEARCH_RESULT_LIMIT: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Movie,
    Tv,
}

/// One ranked search/listing result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: String,
    pub media_type: MediaType,
    pub title: String,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub vote_count: u64,
}

/// One page of catalog search/listing results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchPage {
    pub results: Vec<SearchResult>,
    pub total_results: usize,
    pub total_pages: u32,
}

/// Full catalog detail for one movie, including the ancillary sections and
/// the verbatim response body for the write-through snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogDetail {
    pub id: String,
    pub title: String,
    pub overview: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub runtime_minutes: Option<u32>,
    pub genres: Vec<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub production_companies: Vec<String>,
    pub status: Option<MovieStatus>,
    pub extras: CatalogExtras,
    pub raw: Value,
}

/// External movie-catalog boundary.
///
/// Every method fails with CatalogUnavailable on network errors, timeouts
/// and non-2xx responses; callers decide whether that is fatal.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Combined movie + TV search, ranked by community engagement.
    async fn search(&self, query: &str, page: u32) -> AppResult<SearchPage>;

    /// Full detail for one movie, with credits/videos/reviews/similar.
    async fn detail(&self, id: &str) -> AppResult<CatalogDetail>;

    async fn trending(&self) -> AppResult<SearchPage>;

    async fn popular(&self) -> AppResult<SearchPage>;
}

/// TMDB-backed catalog client.
///
/// List-shaped queries (search, trending, popular) go through the redis
/// cache; detail is always fetched live so the detail view stays fresh.
#[derive(Clone)]
pub struct TmdbClient {
    http_client: reqwest::Client,
    api_key: String,
    base_url: String,
    cache: Cache,
}

impl TmdbClient {
    pub fn new(cache: Cache, api_key: String, base_url: String) -> AppResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AppError::Internal(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            api_key,
            base_url,
            cache,
        })
    }

    async fn get_json(&self, path: &str, params: &[(&str, String)]) -> AppResult<Value> {
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .http_client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str())])
            .query(params)
            .send()
            .await
            .map_err(|e| AppError::CatalogUnavailable(format!("TMDB request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(AppError::CatalogUnavailable(format!(
                "TMDB returned status {}",
                status
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::CatalogUnavailable(format!("invalid TMDB response: {}", e)))
    }

    async fn listing(&self, path: &str) -> AppResult<SearchPage> {
        let data = self.get_json(path, &[]).await?;
        let results = parse_results(&data, MediaType::Movie);
        let total_results = results.len();

        Ok(SearchPage {
            results,
            total_results,
            total_pages: data["total_pages"].as_u64().unwrap_or(1) as u32,
        })
    }
}

/// Maps one page of raw TMDB results into ranked entries. TV entries carry
/// `name`/`first_air_date` instead of `title`/`release_date`.
fn parse_results(data: &Value, media_type: MediaType) -> Vec<SearchResult> {
    let Some(items) = data["results"].as_array() else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| {
            let id = item["id"].as_u64()?;
            let title = item["title"]
                .as_str()
                .or_else(|| item["name"].as_str())?
                .to_string();
            let release_date = item["release_date"]
                .as_str()
                .or_else(|| item["first_air_date"].as_str())
                .filter(|s| !s.is_empty())
                .map(str::to_string);

            Some(SearchResult {
                id: id.to_string(),
                media_type,
                title,
                overview: item["overview"].as_str().filter(|s| !s.is_empty()).map(str::to_string),
                poster_path: item["poster_path"].as_str().map(str::to_string),
                release_date,
                vote_average: item["vote_average"].as_f64().unwrap_or(0.0),
                vote_count: item["vote_count"].as_u64().unwrap_or(0),
            })
        })
        .collect()
}

/// Engagement weight used to rank combined movie + TV results.
fn popularity_weight(result: &SearchResult) -> f64 {
    result.vote_average * result.vote_count as f64
}

fn parse_status(status: Option<&str>) -> Option<MovieStatus> {
    match status? {
        "Rumored" => Some(MovieStatus::Rumored),
        "Planned" => Some(MovieStatus::Planned),
        "In Production" => Some(MovieStatus::InProduction),
        "Post Production" => Some(MovieStatus::PostProduction),
        "Released" => Some(MovieStatus::Released),
        "Canceled" => Some(MovieStatus::Canceled),
        _ => None,
    }
}

fn parse_detail(raw: Value) -> AppResult<CatalogDetail> {
    let id = raw["id"]
        .as_u64()
        .ok_or_else(|| AppError::CatalogUnavailable("TMDB detail missing id".to_string()))?;
    let title = raw["title"]
        .as_str()
        .or_else(|| raw["name"].as_str())
        .ok_or_else(|| AppError::CatalogUnavailable("TMDB detail missing title".to_string()))?
        .to_string();

    let release_date = raw["release_date"]
        .as_str()
        .filter(|s| !s.is_empty())
        .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok());

    let genres = raw["genres"]
        .as_array()
        .map(|genres| {
            genres
                .iter()
                .filter_map(|g| g["name"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default();

    let production_companies = raw["production_companies"]
        .as_array()
        .map(|companies| {
            companies
                .iter()
                .filter_map(|c| c["name"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default();

    let extras = CatalogExtras {
        credits: raw.get("credits").cloned(),
        videos: raw.get("videos").cloned(),
        reviews: raw.get("reviews").cloned(),
        similar: raw.get("similar").cloned(),
    };

    Ok(CatalogDetail {
        id: id.to_string(),
        title,
        overview: raw["overview"].as_str().filter(|s| !s.is_empty()).map(str::to_string),
        release_date,
        runtime_minutes: raw["runtime"].as_u64().map(|r| r as u32),
        genres,
        poster_path: raw["poster_path"].as_str().map(str::to_string),
        backdrop_path: raw["backdrop_path"].as_str().map(str::to_string),
        production_companies,
        status: parse_status(raw["status"].as_str()),
        extras,
        raw,
    })
}

#[async_trait]
impl CatalogClient for TmdbClient {
    async fn search(&self, query: &str, page: u32) -> AppResult<SearchPage> {
        if query.trim().is_empty() {
            return Err(AppError::Validation(
                "search query cannot be empty".to_string(),
            ));
        }

        cached!(
            self.cache,
            CacheKey::Search {
                query: query.to_string(),
                page,
            },
            SEARCH_CACHE_TTL,
            async move {
                let params = [
                    ("query", query.to_string()),
                    ("include_adult", "false".to_string()),
                    ("page", page.to_string()),
                ];

                // Query both halves of the catalog and merge.
                let (movies, shows) = tokio::join!(
                    self.get_json("/search/movie", &params),
                    self.get_json("/search/tv", &params)
                );
                let (movies, shows) = (movies?, shows?);

                let mut results = parse_results(&movies, MediaType::Movie);
                results.extend(parse_results(&shows, MediaType::Tv));
                results.sort_by(|a, b| {
                    popularity_weight(b)
                        .total_cmp(&popularity_weight(a))
                });
                results.truncate(SEARCH_RESULT_LIMIT);

                let total_results = results.len();

                tracing::info!(
                    query = %query,
                    results = total_results,
                    provider = "tmdb",
                    "Catalog search completed"
                );

                Ok::<SearchPage, AppError>(SearchPage {
                    results,
                    total_results,
                    total_pages: 1,
                })
            }
        )
    }

    async fn detail(&self, id: &str) -> AppResult<CatalogDetail> {
        let params = [(
            "append_to_response",
            "credits,videos,reviews,similar".to_string(),
        )];
        let raw = self.get_json(&format!("/movie/{}", id), &params).await?;

        let detail = parse_detail(raw)?;

        tracing::debug!(tmdb_id = %detail.id, provider = "tmdb", "Catalog detail fetched");

        Ok(detail)
    }

    async fn trending(&self) -> AppResult<SearchPage> {
        cached!(
            self.cache,
            CacheKey::Trending,
            LISTING_CACHE_TTL,
            self.listing("/trending/movie/day")
        )
    }

    async fn popular(&self) -> AppResult<SearchPage> {
        cached!(
            self.cache,
            CacheKey::Popular,
            LISTING_CACHE_TTL,
            self.listing("/movie/popular")
        )
    }
}
