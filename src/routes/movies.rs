use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::models::{MovieDetailView, RatingSummary};
use crate::services::catalog::SearchPage;

use super::{ok, AppState, AuthenticatedUser, Envelope};

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
    #[serde(default = "default_page")]
    pub page: u32,
}

fn default_page() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct SubmitRatingRequest {
    pub rating: u8,
    #[serde(default)]
    pub review: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RecommendationsResponse {
    pub recommendations: String,
}

#[derive(Debug, Serialize)]
pub struct ReviewsSummaryResponse {
    pub summary: String,
}

/// Combined movie + TV search
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> AppResult<Json<Envelope<SearchPage>>> {
    let page = state.aggregator.search_catalog(&params.q, params.page).await?;
    Ok(ok(page))
}

pub async fn trending(
    State(state): State<AppState>,
) -> AppResult<Json<Envelope<SearchPage>>> {
    let page = state.aggregator.trending().await?;
    Ok(ok(page))
}

pub async fn popular(State(state): State<AppState>) -> AppResult<Json<Envelope<SearchPage>>> {
    let page = state.aggregator.popular().await?;
    Ok(ok(page))
}

/// Merged detail view: cached mirror + community aggregate + fresh catalog
/// sections when reachable.
pub async fn detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Envelope<MovieDetailView>>> {
    let view = state.aggregator.movie_detail_view(&id).await?;
    Ok(ok(view))
}

/// Community rating submission (upsert per user)
pub async fn submit_rating(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Path(id): Path<String>,
    Json(request): Json<SubmitRatingRequest>,
) -> AppResult<Json<Envelope<RatingSummary>>> {
    let summary = state
        .aggregator
        .submit_rating(&id, user_id, request.rating, request.review)
        .await?;
    Ok(ok(summary))
}

/// AI recommendations, cached on the movie record
pub async fn recommendations(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Envelope<RecommendationsResponse>>> {
    let recommendations = state.aggregator.movie_recommendations(&id).await?;
    Ok(ok(RecommendationsResponse { recommendations }))
}

/// AI summary of catalog viewer reviews, cached on the movie record
pub async fn reviews_summary(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Envelope<ReviewsSummaryResponse>>> {
    let summary = state.aggregator.reviews_summary(&id).await?;
    Ok(ok(ReviewsSummaryResponse { summary }))
}
