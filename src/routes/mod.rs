use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    middleware::from_fn,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::request_id::{make_span_with_request_id, request_id_middleware};
use crate::services::{AccountService, Aggregator, ChatService};

pub mod chat;
pub mod movies;
pub mod users;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub aggregator: Arc<Aggregator>,
    pub accounts: Arc<AccountService>,
    pub chat: Arc<ChatService>,
}

/// Standard response envelope: `{success, data?, message?}`.
#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

pub fn ok<T: Serialize>(data: T) -> Json<Envelope<T>> {
    Json(Envelope {
        success: true,
        data: Some(data),
        message: None,
    })
}

pub fn created<T: Serialize>(data: T) -> (StatusCode, Json<Envelope<T>>) {
    (StatusCode::CREATED, ok(data))
}

pub fn message(text: impl Into<String>) -> Json<Envelope<()>> {
    Json(Envelope {
        success: true,
        data: None,
        message: Some(text.into()),
    })
}

/// Authenticated identity produced by the external auth collaborator.
///
/// The upstream proxy/middleware resolves credentials and forwards the
/// account ID in `x-user-id`; here it only gets parsed.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser(pub Uuid);

#[async_trait::async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get("x-user-id")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| Uuid::parse_str(value).ok())
            .map(AuthenticatedUser)
            .ok_or_else(|| {
                AppError::Unauthorized("missing or invalid x-user-id header".to_string())
            })
    }
}

/// Creates the application router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_routes())
        .layer(
            TraceLayer::new_for_http().make_span_with(make_span_with_request_id),
        )
        .layer(from_fn(request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// API routes under /api
fn api_routes() -> Router<AppState> {
    Router::new()
        // Movies
        .route("/movies/search", get(movies::search))
        .route("/movies/trending", get(movies::trending))
        .route("/movies/popular", get(movies::popular))
        .route("/movies/:id", get(movies::detail))
        .route("/movies/:id/rating", post(movies::submit_rating))
        .route("/movies/:id/recommendations", get(movies::recommendations))
        .route("/movies/:id/reviews-summary", get(movies::reviews_summary))
        // Users
        .route("/users/register", post(users::register))
        .route("/users/login", post(users::login))
        .route("/users/profile", get(users::profile).put(users::update_profile))
        .route("/users/preferences", put(users::set_preferences))
        .route("/users/watchlist", get(users::watchlist).post(users::add_to_watchlist))
        .route("/users/watchlist/:movie_id", delete(users::remove_from_watchlist))
        .route("/users/watched", get(users::watched).post(users::mark_watched))
        .route("/users/stats", get(users::stats))
        .route("/users/deactivate", post(users::deactivate))
        // Chat
        .route("/chat", post(chat::send))
        .route("/chat/history", get(chat::history).delete(chat::clear))
        .route("/chat/suggestions", get(chat::suggestions))
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
