use std::collections::BTreeSet;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{Genre, User, UserProfile, UserStats, WatchedEntry, WatchlistEntry};

use super::{created, message, ok, AppState, AuthenticatedUser, Envelope};

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub avatar_path: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SetPreferencesRequest {
    pub favorite_genres: BTreeSet<Genre>,
}

#[derive(Debug, Deserialize)]
pub struct AddWatchlistRequest {
    pub movie_id: String,
    pub title: String,
    #[serde(default)]
    pub poster_path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MarkWatchedRequest {
    pub movie_id: String,
    pub title: String,
    #[serde(default)]
    pub rating: Option<u8>,
    #[serde(default)]
    pub review: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeactivateRequest {
    pub password: String,
}

/// Account payload returned to clients; the credential hash stays private.
#[derive(Debug, Serialize)]
pub struct UserView {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub profile: UserProfile,
    pub favorite_genres: BTreeSet<Genre>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            profile: user.profile,
            favorite_genres: user.favorite_genres,
            is_active: user.is_active,
            created_at: user.created_at,
            last_login: user.last_login,
        }
    }
}

// Handlers

pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<Envelope<UserView>>)> {
    let user = state
        .accounts
        .register(request.username, request.email, request.password)
        .await?;
    Ok(created(UserView::from(user)))
}

/// Credential check + `last_login` stamp; token issuance stays with the
/// external identity collaborator.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<Envelope<UserView>>> {
    let user = state
        .accounts
        .login(&request.username, &request.password)
        .await?;
    Ok(ok(UserView::from(user)))
}

pub async fn profile(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
) -> AppResult<Json<Envelope<UserView>>> {
    let user = state.accounts.profile(user_id).await?;
    Ok(ok(UserView::from(user)))
}

pub async fn update_profile(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Json(request): Json<UpdateProfileRequest>,
) -> AppResult<Json<Envelope<UserView>>> {
    let profile = UserProfile {
        name: request.name,
        avatar_path: request.avatar_path,
        bio: request.bio,
    };
    let user = state.accounts.update_profile(user_id, profile).await?;
    Ok(ok(UserView::from(user)))
}

pub async fn set_preferences(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Json(request): Json<SetPreferencesRequest>,
) -> AppResult<Json<Envelope<UserView>>> {
    let user = state
        .accounts
        .set_favorite_genres(user_id, request.favorite_genres)
        .await?;
    Ok(ok(UserView::from(user)))
}

pub async fn watchlist(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
) -> AppResult<Json<Envelope<Vec<WatchlistEntry>>>> {
    let user = state.accounts.profile(user_id).await?;
    Ok(ok(user.watchlist.iter().cloned().collect()))
}

pub async fn add_to_watchlist(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Json(request): Json<AddWatchlistRequest>,
) -> AppResult<(StatusCode, Json<Envelope<Vec<WatchlistEntry>>>)> {
    let user = state
        .aggregator
        .add_to_watchlist(user_id, request.movie_id, request.title, request.poster_path)
        .await?;
    Ok(created(user.watchlist.iter().cloned().collect()))
}

pub async fn remove_from_watchlist(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Path(movie_id): Path<String>,
) -> AppResult<Json<Envelope<Vec<WatchlistEntry>>>> {
    let user = state
        .aggregator
        .remove_from_watchlist(user_id, &movie_id)
        .await?;
    Ok(ok(user.watchlist.iter().cloned().collect()))
}

pub async fn watched(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
) -> AppResult<Json<Envelope<Vec<WatchedEntry>>>> {
    let user = state.accounts.profile(user_id).await?;
    Ok(ok(user.watched.iter().cloned().collect()))
}

pub async fn mark_watched(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Json(request): Json<MarkWatchedRequest>,
) -> AppResult<Json<Envelope<Vec<WatchedEntry>>>> {
    let user = state
        .aggregator
        .mark_watched(
            user_id,
            request.movie_id,
            request.title,
            request.rating,
            request.review,
        )
        .await?;
    Ok(ok(user.watched.iter().cloned().collect()))
}

pub async fn stats(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
) -> AppResult<Json<Envelope<UserStats>>> {
    let stats = state.aggregator.user_stats(user_id).await?;
    Ok(ok(stats))
}

pub async fn deactivate(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Json(request): Json<DeactivateRequest>,
) -> AppResult<Json<Envelope<()>>> {
    state.accounts.deactivate(user_id, &request.password).await?;
    Ok(message("account deactivated"))
}
