use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::models::ChatTurn;

use super::{message, ok, AppState, AuthenticatedUser, Envelope};

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub message: String,
    #[serde(default)]
    pub context: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
}

#[derive(Debug, Serialize)]
pub struct SuggestionsResponse {
    pub suggestions: String,
}

/// One chat turn: assemble context, generate, persist, respond.
pub async fn send(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Json(request): Json<SendMessageRequest>,
) -> AppResult<Json<Envelope<ChatResponse>>> {
    let response = state
        .chat
        .send(user_id, &request.message, request.context.as_deref())
        .await?;
    Ok(ok(ChatResponse { response }))
}

pub async fn history(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
) -> AppResult<Json<Envelope<Vec<ChatTurn>>>> {
    let turns = state.chat.history(user_id).await?;
    Ok(ok(turns))
}

pub async fn clear(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
) -> AppResult<Json<Envelope<()>>> {
    state.chat.clear(user_id).await?;
    Ok(message("chat history cleared"))
}

pub async fn suggestions(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
) -> AppResult<Json<Envelope<SuggestionsResponse>>> {
    let suggestions = state.chat.suggestions(user_id).await?;
    Ok(ok(SuggestionsResponse { suggestions }))
}
