use std::fmt::Write as _;
use std::sync::Arc;

use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{ChatTurn, User, CHAT_HISTORY_LIMIT};
use crate::services::generator::ContentGenerator;
use crate::store::UserStore;

/// How many past turns are replayed into the prompt.
const CONTEXT_TURNS: usize = 5;

/// How many recently watched titles are summarized into the prompt.
const CONTEXT_WATCHED: usize = 3;

const CHAT_SYSTEM_INSTRUCTION: &str = "You are a friendly, knowledgeable movie and TV \
assistant. Answer questions about films and shows, help users decide what to watch \
next, and keep replies concise and conversational.";

const SUGGESTIONS_SYSTEM_INSTRUCTION: &str = "You are a movie assistant. Produce 3 short \
conversation-starter questions a user might ask about movies, one per line, tailored \
to their tastes when known.";

/// Bounded context handed to the content generator for one chat turn.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptBundle {
    pub system_instruction: String,
    pub prompt: String,
}

/// Assembles a bounded prompt from the user's history and tastes: the most
/// recent 5 turns in order, the caller's free-text context, at most one
/// favorite-genre line, and up to 3 recently watched titles with ratings.
pub fn build_chat_context(user: &User, message: &str, context: Option<&str>) -> PromptBundle {
    let mut prompt = String::new();

    for turn in user.chat_history.last_n(CONTEXT_TURNS) {
        let _ = writeln!(prompt, "User: {}", turn.message);
        let _ = writeln!(prompt, "Assistant: {}", turn.response);
    }

    if let Some(context) = context.filter(|c| !c.trim().is_empty()) {
        let _ = writeln!(prompt, "Context: {}", context.trim());
    }

    if !user.favorite_genres.is_empty() {
        let genres: Vec<String> = user
            .favorite_genres
            .iter()
            .map(|genre| genre.to_string())
            .collect();
        let _ = writeln!(prompt, "Favorite genres: {}", genres.join(", "));
    }

    let watched: Vec<String> = user
        .watched
        .last_n(CONTEXT_WATCHED)
        .iter()
        .map(|entry| match entry.rating {
            Some(rating) => format!("{} ({}/10)", entry.title, rating),
            None => entry.title.clone(),
        })
        .collect();
    if !watched.is_empty() {
        let _ = writeln!(prompt, "Recently watched: {}", watched.join(", "));
    }

    let _ = write!(prompt, "User: {}", message);

    PromptBundle {
        system_instruction: CHAT_SYSTEM_INSTRUCTION.to_string(),
        prompt,
    }
}

/// Chat orchestration: prompt assembly, delegation to the generator, and
/// bounded history persistence.
pub struct ChatService {
    users: Arc<dyn UserStore>,
    generator: Arc<dyn ContentGenerator>,
}

impl ChatService {
    pub fn new(users: Arc<dyn UserStore>, generator: Arc<dyn ContentGenerator>) -> Self {
        Self { users, generator }
    }

    async fn active_user(&self, user_id: Uuid) -> AppResult<User> {
        let user = self
            .users
            .get(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user {} not found", user_id)))?;
        if !user.is_active {
            return Err(AppError::Unauthorized("account is deactivated".to_string()));
        }
        Ok(user)
    }

    /// Runs one chat turn end to end and returns the cleaned response.
    pub async fn send(
        &self,
        user_id: Uuid,
        message: &str,
        context: Option<&str>,
    ) -> AppResult<String> {
        if message.trim().is_empty() {
            return Err(AppError::Validation("message cannot be empty".to_string()));
        }

        let user = self.active_user(user_id).await?;
        let bundle = build_chat_context(&user, message, context);

        let response = self
            .generator
            .generate(&bundle.prompt, &bundle.system_instruction)
            .await?;

        self.append_chat_turn(user_id, message.to_string(), response.clone())
            .await?;

        Ok(response)
    }

    /// Appends one turn and trims the history to the most recent 50,
    /// oldest evicted first.
    pub async fn append_chat_turn(
        &self,
        user_id: Uuid,
        message: String,
        response: String,
    ) -> AppResult<User> {
        self.users
            .mutate(
                user_id,
                Box::new(move |user| {
                    user.chat_history
                        .push_bounded(ChatTurn::new(message, response), CHAT_HISTORY_LIMIT);
                    Ok(())
                }),
            )
            .await
    }

    pub async fn history(&self, user_id: Uuid) -> AppResult<Vec<ChatTurn>> {
        let user = self.active_user(user_id).await?;
        Ok(user.chat_history.iter().cloned().collect())
    }

    pub async fn clear(&self, user_id: Uuid) -> AppResult<()> {
        self.users
            .mutate(
                user_id,
                Box::new(|user| {
                    user.chat_history = Default::default();
                    Ok(())
                }),
            )
            .await?;
        Ok(())
    }

    /// Conversation-starter suggestions tailored to the user's tastes.
    pub async fn suggestions(&self, user_id: Uuid) -> AppResult<String> {
        let user = self.active_user(user_id).await?;
        let bundle = build_chat_context(&user, "What should I ask about?", None);

        self.generator
            .generate(&bundle.prompt, SUGGESTIONS_SYSTEM_INSTRUCTION)
            .await
    }
}
