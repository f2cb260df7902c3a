use std::collections::BTreeSet;
use std::sync::Arc;

use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::Utc;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Genre, User, UserProfile};
use crate::store::UserStore;

const PASSWORD_MIN_LENGTH: usize = 8;

/// Seam for the external identity collaborator's credential primitive.
#[cfg_attr(test, mockall::automock)]
pub trait CredentialVerifier: Send + Sync {
    fn hash(&self, password: &str) -> AppResult<String>;

    fn verify(&self, password: &str, password_hash: &str) -> bool;
}

/// Argon2id-backed credential verifier.
#[derive(Clone, Default)]
pub struct Argon2Verifier;

impl CredentialVerifier for Argon2Verifier {
    fn hash(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AppError::Internal(format!("password hashing failed: {}", e)))
    }

    fn verify(&self, password: &str, password_hash: &str) -> bool {
        PasswordHash::new(password_hash)
            .map(|parsed| {
                Argon2::default()
                    .verify_password(password.as_bytes(), &parsed)
                    .is_ok()
            })
            .unwrap_or(false)
    }
}

/// Account lifecycle: registration, profile and preference updates, and
/// soft deactivation.
pub struct AccountService {
    users: Arc<dyn UserStore>,
    credentials: Arc<dyn CredentialVerifier>,
}

impl AccountService {
    pub fn new(users: Arc<dyn UserStore>, credentials: Arc<dyn CredentialVerifier>) -> Self {
        Self { users, credentials }
    }

    pub async fn register(
        &self,
        username: String,
        email: String,
        password: String,
    ) -> AppResult<User> {
        let username = username.trim().to_string();
        if username.is_empty() {
            return Err(AppError::Validation("username cannot be empty".to_string()));
        }
        if !email.contains('@') {
            return Err(AppError::Validation("invalid email address".to_string()));
        }
        if password.len() < PASSWORD_MIN_LENGTH {
            return Err(AppError::Validation(format!(
                "password must be at least {} characters",
                PASSWORD_MIN_LENGTH
            )));
        }

        let password_hash = self.credentials.hash(&password)?;
        let user = User::new(username, email, password_hash);

        self.users.insert(user.clone()).await?;

        tracing::info!(user_id = %user.id, username = %user.username, "Account registered");

        Ok(user)
    }

    /// Verifies credentials and stamps `last_login`.
    ///
    /// Token issuance belongs to the external identity collaborator; this
    /// only authenticates the password and records the event. Unknown
    /// usernames and wrong passwords get the same answer.
    pub async fn login(&self, username: &str, password: &str) -> AppResult<User> {
        let user = self
            .users
            .find_by_username(username)
            .await?
            .ok_or_else(|| AppError::Unauthorized("invalid username or password".to_string()))?;

        if !self.credentials.verify(password, &user.password_hash) {
            return Err(AppError::Unauthorized(
                "invalid username or password".to_string(),
            ));
        }
        if !user.is_active {
            return Err(AppError::Unauthorized("account is deactivated".to_string()));
        }

        let user = self.record_login(user.id).await?;

        tracing::info!(user_id = %user.id, username = %user.username, "Login recorded");

        Ok(user)
    }

    pub async fn profile(&self, user_id: Uuid) -> AppResult<User> {
        self.users
            .get(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user {} not found", user_id)))
    }

    pub async fn update_profile(&self, user_id: Uuid, profile: UserProfile) -> AppResult<User> {
        self.users
            .mutate(
                user_id,
                Box::new(move |user| {
                    user.profile = profile;
                    Ok(())
                }),
            )
            .await
    }

    pub async fn set_favorite_genres(
        &self,
        user_id: Uuid,
        genres: BTreeSet<Genre>,
    ) -> AppResult<User> {
        self.users
            .mutate(
                user_id,
                Box::new(move |user| {
                    user.favorite_genres = genres;
                    Ok(())
                }),
            )
            .await
    }

    pub async fn record_login(&self, user_id: Uuid) -> AppResult<User> {
        self.users
            .mutate(
                user_id,
                Box::new(|user| {
                    user.last_login = Some(Utc::now());
                    Ok(())
                }),
            )
            .await
    }

    /// Soft-deletes the account after re-verifying the password. The
    /// document is never removed; community ratings referencing the user
    /// stay in place.
    pub async fn deactivate(&self, user_id: Uuid, password: &str) -> AppResult<()> {
        let user = self.profile(user_id).await?;

        if !self.credentials.verify(password, &user.password_hash) {
            return Err(AppError::Unauthorized("password does not match".to_string()));
        }

        self.users
            .mutate(
                user_id,
                Box::new(|user| {
                    user.is_active = false;
                    Ok(())
                }),
            )
            .await?;

        tracing::info!(user_id = %user_id, "Account deactivated");

        Ok(())
    }
}
