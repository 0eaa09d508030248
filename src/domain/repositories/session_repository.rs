//! Repository trait for user accounts and API sessions.

use crate::domain::entities::{CallerIdentity, Role};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// A stored user account.
#[derive(Debug, Clone)]
pub struct UserAccount {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// A stored API session. Only the HMAC of the bearer token is kept.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: i64,
    pub user_id: i64,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

/// Repository interface backing the authentication gate and the admin CLI.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgSessionRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Resolves a token hash to the identity of an active user.
    ///
    /// Returns `Ok(None)` for unknown, revoked or expired sessions and for
    /// inactive users.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn find_identity(&self, token_hash: &str) -> Result<Option<CallerIdentity>, AppError>;

    /// Creates a user account.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the username or email is taken.
    /// Returns [`AppError::Internal`] on database errors.
    async fn create_user(
        &self,
        username: &str,
        email: &str,
        role: Role,
    ) -> Result<UserAccount, AppError>;

    /// Finds a user by username.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn find_user_by_username(&self, username: &str) -> Result<Option<UserAccount>, AppError>;

    /// Stores a new session for a user.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the user does not exist.
    /// Returns [`AppError::Internal`] on database errors.
    async fn create_session(
        &self,
        user_id: i64,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Session, AppError>;

    /// Revokes a session. Returns `Ok(false)` if no active session matched.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn revoke_session(&self, token_hash: &str) -> Result<bool, AppError>;
}
