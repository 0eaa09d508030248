//! PostgreSQL implementation of session repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use std::sync::Arc;

use crate::domain::entities::{CallerIdentity, Role};
use crate::domain::repositories::{Session, SessionRepository, UserAccount};
use crate::error::AppError;

#[derive(Debug, FromRow)]
struct UserRow {
    id: i64,
    username: String,
    email: String,
    role: String,
    status: String,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for UserAccount {
    fn from(row: UserRow) -> Self {
        UserAccount {
            id: row.id,
            username: row.username,
            email: row.email,
            role: Role::from_db(&row.role),
            status: row.status,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct SessionRow {
    id: i64,
    user_id: i64,
    token_hash: String,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    revoked_at: Option<DateTime<Utc>>,
}

impl From<SessionRow> for Session {
    fn from(row: SessionRow) -> Self {
        Session {
            id: row.id,
            user_id: row.user_id,
            token_hash: row.token_hash,
            expires_at: row.expires_at,
            created_at: row.created_at,
            revoked_at: row.revoked_at,
        }
    }
}

/// PostgreSQL repository for users and API sessions.
///
/// Stores only HMAC-SHA256 hashes of bearer tokens, never the raw values.
pub struct PgSessionRepository {
    pool: Arc<PgPool>,
}

impl PgSessionRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionRepository for PgSessionRepository {
    async fn find_identity(&self, token_hash: &str) -> Result<Option<CallerIdentity>, AppError> {
        let row: Option<(i64, String, String)> = sqlx::query_as(
            r#"
            SELECT u.id, u.username, u.role
            FROM user_sessions s
            JOIN users u ON u.id = s.user_id
            WHERE s.token_hash = $1
              AND s.revoked_at IS NULL
              AND s.expires_at > NOW()
              AND u.status = 'active'
            "#,
        )
        .bind(token_hash)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(|(user_id, username, role)| CallerIdentity {
            user_id,
            username,
            role: Role::from_db(&role),
        }))
    }

    async fn create_user(
        &self,
        username: &str,
        email: &str,
        role: Role,
    ) -> Result<UserAccount, AppError> {
        let role = match role {
            Role::Admin => "admin",
            Role::Member => "member",
        };

        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (username, email, role)
            VALUES ($1, $2, $3)
            RETURNING id, username, email, role, status, created_at
            "#,
        )
        .bind(username)
        .bind(email)
        .bind(role)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(row.into())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<UserAccount>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, email, role, status, created_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(Into::into))
    }

    async fn create_session(
        &self,
        user_id: i64,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Session, AppError> {
        let row = sqlx::query_as::<_, SessionRow>(
            r#"
            INSERT INTO user_sessions (user_id, token_hash, expires_at)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, token_hash, expires_at, created_at, revoked_at
            "#,
        )
        .bind(user_id)
        .bind(token_hash)
        .bind(expires_at)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(row.into())
    }

    async fn revoke_session(&self, token_hash: &str) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE user_sessions SET revoked_at = NOW() WHERE token_hash = $1 AND revoked_at IS NULL",
        )
        .bind(token_hash)
        .execute(self.pool.as_ref())
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
