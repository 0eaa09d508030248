//! PostgreSQL implementation of link repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use std::sync::Arc;

use crate::domain::entities::{
    LinkPatch, LinkStatus, NewTrackingLink, Restrictions, TrackingLink,
};
use crate::domain::repositories::LinkRepository;
use crate::domain::restrictions::{parse_stored, parse_stored_time, to_stored};
use crate::error::AppError;
use serde_json::json;

macro_rules! link_columns {
    () => {
        "id, campaign_id, user_id, original_url, tracking_token, recipient_email, \
         recipient_name, link_status, created_at, expires_at, click_limit, click_count, \
         last_clicked, custom_message, redirect_delay, access_password, geo_restrictions, \
         device_restrictions, time_restrictions"
    };
}

/// Raw `tracking_links` row.
#[derive(Debug, FromRow)]
struct LinkRow {
    id: i64,
    campaign_id: Option<i64>,
    user_id: i64,
    original_url: String,
    tracking_token: String,
    recipient_email: Option<String>,
    recipient_name: Option<String>,
    link_status: String,
    created_at: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
    click_limit: i32,
    click_count: i32,
    last_clicked: Option<DateTime<Utc>>,
    custom_message: Option<String>,
    redirect_delay: i32,
    access_password: Option<String>,
    geo_restrictions: Option<String>,
    device_restrictions: Option<String>,
    time_restrictions: Option<String>,
}

impl From<LinkRow> for TrackingLink {
    fn from(row: LinkRow) -> Self {
        let status = row.link_status.parse().unwrap_or_else(|e| {
            tracing::warn!(link_id = row.id, error = %e, "Unknown link status, treating as paused");
            LinkStatus::Paused
        });

        let restrictions = Restrictions {
            geo: parse_stored("geo_restrictions", row.geo_restrictions.as_deref()),
            device: parse_stored("device_restrictions", row.device_restrictions.as_deref()),
            time: parse_stored_time(row.time_restrictions.as_deref()),
        };

        TrackingLink {
            id: row.id,
            token: row.tracking_token,
            destination_url: row.original_url,
            owner_id: row.user_id,
            campaign_id: row.campaign_id,
            recipient_email: row.recipient_email,
            recipient_name: row.recipient_name,
            status,
            created_at: row.created_at,
            expires_at: row.expires_at,
            click_limit: row.click_limit,
            click_count: row.click_count,
            last_clicked: row.last_clicked,
            custom_message: row.custom_message,
            redirect_delay: row.redirect_delay,
            access_password_hash: row.access_password,
            restrictions,
        }
    }
}

/// PostgreSQL repository for tracking link definitions.
///
/// Restriction columns hold JSON text and are parsed when a row is loaded.
pub struct PgLinkRepository {
    pool: Arc<PgPool>,
}

impl PgLinkRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LinkRepository for PgLinkRepository {
    async fn create(&self, new_link: NewTrackingLink) -> Result<TrackingLink, AppError> {
        let r = &new_link.restrictions;

        let row = sqlx::query_as::<_, LinkRow>(concat!(
            "INSERT INTO tracking_links (tracking_token, original_url, user_id, campaign_id, \
             recipient_email, recipient_name, expires_at, click_limit, custom_message, \
             redirect_delay, access_password, geo_restrictions, device_restrictions, \
             time_restrictions) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) \
             RETURNING ",
            link_columns!()
        ))
        .bind(&new_link.token)
        .bind(&new_link.destination_url)
        .bind(new_link.owner_id)
        .bind(new_link.campaign_id)
        .bind(&new_link.recipient_email)
        .bind(&new_link.recipient_name)
        .bind(new_link.expires_at)
        .bind(new_link.click_limit)
        .bind(&new_link.custom_message)
        .bind(new_link.redirect_delay)
        .bind(&new_link.access_password_hash)
        .bind(to_stored(r.geo.as_ref()))
        .bind(to_stored(r.device.as_ref()))
        .bind(to_stored(r.time.as_ref()))
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(row.into())
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<TrackingLink>, AppError> {
        let row = sqlx::query_as::<_, LinkRow>(concat!(
            "SELECT ",
            link_columns!(),
            " FROM tracking_links WHERE tracking_token = $1"
        ))
        .bind(token)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(Into::into))
    }

    async fn find_by_id(
        &self,
        id: i64,
        owner_scope: Option<i64>,
    ) -> Result<Option<TrackingLink>, AppError> {
        let row = sqlx::query_as::<_, LinkRow>(concat!(
            "SELECT ",
            link_columns!(),
            " FROM tracking_links WHERE id = $1 AND ($2::bigint IS NULL OR user_id = $2)"
        ))
        .bind(id)
        .bind(owner_scope)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(Into::into))
    }

    async fn list(
        &self,
        owner_scope: Option<i64>,
        page: i64,
        page_size: i64,
    ) -> Result<Vec<TrackingLink>, AppError> {
        let offset = (page - 1) * page_size;

        let rows = sqlx::query_as::<_, LinkRow>(concat!(
            "SELECT ",
            link_columns!(),
            " FROM tracking_links \
             WHERE ($1::bigint IS NULL OR user_id = $1) \
             ORDER BY created_at DESC, id DESC \
             LIMIT $2 OFFSET $3"
        ))
        .bind(owner_scope)
        .bind(page_size)
        .bind(offset)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn count(&self, owner_scope: Option<i64>) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM tracking_links WHERE ($1::bigint IS NULL OR user_id = $1)",
        )
        .bind(owner_scope)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(count)
    }

    async fn update(
        &self,
        id: i64,
        owner_scope: Option<i64>,
        patch: LinkPatch,
    ) -> Result<TrackingLink, AppError> {
        if patch.is_empty() {
            return self
                .find_by_id(id, owner_scope)
                .await?
                .ok_or_else(|| AppError::not_found("Tracking link not found", json!({ "id": id })));
        }

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE tracking_links SET ");

        {
            let mut set = builder.separated(", ");

            if let Some(v) = patch.destination_url {
                set.push("original_url = ").push_bind_unseparated(v);
            }
            if let Some(v) = patch.campaign_id {
                set.push("campaign_id = ").push_bind_unseparated(v);
            }
            if let Some(v) = patch.recipient_email {
                set.push("recipient_email = ").push_bind_unseparated(v);
            }
            if let Some(v) = patch.recipient_name {
                set.push("recipient_name = ").push_bind_unseparated(v);
            }
            if let Some(v) = patch.status {
                set.push("link_status = ").push_bind_unseparated(v.as_str());
            }
            if let Some(v) = patch.expires_at {
                set.push("expires_at = ").push_bind_unseparated(v);
            }
            if let Some(v) = patch.click_limit {
                set.push("click_limit = ").push_bind_unseparated(v);
            }
            if let Some(v) = patch.custom_message {
                set.push("custom_message = ").push_bind_unseparated(v);
            }
            if let Some(v) = patch.redirect_delay {
                set.push("redirect_delay = ").push_bind_unseparated(v);
            }
            if let Some(v) = patch.access_password_hash {
                set.push("access_password = ").push_bind_unseparated(v);
            }
            if let Some(v) = patch.geo {
                set.push("geo_restrictions = ")
                    .push_bind_unseparated(to_stored(v.as_ref()));
            }
            if let Some(v) = patch.device {
                set.push("device_restrictions = ")
                    .push_bind_unseparated(to_stored(v.as_ref()));
            }
            if let Some(v) = patch.time {
                set.push("time_restrictions = ")
                    .push_bind_unseparated(to_stored(v.as_ref()));
            }
        }

        builder.push(" WHERE id = ").push_bind(id);
        if let Some(owner) = owner_scope {
            builder.push(" AND user_id = ").push_bind(owner);
        }
        builder.push(concat!(" RETURNING ", link_columns!()));

        let row = builder
            .build_query_as::<LinkRow>()
            .fetch_optional(self.pool.as_ref())
            .await?;

        row.map(Into::into)
            .ok_or_else(|| AppError::not_found("Tracking link not found", json!({ "id": id })))
    }

    async fn delete(&self, id: i64, owner_scope: Option<i64>) -> Result<bool, AppError> {
        let result = sqlx::query(
            "DELETE FROM tracking_links WHERE id = $1 AND ($2::bigint IS NULL OR user_id = $2)",
        )
        .bind(id)
        .bind(owner_scope)
        .execute(self.pool.as_ref())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(self.pool.as_ref()).await?;
        Ok(())
    }
}
