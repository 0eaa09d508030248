//! PostgreSQL implementation of event repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use std::sync::Arc;

use crate::domain::entities::{NewTrackingEvent, TrackingEvent, TrackingLink};
use crate::domain::repositories::{ClickRecord, EventRepository};
use crate::error::AppError;

/// Raw `tracking_events` row.
#[derive(Debug, FromRow)]
struct EventRow {
    id: i64,
    tracking_token: String,
    event_type: String,
    ip_address: Option<String>,
    user_agent: Option<String>,
    referrer: Option<String>,
    country: Option<String>,
    city: Option<String>,
    device_type: Option<String>,
    browser: Option<String>,
    os: Option<String>,
    timestamp: DateTime<Utc>,
    campaign_id: Option<i64>,
    user_id: Option<i64>,
    is_bot: bool,
    bot_confidence: f64,
    bot_reason: Option<String>,
}

impl From<EventRow> for TrackingEvent {
    fn from(row: EventRow) -> Self {
        TrackingEvent {
            id: row.id,
            token: row.tracking_token,
            event_type: row.event_type,
            timestamp: row.timestamp,
            source_address: row.ip_address,
            client_signature: row.user_agent,
            referrer: row.referrer,
            country: row.country,
            city: row.city,
            device_family: row.device_type,
            browser_family: row.browser,
            platform_family: row.os,
            is_bot: row.is_bot,
            bot_confidence: row.bot_confidence,
            bot_reason: row.bot_reason,
            campaign_id: row.campaign_id,
            owner_id: row.user_id,
        }
    }
}

/// PostgreSQL repository for click recording.
///
/// The counter increment and the event insert share one transaction. The
/// increment is a conditional `UPDATE`, so the row lock it takes serialises
/// concurrent clicks on the same link only for the length of that
/// transaction.
pub struct PgEventRepository {
    pool: Arc<PgPool>,
}

impl PgEventRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventRepository for PgEventRepository {
    async fn record_click(
        &self,
        link: &TrackingLink,
        event: NewTrackingEvent,
    ) -> Result<ClickRecord, AppError> {
        let mut tx = self.pool.begin().await?;

        let new_count: Option<i32> = sqlx::query_scalar(
            r#"
            UPDATE tracking_links
            SET click_count = click_count + 1, last_clicked = $2
            WHERE id = $1 AND (click_limit = 0 OR click_count < click_limit)
            RETURNING click_count
            "#,
        )
        .bind(link.id)
        .bind(event.timestamp)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(new_count) = new_count else {
            tx.rollback().await?;
            return Ok(ClickRecord::LimitReached);
        };

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO tracking_events (
                tracking_token, event_type, ip_address, user_agent, referrer,
                country, city, device_type, browser, os, timestamp,
                campaign_id, user_id, is_bot, bot_confidence, bot_reason
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            RETURNING id
            "#,
        )
        .bind(&event.token)
        .bind(&event.event_type)
        .bind(&event.source_address)
        .bind(&event.client_signature)
        .bind(&event.referrer)
        .bind(&event.country)
        .bind(&event.city)
        .bind(&event.device_family)
        .bind(&event.browser_family)
        .bind(&event.platform_family)
        .bind(event.timestamp)
        .bind(event.campaign_id)
        .bind(event.owner_id)
        .bind(event.is_bot)
        .bind(event.bot_confidence)
        .bind(&event.bot_reason)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::trace!(link_id = link.id, click_count = new_count, event_id = id, "Click committed");

        Ok(ClickRecord::Recorded(event.into_event(id)))
    }

    async fn list_by_token(&self, token: &str, limit: i64) -> Result<Vec<TrackingEvent>, AppError> {
        let rows = sqlx::query_as::<_, EventRow>(
            r#"
            SELECT id, tracking_token, event_type, ip_address, user_agent, referrer,
                   country, city, device_type, browser, os, timestamp,
                   campaign_id, user_id, is_bot, bot_confidence, bot_reason
            FROM tracking_events
            WHERE tracking_token = $1
            ORDER BY timestamp DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(token)
        .bind(limit)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
