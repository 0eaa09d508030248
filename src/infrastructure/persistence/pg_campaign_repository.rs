//! PostgreSQL implementation of campaign repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use std::sync::Arc;

use crate::domain::entities::{Campaign, CampaignPatch, CampaignStatus, NewCampaign};
use crate::domain::repositories::CampaignRepository;
use crate::error::AppError;

const CAMPAIGN_COLUMNS: &str = "id, name, description, user_id, status, created_at";

#[derive(Debug, FromRow)]
struct CampaignRow {
    id: i64,
    name: String,
    description: Option<String>,
    user_id: i64,
    status: String,
    created_at: DateTime<Utc>,
}

impl From<CampaignRow> for Campaign {
    fn from(row: CampaignRow) -> Self {
        let status = row.status.parse().unwrap_or_else(|e| {
            tracing::warn!(campaign_id = row.id, error = %e, "Unknown campaign status, treating as paused");
            CampaignStatus::Paused
        });

        Campaign {
            id: row.id,
            name: row.name,
            description: row.description,
            owner_id: row.user_id,
            status,
            created_at: row.created_at,
        }
    }
}

/// PostgreSQL repository for campaigns.
pub struct PgCampaignRepository {
    pool: Arc<PgPool>,
}

impl PgCampaignRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CampaignRepository for PgCampaignRepository {
    async fn create(&self, new_campaign: NewCampaign) -> Result<Campaign, AppError> {
        let row = sqlx::query_as::<_, CampaignRow>(&format!(
            "INSERT INTO campaigns (name, description, user_id) VALUES ($1, $2, $3) \
             RETURNING {CAMPAIGN_COLUMNS}"
        ))
        .bind(&new_campaign.name)
        .bind(&new_campaign.description)
        .bind(new_campaign.owner_id)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(row.into())
    }

    async fn find_by_id(
        &self,
        id: i64,
        owner_scope: Option<i64>,
    ) -> Result<Option<Campaign>, AppError> {
        let row = sqlx::query_as::<_, CampaignRow>(&format!(
            "SELECT {CAMPAIGN_COLUMNS} FROM campaigns \
             WHERE id = $1 AND ($2::bigint IS NULL OR user_id = $2)"
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
    ) -> Result<Vec<Campaign>, AppError> {
        let offset = (page - 1) * page_size;

        let rows = sqlx::query_as::<_, CampaignRow>(&format!(
            "SELECT {CAMPAIGN_COLUMNS} FROM campaigns \
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
            "SELECT COUNT(*) FROM campaigns WHERE ($1::bigint IS NULL OR user_id = $1)",
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
        patch: CampaignPatch,
    ) -> Result<Campaign, AppError> {
        if patch.is_empty() {
            return self
                .find_by_id(id, owner_scope)
                .await?
                .ok_or_else(|| AppError::not_found("Campaign not found", json!({ "id": id })));
        }

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE campaigns SET ");

        {
            let mut set = builder.separated(", ");

            if let Some(v) = patch.name {
                set.push("name = ").push_bind_unseparated(v);
            }
            if let Some(v) = patch.description {
                set.push("description = ").push_bind_unseparated(v);
            }
            if let Some(v) = patch.status {
                set.push("status = ").push_bind_unseparated(v.as_str());
            }
        }

        builder.push(" WHERE id = ").push_bind(id);
        if let Some(owner) = owner_scope {
            builder.push(" AND user_id = ").push_bind(owner);
        }
        builder.push(" RETURNING ").push(CAMPAIGN_COLUMNS);

        let row = builder
            .build_query_as::<CampaignRow>()
            .fetch_optional(self.pool.as_ref())
            .await?;

        row.map(Into::into)
            .ok_or_else(|| AppError::not_found("Campaign not found", json!({ "id": id })))
    }

    async fn delete(&self, id: i64, owner_scope: Option<i64>) -> Result<bool, AppError> {
        // tracking_links.campaign_id is ON DELETE SET NULL
        let result = sqlx::query(
            "DELETE FROM campaigns WHERE id = $1 AND ($2::bigint IS NULL OR user_id = $2)",
        )
        .bind(id)
        .bind(owner_scope)
        .execute(self.pool.as_ref())
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
