//! DTOs for campaign management.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::entities::{Campaign, CampaignPatch, CampaignStatus};

/// Request body for `POST /api/campaigns`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCampaignRequest {
    #[validate(length(min = 1, max = 255, message = "Campaign name is required"))]
    pub name: String,

    #[validate(length(max = 2000))]
    pub description: Option<String>,
}

/// Request body for `PATCH /api/campaigns/{id}`.
///
/// `description: null` clears the description.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateCampaignRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,

    #[serde(default, with = "::serde_with::rust::double_option")]
    #[validate(length(max = 2000))]
    pub description: Option<Option<String>>,

    pub status: Option<CampaignStatus>,
}

impl From<UpdateCampaignRequest> for CampaignPatch {
    fn from(req: UpdateCampaignRequest) -> Self {
        CampaignPatch {
            name: req.name,
            description: req.description,
            status: req.status,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CampaignResponse {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub user_id: i64,
    pub status: CampaignStatus,
    pub created_at: DateTime<Utc>,
}

impl From<Campaign> for CampaignResponse {
    fn from(c: Campaign) -> Self {
        CampaignResponse {
            id: c.id,
            name: c.name,
            description: c.description,
            user_id: c.owner_id,
            status: c.status,
            created_at: c.created_at,
        }
    }
}

/// Paginated list of campaigns.
#[derive(Debug, Serialize, Deserialize)]
pub struct CampaignListResponse {
    pub items: Vec<CampaignResponse>,
    pub page: i64,
    pub page_size: i64,
    pub total: i64,
}
