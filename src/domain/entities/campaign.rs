//! Campaign entity. A campaign groups tracking links under one owner.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Campaign lifecycle status.
///
/// Informational only: link resolution never looks at the campaign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    Active,
    Paused,
    Completed,
    Archived,
}

impl CampaignStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CampaignStatus::Active => "active",
            CampaignStatus::Paused => "paused",
            CampaignStatus::Completed => "completed",
            CampaignStatus::Archived => "archived",
        }
    }
}

impl fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CampaignStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(CampaignStatus::Active),
            "paused" => Ok(CampaignStatus::Paused),
            "completed" => Ok(CampaignStatus::Completed),
            "archived" => Ok(CampaignStatus::Archived),
            other => Err(format!("unknown campaign status '{other}'")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Campaign {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub owner_id: i64,
    pub status: CampaignStatus,
    pub created_at: DateTime<Utc>,
}

/// Input data for creating a campaign. New campaigns start active.
#[derive(Debug, Clone)]
pub struct NewCampaign {
    pub name: String,
    pub description: Option<String>,
    pub owner_id: i64,
}

/// Partial update. `description: Some(None)` clears the description.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CampaignPatch {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub status: Option<CampaignStatus>,
}

impl CampaignPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.status.is_none()
    }

    /// Applies the patch to an in-memory campaign.
    pub fn apply_to(self, campaign: &mut Campaign) {
        if let Some(v) = self.name {
            campaign.name = v;
        }
        if let Some(v) = self.description {
            campaign.description = v;
        }
        if let Some(v) = self.status {
            campaign.status = v;
        }
    }
}
