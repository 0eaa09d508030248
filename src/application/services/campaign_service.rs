//! Campaign management for the authenticated API.

use std::sync::Arc;

use serde_json::json;

use crate::domain::entities::{CallerIdentity, Campaign, CampaignPatch, NewCampaign};
use crate::domain::repositories::CampaignRepository;
use crate::error::AppError;

const MAX_NAME_LEN: usize = 255;

/// Service for campaign CRUD.
///
/// Scoping matches [`crate::application::services::LinkService`]: members
/// only see their own campaigns and anything else is reported as not found.
pub struct CampaignService {
    campaigns: Arc<dyn CampaignRepository>,
}

impl CampaignService {
    pub fn new(campaigns: Arc<dyn CampaignRepository>) -> Self {
        Self { campaigns }
    }

    /// Creates an active campaign owned by the caller.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the name is blank or too long.
    pub async fn create(
        &self,
        caller: &CallerIdentity,
        name: String,
        description: Option<String>,
    ) -> Result<Campaign, AppError> {
        let name = validate_name(name)?;

        let campaign = self
            .campaigns
            .create(NewCampaign {
                name,
                description,
                owner_id: caller.user_id,
            })
            .await?;
        tracing::info!(campaign_id = campaign.id, owner_id = caller.user_id, "Campaign created");

        Ok(campaign)
    }

    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the campaign does not exist or is not visible.
    pub async fn get(&self, caller: &CallerIdentity, id: i64) -> Result<Campaign, AppError> {
        self.campaigns
            .find_by_id(id, caller.owner_scope())
            .await?
            .ok_or_else(|| campaign_not_found(id))
    }

    pub async fn list(
        &self,
        caller: &CallerIdentity,
        page: i64,
        page_size: i64,
    ) -> Result<(Vec<Campaign>, i64), AppError> {
        let scope = caller.owner_scope();

        let items = self.campaigns.list(scope, page, page_size).await?;
        let total = self.campaigns.count(scope).await?;

        Ok((items, total))
    }

    /// Applies a partial update.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] for an empty patch or a blank name.
    /// Returns [`AppError::NotFound`] if the campaign does not exist or is not visible.
    pub async fn update(
        &self,
        caller: &CallerIdentity,
        id: i64,
        mut patch: CampaignPatch,
    ) -> Result<Campaign, AppError> {
        if patch.is_empty() {
            return Err(AppError::bad_request(
                "No fields to update",
                json!({ "id": id }),
            ));
        }
        patch.name = patch.name.map(validate_name).transpose()?;

        let campaign = self.campaigns.update(id, caller.owner_scope(), patch).await?;
        tracing::info!(campaign_id = id, "Campaign updated");

        Ok(campaign)
    }

    /// Deletes a campaign. Its links stay and lose their campaign.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the campaign does not exist or is not visible.
    pub async fn delete(&self, caller: &CallerIdentity, id: i64) -> Result<(), AppError> {
        if !self.campaigns.delete(id, caller.owner_scope()).await? {
            return Err(campaign_not_found(id));
        }

        tracing::info!(campaign_id = id, "Campaign deleted");
        Ok(())
    }
}

fn campaign_not_found(id: i64) -> AppError {
    AppError::not_found("Campaign not found", json!({ "id": id }))
}

fn validate_name(name: String) -> Result<String, AppError> {
    let trimmed = name.trim();

    if trimmed.is_empty() || trimmed.chars().count() > MAX_NAME_LEN {
        return Err(AppError::bad_request(
            "Campaign name is required",
            json!({ "field": "name", "max": MAX_NAME_LEN }),
        ));
    }

    Ok(trimmed.to_string())
}
