//! Repository trait for campaigns.

use crate::domain::entities::{Campaign, CampaignPatch, NewCampaign};
use crate::error::AppError;
use async_trait::async_trait;

/// Repository interface for campaigns.
///
/// `owner_scope` follows the same convention as
/// [`crate::domain::repositories::LinkRepository`]: `None` means no owner
/// filter.
///
/// # Examples
///
/// See integration tests: `tests/repository_campaign.rs`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CampaignRepository: Send + Sync {
    /// Creates an active campaign.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn create(&self, new_campaign: NewCampaign) -> Result<Campaign, AppError>;

    /// Finds a campaign by id, optionally restricted to one owner.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn find_by_id(
        &self,
        id: i64,
        owner_scope: Option<i64>,
    ) -> Result<Option<Campaign>, AppError>;

    /// Lists campaigns newest first (`page` is 1-indexed).
    async fn list(
        &self,
        owner_scope: Option<i64>,
        page: i64,
        page_size: i64,
    ) -> Result<Vec<Campaign>, AppError>;

    async fn count(&self, owner_scope: Option<i64>) -> Result<i64, AppError>;

    /// Partially updates a campaign.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no campaign matches `id` in the scope.
    async fn update(
        &self,
        id: i64,
        owner_scope: Option<i64>,
        patch: CampaignPatch,
    ) -> Result<Campaign, AppError>;

    /// Deletes a campaign and detaches its links. Returns `Ok(false)` if
    /// nothing matched.
    ///
    /// Links keep working without a campaign; recorded events keep the
    /// campaign id they were written with.
    async fn delete(&self, id: i64, owner_scope: Option<i64>) -> Result<bool, AppError>;
}
