//! Repository trait for tracking link data access.

use crate::domain::entities::{LinkPatch, NewTrackingLink, TrackingLink};
use crate::error::AppError;
use async_trait::async_trait;

/// Repository interface for tracking link definitions.
///
/// `owner_scope` arguments restrict queries to one owner's links; `None`
/// means no restriction (administrators).
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgLinkRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
///
/// # Examples
///
/// See integration tests: `tests/repository_link.rs`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkRepository: Send + Sync {
    /// Creates a new tracking link with zero clicks.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the token already exists.
    /// Returns [`AppError::Internal`] on database errors.
    async fn create(&self, new_link: NewTrackingLink) -> Result<TrackingLink, AppError>;

    /// Finds a link by its public token.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn find_by_token(&self, token: &str) -> Result<Option<TrackingLink>, AppError>;

    /// Finds a link by id, optionally restricted to one owner.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn find_by_id(
        &self,
        id: i64,
        owner_scope: Option<i64>,
    ) -> Result<Option<TrackingLink>, AppError>;

    /// Lists links newest first.
    ///
    /// # Arguments
    ///
    /// - `page` - Page number (1-indexed)
    /// - `page_size` - Number of items per page
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn list(
        &self,
        owner_scope: Option<i64>,
        page: i64,
        page_size: i64,
    ) -> Result<Vec<TrackingLink>, AppError>;

    /// Counts links visible in the given scope.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn count(&self, owner_scope: Option<i64>) -> Result<i64, AppError>;

    /// Partially updates a link. Click counters are never touched here.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no link matches `id` in the scope.
    /// Returns [`AppError::Internal`] on database errors.
    async fn update(
        &self,
        id: i64,
        owner_scope: Option<i64>,
        patch: LinkPatch,
    ) -> Result<TrackingLink, AppError>;

    /// Deletes a link. Returns `Ok(false)` if nothing matched.
    ///
    /// Recorded events are kept.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn delete(&self, id: i64, owner_scope: Option<i64>) -> Result<bool, AppError>;

    /// Checks that the store is reachable.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if the store cannot be queried.
    async fn ping(&self) -> Result<(), AppError>;
}
