//! Repository trait for click recording and event retrieval.

use crate::domain::entities::{NewTrackingEvent, TrackingEvent, TrackingLink};
use crate::error::AppError;
use async_trait::async_trait;

/// Result of an attempt to record a click.
#[derive(Debug, Clone, PartialEq)]
pub enum ClickRecord {
    /// The counter was incremented and the event stored.
    Recorded(TrackingEvent),
    /// The link's click limit was reached by a concurrent resolution; nothing was written.
    LimitReached,
}

/// Repository interface for tracking events.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgEventRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Increments the link's click counter and appends one event, atomically.
    ///
    /// The increment is conditional on the limit so concurrent callers can
    /// never push `click_count` past a positive `click_limit`. Either both
    /// writes happen or neither does.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn record_click(
        &self,
        link: &TrackingLink,
        event: NewTrackingEvent,
    ) -> Result<ClickRecord, AppError>;

    /// Returns the most recent events of a token, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn list_by_token(&self, token: &str, limit: i64) -> Result<Vec<TrackingEvent>, AppError>;
}
