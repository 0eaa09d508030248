//! Repository trait definitions for the domain layer.
//!
//! These traits abstract the Link/Event Store. Implementations live in
//! `crate::infrastructure::persistence`; mocks are generated with `mockall`
//! for unit tests.
//!
//! - [`LinkRepository`] - tracking link definitions
//! - [`CampaignRepository`] - campaigns grouping links
//! - [`EventRepository`] - atomic click recording and event reads
//! - [`SessionRepository`] - users and bearer sessions

pub mod campaign_repository;
pub mod event_repository;
pub mod link_repository;
pub mod session_repository;

pub use campaign_repository::CampaignRepository;
pub use event_repository::{ClickRecord, EventRepository};
pub use link_repository::LinkRepository;
pub use session_repository::{Session, SessionRepository, UserAccount};

#[cfg(test)]
pub use campaign_repository::MockCampaignRepository;
#[cfg(test)]
pub use event_repository::MockEventRepository;
#[cfg(test)]
pub use link_repository::MockLinkRepository;
#[cfg(test)]
pub use session_repository::MockSessionRepository;
