//! PostgreSQL repository implementations.
//!
//! Queries are bound at runtime (`query_as` over `FromRow` rows) so the crate
//! builds without a reachable database.
//!
//! - [`PgLinkRepository`] - tracking link definitions
//! - [`PgCampaignRepository`] - campaigns
//! - [`PgEventRepository`] - atomic click recording and event reads
//! - [`PgSessionRepository`] - users and bearer sessions

pub mod pg_campaign_repository;
pub mod pg_event_repository;
pub mod pg_link_repository;
pub mod pg_session_repository;

pub use pg_campaign_repository::PgCampaignRepository;
pub use pg_event_repository::PgEventRepository;
pub use pg_link_repository::PgLinkRepository;
pub use pg_session_repository::PgSessionRepository;
