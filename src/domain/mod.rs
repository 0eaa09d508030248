//! Domain layer: entities, click policy and classification, store contracts.
//!
//! Nothing in this module performs I/O. Persistence and GeoIP lookups are
//! reached through the traits in [`repositories`] and [`geo`].
//!
//! - [`entities`] - links, events, caller identities
//! - [`restrictions`] - tagged geo/device/time rules
//! - [`policy`] - the ordered allow/deny/challenge checks
//! - [`classifier`] - client families and bot verdicts

pub mod classifier;
pub mod entities;
pub mod geo;
pub mod policy;
pub mod repositories;
pub mod restrictions;
