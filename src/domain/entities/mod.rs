//! Core domain entities.
//!
//! Entities are plain data structures. Creation inputs use separate
//! `New*` structs and partial updates use `*Patch`:
//!
//! - [`TrackingLink`] / [`NewTrackingLink`] / [`LinkPatch`] - a tracked link
//! - [`Campaign`] / [`NewCampaign`] / [`CampaignPatch`] - a group of links
//! - [`TrackingEvent`] / [`NewTrackingEvent`] - one recorded resolution
//! - [`CallerIdentity`] - the account behind an API credential

pub mod campaign;
pub mod event;
pub mod identity;
pub mod link;

pub use campaign::{Campaign, CampaignPatch, CampaignStatus, NewCampaign};
pub use event::{EVENT_TYPE_CLICK, NewTrackingEvent, TrackingEvent};
pub use identity::{CallerIdentity, Role};
pub use link::{LinkPatch, LinkStatus, NewTrackingLink, Restrictions, TrackingLink};
