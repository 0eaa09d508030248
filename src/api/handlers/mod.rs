//! HTTP request handlers.
//!
//! Each handler module corresponds to a logical grouping of endpoints.

pub mod campaigns;
pub mod health;
pub mod links;
pub mod track;

pub use campaigns::{
    create_campaign_handler, delete_campaign_handler, get_campaign_handler,
    list_campaigns_handler, update_campaign_handler,
};
pub use health::health_handler;
pub use links::{
    create_link_handler, delete_link_handler, get_link_handler, link_events_handler,
    list_links_handler, update_link_handler,
};
pub use track::{track_handler, track_password_handler};
