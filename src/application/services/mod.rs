//! Application services.
//!
//! - [`ClickResolver`] - the click resolution pipeline behind `/track/{token}`
//! - [`LinkService`] - link management for the authenticated API
//! - [`CampaignService`] - campaign management for the authenticated API
//! - [`AuthService`] - bearer session authentication

pub mod auth_service;
pub mod campaign_service;
pub mod click_resolver;
pub mod link_service;

pub use auth_service::AuthService;
pub use campaign_service::CampaignService;
pub use click_resolver::{ClickResolver, RequestContext, Resolution};
pub use link_service::{CreateLink, LinkService, UpdateLink};
