//! Shared application state injected into every handler.

use std::sync::Arc;

use crate::application::services::{AuthService, CampaignService, ClickResolver, LinkService};
use crate::domain::repositories::LinkRepository;

#[derive(Clone)]
pub struct AppState {
    pub click_resolver: Arc<ClickResolver>,
    pub link_service: Arc<LinkService>,
    pub campaign_service: Arc<CampaignService>,
    pub auth_service: Arc<AuthService>,
    /// Used by the health check to probe the database.
    pub links: Arc<dyn LinkRepository>,
    pub geo_provider: &'static str,
    /// Prefix for `tracking_url` in API responses, without a trailing slash.
    pub public_base_url: String,
    pub behind_proxy: bool,
}
