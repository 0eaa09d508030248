//! API route configuration.
//!
//! All API endpoints require bearer session authentication via
//! [`crate::api::middleware::auth`].

use crate::api::handlers::{
    create_campaign_handler, create_link_handler, delete_campaign_handler, delete_link_handler,
    get_campaign_handler, get_link_handler, link_events_handler, list_campaigns_handler,
    list_links_handler, update_campaign_handler, update_link_handler,
};
use crate::state::AppState;
use axum::{Router, routing::get};

/// All API routes, protected by bearer authentication.
///
/// # Endpoints
///
/// - `GET    /tracking_links`             - List visible links (paginated)
/// - `POST   /tracking_links`             - Create a link
/// - `GET    /tracking_links/{id}`        - Fetch one link
/// - `PATCH  /tracking_links/{id}`        - Partially update a link
/// - `DELETE /tracking_links/{id}`        - Delete a link
/// - `GET    /tracking_links/{id}/events` - Most recent events of a link
/// - `GET    /campaigns`                  - List visible campaigns (paginated)
/// - `POST   /campaigns`                  - Create a campaign
/// - `GET    /campaigns/{id}`             - Fetch one campaign
/// - `PATCH  /campaigns/{id}`             - Partially update a campaign (`PUT` accepted)
/// - `DELETE /campaigns/{id}`             - Delete a campaign, detaching its links
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/tracking_links",
            get(list_links_handler).post(create_link_handler),
        )
        .route(
            "/tracking_links/{id}",
            get(get_link_handler)
                .patch(update_link_handler)
                .delete(delete_link_handler),
        )
        .route("/tracking_links/{id}/events", get(link_events_handler))
        .route(
            "/campaigns",
            get(list_campaigns_handler).post(create_campaign_handler),
        )
        .route(
            "/campaigns/{id}",
            get(get_campaign_handler)
                .patch(update_campaign_handler)
                .put(update_campaign_handler)
                .delete(delete_campaign_handler),
        )
}
