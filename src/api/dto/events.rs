//! DTOs for the link event listing endpoint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};

use crate::domain::entities::TrackingEvent;

/// Query for `GET /api/tracking_links/{id}/events`.
#[serde_as]
#[derive(Debug, Default, Deserialize)]
pub struct EventsQuery {
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub limit: Option<u32>,
}

impl EventsQuery {
    pub const DEFAULT_LIMIT: u32 = 100;
    pub const MAX_LIMIT: u32 = 1000;

    /// Requested limit clamped to `1..=MAX_LIMIT`.
    pub fn limit(&self) -> i64 {
        i64::from(
            self.limit
                .unwrap_or(Self::DEFAULT_LIMIT)
                .clamp(1, Self::MAX_LIMIT),
        )
    }
}

/// One recorded event, with the column names it is stored under.
#[derive(Debug, Serialize, Deserialize)]
pub struct EventResponse {
    pub id: i64,
    pub tracking_token: String,
    pub event_type: String,
    pub timestamp: DateTime<Utc>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub device_type: Option<String>,
    pub browser: Option<String>,
    pub os: Option<String>,
    pub is_bot: bool,
    pub bot_confidence: f64,
    pub bot_reason: Option<String>,
    pub campaign_id: Option<i64>,
    pub user_id: Option<i64>,
}

impl From<TrackingEvent> for EventResponse {
    fn from(e: TrackingEvent) -> Self {
        EventResponse {
            id: e.id,
            tracking_token: e.token,
            event_type: e.event_type,
            timestamp: e.timestamp,
            ip_address: e.source_address,
            user_agent: e.client_signature,
            referrer: e.referrer,
            country: e.country,
            city: e.city,
            device_type: e.device_family,
            browser: e.browser_family,
            os: e.platform_family,
            is_bot: e.is_bot,
            bot_confidence: e.bot_confidence,
            bot_reason: e.bot_reason,
            campaign_id: e.campaign_id,
            user_id: e.owner_id,
        }
    }
}
