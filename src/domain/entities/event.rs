//! Tracking event entity representing one recorded resolution.

use chrono::{DateTime, Utc};

/// Event type written for every successful resolution.
pub const EVENT_TYPE_CLICK: &str = "click";

/// An immutable record of a single resolution.
///
/// Ownership fields are denormalized copies taken from the link at event
/// time so aggregation never needs a join.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackingEvent {
    pub id: i64,
    pub token: String,
    pub event_type: String,
    pub timestamp: DateTime<Utc>,
    pub source_address: Option<String>,
    pub client_signature: Option<String>,
    pub referrer: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub device_family: Option<String>,
    pub browser_family: Option<String>,
    pub platform_family: Option<String>,
    pub is_bot: bool,
    pub bot_confidence: f64,
    pub bot_reason: Option<String>,
    pub campaign_id: Option<i64>,
    pub owner_id: Option<i64>,
}

/// Input data for recording a new event. `id` is assigned by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTrackingEvent {
    pub token: String,
    pub event_type: String,
    pub timestamp: DateTime<Utc>,
    pub source_address: Option<String>,
    pub client_signature: Option<String>,
    pub referrer: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub device_family: Option<String>,
    pub browser_family: Option<String>,
    pub platform_family: Option<String>,
    pub is_bot: bool,
    pub bot_confidence: f64,
    pub bot_reason: Option<String>,
    pub campaign_id: Option<i64>,
    pub owner_id: Option<i64>,
}

impl NewTrackingEvent {
    /// Materializes the stored event once the store has assigned an id.
    pub fn into_event(self, id: i64) -> TrackingEvent {
        TrackingEvent {
            id,
            token: self.token,
            event_type: self.event_type,
            timestamp: self.timestamp,
            source_address: self.source_address,
            client_signature: self.client_signature,
            referrer: self.referrer,
            country: self.country,
            city: self.city,
            device_family: self.device_family,
            browser_family: self.browser_family,
            platform_family: self.platform_family,
            is_bot: self.is_bot,
            bot_confidence: self.bot_confidence,
            bot_reason: self.bot_reason,
            campaign_id: self.campaign_id,
            owner_id: self.owner_id,
        }
    }
}
