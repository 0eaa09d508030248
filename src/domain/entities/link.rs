//! Tracking link entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::restrictions::{ListRule, TimeRestriction};

/// Lifecycle status of a tracking link. Only [`LinkStatus::Active`] accepts resolutions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkStatus {
    Active,
    Paused,
    Expired,
    Revoked,
}

impl LinkStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkStatus::Active => "active",
            LinkStatus::Paused => "paused",
            LinkStatus::Expired => "expired",
            LinkStatus::Revoked => "revoked",
        }
    }
}

impl fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LinkStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(LinkStatus::Active),
            "paused" => Ok(LinkStatus::Paused),
            "expired" => Ok(LinkStatus::Expired),
            "revoked" => Ok(LinkStatus::Revoked),
            other => Err(format!("unknown link status '{other}'")),
        }
    }
}

/// Per-link access restrictions, already parsed into tagged variants.
///
/// `None` means "no constraint of that kind".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Restrictions {
    pub geo: Option<ListRule>,
    pub device: Option<ListRule>,
    pub time: Option<TimeRestriction>,
}

impl Restrictions {
    /// Returns true if evaluating the link needs the requester's country.
    pub fn needs_geo(&self) -> bool {
        self.geo.as_ref().is_some_and(|r| !r.is_empty())
    }

    /// Returns true if evaluating the link needs the requester's device family.
    pub fn needs_device(&self) -> bool {
        self.device.as_ref().is_some_and(|r| !r.is_empty())
    }
}

/// A shareable token wrapping a destination URL.
#[derive(Debug, Clone)]
pub struct TrackingLink {
    pub id: i64,
    pub token: String,
    pub destination_url: String,
    pub owner_id: i64,
    pub campaign_id: Option<i64>,
    pub recipient_email: Option<String>,
    pub recipient_name: Option<String>,
    pub status: LinkStatus,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub click_limit: i32,
    pub click_count: i32,
    pub last_clicked: Option<DateTime<Utc>>,
    pub custom_message: Option<String>,
    pub redirect_delay: i32,
    /// Argon2 PHC string; the plaintext is never stored.
    pub access_password_hash: Option<String>,
    pub restrictions: Restrictions,
}

impl TrackingLink {
    /// Returns true if `expires_at` lies at or before `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|e| now >= e)
    }

    /// Returns true if a positive click limit has been reached.
    pub fn is_exhausted(&self) -> bool {
        self.click_limit > 0 && self.click_count >= self.click_limit
    }

    pub fn is_password_protected(&self) -> bool {
        self.access_password_hash.is_some()
    }
}

/// Input data for creating a new tracking link.
#[derive(Debug, Clone)]
pub struct NewTrackingLink {
    pub token: String,
    pub destination_url: String,
    pub owner_id: i64,
    pub campaign_id: Option<i64>,
    pub recipient_email: Option<String>,
    pub recipient_name: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub click_limit: i32,
    pub custom_message: Option<String>,
    pub redirect_delay: i32,
    pub access_password_hash: Option<String>,
    pub restrictions: Restrictions,
}

/// Partial update for an existing link.
///
/// `None` fields are left unchanged. For nullable columns `Some(None)` clears
/// the value and `Some(Some(v))` sets it.
#[derive(Debug, Clone, Default)]
pub struct LinkPatch {
    pub destination_url: Option<String>,
    pub campaign_id: Option<Option<i64>>,
    pub recipient_email: Option<Option<String>>,
    pub recipient_name: Option<Option<String>>,
    pub status: Option<LinkStatus>,
    pub expires_at: Option<Option<DateTime<Utc>>>,
    pub click_limit: Option<i32>,
    pub custom_message: Option<Option<String>>,
    pub redirect_delay: Option<i32>,
    pub access_password_hash: Option<Option<String>>,
    pub geo: Option<Option<ListRule>>,
    pub device: Option<Option<ListRule>>,
    pub time: Option<Option<TimeRestriction>>,
}

impl LinkPatch {
    pub fn is_empty(&self) -> bool {
        self.destination_url.is_none()
            && self.campaign_id.is_none()
            && self.recipient_email.is_none()
            && self.recipient_name.is_none()
            && self.status.is_none()
            && self.expires_at.is_none()
            && self.click_limit.is_none()
            && self.custom_message.is_none()
            && self.redirect_delay.is_none()
            && self.access_password_hash.is_none()
            && self.geo.is_none()
            && self.device.is_none()
            && self.time.is_none()
    }

    /// Applies the patch to an in-memory link.
    pub fn apply_to(self, link: &mut TrackingLink) {
        if let Some(v) = self.destination_url {
            link.destination_url = v;
        }
        if let Some(v) = self.campaign_id {
            link.campaign_id = v;
        }
        if let Some(v) = self.recipient_email {
            link.recipient_email = v;
        }
        if let Some(v) = self.recipient_name {
            link.recipient_name = v;
        }
        if let Some(v) = self.status {
            link.status = v;
        }
        if let Some(v) = self.expires_at {
            link.expires_at = v;
        }
        if let Some(v) = self.click_limit {
            link.click_limit = v;
        }
        if let Some(v) = self.custom_message {
            link.custom_message = v;
        }
        if let Some(v) = self.redirect_delay {
            link.redirect_delay = v;
        }
        if let Some(v) = self.access_password_hash {
            link.access_password_hash = v;
        }
        if let Some(v) = self.geo {
            link.restrictions.geo = v;
        }
        if let Some(v) = self.device {
            link.restrictions.device = v;
        }
        if let Some(v) = self.time {
            link.restrictions.time = v;
        }
    }
}
