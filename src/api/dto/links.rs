//! DTOs for the tracking link endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::application::services::{CreateLink, UpdateLink};
use crate::domain::entities::{LinkStatus, Restrictions, TrackingLink};
use crate::domain::restrictions::{ListRule, TimeRestriction};

/// Request body for `POST /api/tracking_links`.
///
/// `access_password` is plaintext on the wire and hashed before storage.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateLinkRequest {
    #[validate(url(message = "Invalid URL format"), length(max = 2048))]
    pub original_url: String,

    pub campaign_id: Option<i64>,

    #[validate(email(message = "Invalid email address"))]
    pub recipient_email: Option<String>,

    #[validate(length(max = 255))]
    pub recipient_name: Option<String>,

    pub expires_at: Option<DateTime<Utc>>,

    /// `0` (the default) means unlimited.
    #[validate(range(min = 0))]
    pub click_limit: Option<i32>,

    #[validate(length(max = 2000))]
    pub custom_message: Option<String>,

    #[validate(range(min = 0))]
    pub redirect_delay: Option<i32>,

    #[validate(length(max = 128))]
    pub access_password: Option<String>,

    pub geo_restrictions: Option<ListRule>,
    pub device_restrictions: Option<ListRule>,
    pub time_restrictions: Option<TimeRestriction>,
}

impl From<CreateLinkRequest> for CreateLink {
    fn from(req: CreateLinkRequest) -> Self {
        CreateLink {
            destination_url: req.original_url,
            campaign_id: req.campaign_id,
            recipient_email: req.recipient_email,
            recipient_name: req.recipient_name,
            expires_at: req.expires_at,
            click_limit: req.click_limit.unwrap_or(0),
            custom_message: req.custom_message,
            redirect_delay: req.redirect_delay.unwrap_or(0),
            access_password: req.access_password,
            restrictions: Restrictions {
                geo: req.geo_restrictions,
                device: req.device_restrictions,
                time: req.time_restrictions,
            },
        }
    }
}

/// Request body for `PATCH /api/tracking_links/{id}`.
///
/// Absent fields are left unchanged; `null` clears a nullable field. An
/// empty `access_password` also removes the password.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateLinkRequest {
    #[validate(url(message = "Invalid URL format"), length(max = 2048))]
    pub original_url: Option<String>,

    #[serde(default, with = "::serde_with::rust::double_option")]
    pub campaign_id: Option<Option<i64>>,

    #[serde(default, with = "::serde_with::rust::double_option")]
    #[validate(email(message = "Invalid email address"))]
    pub recipient_email: Option<Option<String>>,

    #[serde(default, with = "::serde_with::rust::double_option")]
    #[validate(length(max = 255))]
    pub recipient_name: Option<Option<String>>,

    pub link_status: Option<LinkStatus>,

    #[serde(default, with = "::serde_with::rust::double_option")]
    pub expires_at: Option<Option<DateTime<Utc>>>,

    #[validate(range(min = 0))]
    pub click_limit: Option<i32>,

    #[serde(default, with = "::serde_with::rust::double_option")]
    #[validate(length(max = 2000))]
    pub custom_message: Option<Option<String>>,

    #[validate(range(min = 0))]
    pub redirect_delay: Option<i32>,

    #[serde(default, with = "::serde_with::rust::double_option")]
    #[validate(length(max = 128))]
    pub access_password: Option<Option<String>>,

    #[serde(default, with = "::serde_with::rust::double_option")]
    pub geo_restrictions: Option<Option<ListRule>>,

    #[serde(default, with = "::serde_with::rust::double_option")]
    pub device_restrictions: Option<Option<ListRule>>,

    #[serde(default, with = "::serde_with::rust::double_option")]
    pub time_restrictions: Option<Option<TimeRestriction>>,
}

impl From<UpdateLinkRequest> for UpdateLink {
    fn from(req: UpdateLinkRequest) -> Self {
        UpdateLink {
            destination_url: req.original_url,
            campaign_id: req.campaign_id,
            recipient_email: req.recipient_email,
            recipient_name: req.recipient_name,
            status: req.link_status,
            expires_at: req.expires_at,
            click_limit: req.click_limit,
            custom_message: req.custom_message,
            redirect_delay: req.redirect_delay,
            access_password: req.access_password,
            geo: req.geo_restrictions,
            device: req.device_restrictions,
            time: req.time_restrictions,
        }
    }
}

/// A tracking link as returned by the API. The password hash is never exposed.
#[derive(Debug, Serialize, Deserialize)]
pub struct LinkResponse {
    pub id: i64,
    pub tracking_token: String,
    pub tracking_url: String,
    pub original_url: String,
    pub campaign_id: Option<i64>,
    pub recipient_email: Option<String>,
    pub recipient_name: Option<String>,
    pub link_status: LinkStatus,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub click_limit: i32,
    pub click_count: i32,
    pub last_clicked: Option<DateTime<Utc>>,
    pub custom_message: Option<String>,
    pub redirect_delay: i32,
    pub password_protected: bool,
    pub geo_restrictions: Option<ListRule>,
    pub device_restrictions: Option<ListRule>,
    pub time_restrictions: Option<TimeRestriction>,
}

impl LinkResponse {
    /// Builds the response; `base_url` must not end with a slash.
    pub fn from_link(link: TrackingLink, base_url: &str) -> Self {
        let password_protected = link.is_password_protected();

        LinkResponse {
            id: link.id,
            tracking_url: format!("{}/track/{}", base_url, link.token),
            tracking_token: link.token,
            original_url: link.destination_url,
            campaign_id: link.campaign_id,
            recipient_email: link.recipient_email,
            recipient_name: link.recipient_name,
            link_status: link.status,
            created_at: link.created_at,
            expires_at: link.expires_at,
            click_limit: link.click_limit,
            click_count: link.click_count,
            last_clicked: link.last_clicked,
            custom_message: link.custom_message,
            redirect_delay: link.redirect_delay,
            password_protected,
            geo_restrictions: link.restrictions.geo,
            device_restrictions: link.restrictions.device,
            time_restrictions: link.restrictions.time,
        }
    }
}

/// Paginated list of links.
#[derive(Debug, Serialize, Deserialize)]
pub struct LinkListResponse {
    pub items: Vec<LinkResponse>,
    pub page: i64,
    pub page_size: i64,
    pub total: i64,
}
