//! Tracking link management for the authenticated API.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::json;

use crate::domain::entities::{
    CallerIdentity, LinkPatch, LinkStatus, NewTrackingLink, Restrictions, TrackingEvent,
    TrackingLink,
};
use crate::domain::repositories::{CampaignRepository, EventRepository, LinkRepository};
use crate::domain::restrictions::{ListRule, TimeRestriction};
use crate::error::AppError;
use crate::utils::password::hash_password;
use crate::utils::token::generate_tracking_token;

/// Validated input for creating a link. The password is plaintext here.
#[derive(Debug, Clone, Default)]
pub struct CreateLink {
    pub destination_url: String,
    pub campaign_id: Option<i64>,
    pub recipient_email: Option<String>,
    pub recipient_name: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub click_limit: i32,
    pub custom_message: Option<String>,
    pub redirect_delay: i32,
    pub access_password: Option<String>,
    pub restrictions: Restrictions,
}

/// Partial update input. Same `Option<Option<_>>` convention as [`LinkPatch`].
#[derive(Debug, Clone, Default)]
pub struct UpdateLink {
    pub destination_url: Option<String>,
    pub campaign_id: Option<Option<i64>>,
    pub recipient_email: Option<Option<String>>,
    pub recipient_name: Option<Option<String>>,
    pub status: Option<LinkStatus>,
    pub expires_at: Option<Option<DateTime<Utc>>>,
    pub click_limit: Option<i32>,
    pub custom_message: Option<Option<String>>,
    pub redirect_delay: Option<i32>,
    pub access_password: Option<Option<String>>,
    pub geo: Option<Option<ListRule>>,
    pub device: Option<Option<ListRule>>,
    pub time: Option<Option<TimeRestriction>>,
}

/// Service for creating, reading, updating and deleting tracking links.
///
/// Every operation is scoped by the caller: administrators see all links,
/// other users only their own. Links outside the scope are reported as not
/// found rather than forbidden. A link can only join a campaign owned by
/// the link's owner.
pub struct LinkService {
    links: Arc<dyn LinkRepository>,
    events: Arc<dyn EventRepository>,
    campaigns: Arc<dyn CampaignRepository>,
    max_redirect_delay: i32,
}

impl LinkService {
    pub fn new(
        links: Arc<dyn LinkRepository>,
        events: Arc<dyn EventRepository>,
        campaigns: Arc<dyn CampaignRepository>,
        max_redirect_delay: i32,
    ) -> Self {
        Self {
            links,
            events,
            campaigns,
            max_redirect_delay,
        }
    }

    /// Creates a link owned by the caller with a fresh random token.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the URL, delay or restrictions are
    /// invalid, or the campaign is not one of the caller's.
    /// Returns [`AppError::Internal`] if no unique token could be generated.
    pub async fn create(
        &self,
        caller: &CallerIdentity,
        input: CreateLink,
    ) -> Result<TrackingLink, AppError> {
        let destination_url = normalize_destination(&input.destination_url)?;
        self.validate_delay(input.redirect_delay)?;
        validate_click_limit(input.click_limit)?;
        if let Some(time) = &input.restrictions.time {
            validate_time(time)?;
        }
        if let Some(campaign_id) = input.campaign_id {
            self.ensure_campaign_owner(campaign_id, caller.user_id).await?;
        }

        let access_password_hash = match input.access_password.as_deref() {
            Some(p) if !p.is_empty() => Some(hash_password(p)?),
            _ => None,
        };

        let token = self.generate_unique_token().await?;

        let new_link = NewTrackingLink {
            token,
            destination_url,
            owner_id: caller.user_id,
            campaign_id: input.campaign_id,
            recipient_email: input.recipient_email,
            recipient_name: input.recipient_name,
            expires_at: input.expires_at,
            click_limit: input.click_limit,
            custom_message: input.custom_message,
            redirect_delay: input.redirect_delay,
            access_password_hash,
            restrictions: input.restrictions,
        };

        let link = self.links.create(new_link).await?;
        tracing::info!(link_id = link.id, owner_id = caller.user_id, "Tracking link created");

        Ok(link)
    }

    /// Fetches one link visible to the caller.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the link does not exist or is not visible.
    pub async fn get(&self, caller: &CallerIdentity, id: i64) -> Result<TrackingLink, AppError> {
        self.links
            .find_by_id(id, caller.owner_scope())
            .await?
            .ok_or_else(|| link_not_found(id))
    }

    /// Lists the caller's links with the total count for pagination.
    pub async fn list(
        &self,
        caller: &CallerIdentity,
        page: i64,
        page_size: i64,
    ) -> Result<(Vec<TrackingLink>, i64), AppError> {
        let scope = caller.owner_scope();

        let items = self.links.list(scope, page, page_size).await?;
        let total = self.links.count(scope).await?;

        Ok((items, total))
    }

    /// Applies a partial update.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] for an empty or invalid patch, or a
    /// campaign the link's owner does not own.
    /// Returns [`AppError::NotFound`] if the link does not exist or is not visible.
    pub async fn update(
        &self,
        caller: &CallerIdentity,
        id: i64,
        input: UpdateLink,
    ) -> Result<TrackingLink, AppError> {
        let destination_url = input
            .destination_url
            .as_deref()
            .map(normalize_destination)
            .transpose()?;
        if let Some(delay) = input.redirect_delay {
            self.validate_delay(delay)?;
        }
        if let Some(limit) = input.click_limit {
            validate_click_limit(limit)?;
        }
        if let Some(Some(time)) = &input.time {
            validate_time(time)?;
        }
        if let Some(Some(campaign_id)) = input.campaign_id {
            let link = self.get(caller, id).await?;
            self.ensure_campaign_owner(campaign_id, link.owner_id).await?;
        }

        let access_password_hash = match input.access_password {
            None => None,
            Some(None) => Some(None),
            Some(Some(p)) if p.is_empty() => Some(None),
            Some(Some(p)) => Some(Some(hash_password(&p)?)),
        };

        let patch = LinkPatch {
            destination_url,
            campaign_id: input.campaign_id,
            recipient_email: input.recipient_email,
            recipient_name: input.recipient_name,
            status: input.status,
            expires_at: input.expires_at,
            click_limit: input.click_limit,
            custom_message: input.custom_message,
            redirect_delay: input.redirect_delay,
            access_password_hash,
            geo: input.geo,
            device: input.device,
            time: input.time,
        };

        if patch.is_empty() {
            return Err(AppError::bad_request(
                "No fields to update",
                json!({ "id": id }),
            ));
        }

        let link = self.links.update(id, caller.owner_scope(), patch).await?;
        tracing::info!(link_id = id, "Tracking link updated");

        Ok(link)
    }

    /// Deletes a link. Recorded events are kept.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the link does not exist or is not visible.
    pub async fn delete(&self, caller: &CallerIdentity, id: i64) -> Result<(), AppError> {
        if !self.links.delete(id, caller.owner_scope()).await? {
            return Err(link_not_found(id));
        }

        tracing::info!(link_id = id, "Tracking link deleted");
        Ok(())
    }

    /// Returns the most recent events of a visible link.
    pub async fn events(
        &self,
        caller: &CallerIdentity,
        id: i64,
        limit: i64,
    ) -> Result<Vec<TrackingEvent>, AppError> {
        let link = self.get(caller, id).await?;
        self.events.list_by_token(&link.token, limit).await
    }

    async fn ensure_campaign_owner(&self, campaign_id: i64, owner_id: i64) -> Result<(), AppError> {
        if self
            .campaigns
            .find_by_id(campaign_id, Some(owner_id))
            .await?
            .is_none()
        {
            return Err(AppError::bad_request(
                "Unknown campaign",
                json!({ "field": "campaign_id", "campaign_id": campaign_id }),
            ));
        }
        Ok(())
    }

    fn validate_delay(&self, delay: i32) -> Result<(), AppError> {
        if !(0..=self.max_redirect_delay).contains(&delay) {
            return Err(AppError::bad_request(
                "Invalid redirect delay",
                json!({ "redirect_delay": delay, "max": self.max_redirect_delay }),
            ));
        }
        Ok(())
    }

    /// Generates a token not yet used by any link.
    ///
    /// Attempts up to 10 times before failing.
    async fn generate_unique_token(&self) -> Result<String, AppError> {
        const MAX_ATTEMPTS: usize = 10;

        for _ in 0..MAX_ATTEMPTS {
            let token = generate_tracking_token();

            if self.links.find_by_token(&token).await?.is_none() {
                return Ok(token);
            }
        }

        Err(AppError::internal(
            "Failed to generate unique token",
            json!({ "reason": "Too many collisions" }),
        ))
    }
}

fn link_not_found(id: i64) -> AppError {
    AppError::not_found("Tracking link not found", json!({ "id": id }))
}

/// Checks a destination URL and returns its normalized form for storage.
///
/// The URL parser drops embedded tabs and line breaks instead of failing, so
/// control characters are rejected up front. Storing the serialized URL keeps
/// the destination usable as a `Location` or `Refresh` header value.
fn normalize_destination(raw: &str) -> Result<String, AppError> {
    if raw.chars().any(char::is_control) {
        return Err(AppError::bad_request(
            "Invalid URL format",
            json!({ "reason": "URL contains control characters" }),
        ));
    }

    let parsed = url::Url::parse(raw).map_err(|e| {
        AppError::bad_request("Invalid URL format", json!({ "reason": e.to_string() }))
    })?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(AppError::bad_request(
            "Invalid URL format",
            json!({ "reason": "only http and https URLs are allowed" }),
        ));
    }

    Ok(parsed.into())
}

fn validate_click_limit(limit: i32) -> Result<(), AppError> {
    if limit < 0 {
        return Err(AppError::bad_request(
            "Invalid click limit",
            json!({ "click_limit": limit }),
        ));
    }
    Ok(())
}

fn validate_time(time: &TimeRestriction) -> Result<(), AppError> {
    time.validate().map_err(|reason| {
        AppError::bad_request(
            "Invalid time restriction",
            json!({ "field": "time_restrictions", "reason": reason }),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::Role;
    use crate::domain::entities::{Campaign, CampaignStatus};
    use crate::domain::repositories::{
        MockCampaignRepository, MockEventRepository, MockLinkRepository,
    };
    use crate::domain::restrictions::TimeWindow;

    fn member() -> CallerIdentity {
        CallerIdentity {
            user_id: 7,
            username: "jane".to_string(),
            role: Role::Member,
        }
    }

    fn admin() -> CallerIdentity {
        CallerIdentity {
            user_id: 1,
            username: "root".to_string(),
            role: Role::Admin,
        }
    }

    fn stored(new: NewTrackingLink) -> TrackingLink {
        TrackingLink {
            id: 42,
            token: new.token,
            destination_url: new.destination_url,
            owner_id: new.owner_id,
            campaign_id: new.campaign_id,
            recipient_email: new.recipient_email,
            recipient_name: new.recipient_name,
            status: LinkStatus::Active,
            created_at: Utc::now(),
            expires_at: new.expires_at,
            click_limit: new.click_limit,
            click_count: 0,
            last_clicked: None,
            custom_message: new.custom_message,
            redirect_delay: new.redirect_delay,
            access_password_hash: new.access_password_hash,
            restrictions: new.restrictions,
        }
    }

    fn service(links: MockLinkRepository) -> LinkService {
        service_with_campaigns(links, MockCampaignRepository::new())
    }

    fn service_with_campaigns(
        links: MockLinkRepository,
        campaigns: MockCampaignRepository,
    ) -> LinkService {
        LinkService::new(
            Arc::new(links),
            Arc::new(MockEventRepository::new()),
            Arc::new(campaigns),
            30,
        )
    }

    fn campaign(id: i64, owner_id: i64) -> Campaign {
        Campaign {
            id,
            name: "Spring launch".to_string(),
            description: None,
            owner_id,
            status: CampaignStatus::Active,
            created_at: Utc::now(),
        }
    }

    fn input(url: &str) -> CreateLink {
        CreateLink {
            destination_url: url.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_assigns_owner_and_token() {
        let mut links = MockLinkRepository::new();
        links
            .expect_find_by_token()
            .times(1)
            .returning(|_| Ok(None));
        links
            .expect_create()
            .withf(|n| n.owner_id == 7 && n.token.len() == 11 && n.access_password_hash.is_none())
            .times(1)
            .returning(|n| Ok(stored(n)));

        let link = service(links)
            .create(&member(), input("https://example.com/offer"))
            .await
            .unwrap();

        assert_eq!(link.owner_id, 7);
        assert_eq!(link.destination_url, "https://example.com/offer");
    }

    #[tokio::test]
    async fn test_create_hashes_password() {
        let mut links = MockLinkRepository::new();
        links.expect_find_by_token().returning(|_| Ok(None));
        links
            .expect_create()
            .withf(|n| {
                n.access_password_hash
                    .as_deref()
                    .is_some_and(|h| h.starts_with("$argon2") && !h.contains("s3cret"))
            })
            .times(1)
            .returning(|n| Ok(stored(n)));

        let link = service(links)
            .create(
                &member(),
                CreateLink {
                    access_password: Some("s3cret".to_string()),
                    ..input("https://example.com")
                },
            )
            .await
            .unwrap();

        assert!(link.is_password_protected());
    }

    #[tokio::test]
    async fn test_create_retries_on_token_collision() {
        let mut links = MockLinkRepository::new();
        let mut calls = 0;
        links.expect_find_by_token().times(2).returning(move |_| {
            calls += 1;
            if calls == 1 {
                Ok(Some(stored(NewTrackingLink {
                    token: "taken".to_string(),
                    destination_url: "https://other.example".to_string(),
                    owner_id: 1,
                    campaign_id: None,
                    recipient_email: None,
                    recipient_name: None,
                    expires_at: None,
                    click_limit: 0,
                    custom_message: None,
                    redirect_delay: 0,
                    access_password_hash: None,
                    restrictions: Restrictions::default(),
                })))
            } else {
                Ok(None)
            }
        });
        links.expect_create().times(1).returning(|n| Ok(stored(n)));

        let result = service(links)
            .create(&member(), input("https://example.com"))
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_create_rejects_bad_input() {
        let svc = service(MockLinkRepository::new());

        let bad_url = svc.create(&member(), input("not-a-url")).await;
        assert!(matches!(bad_url.unwrap_err(), AppError::Validation { .. }));

        let bad_scheme = svc.create(&member(), input("javascript:alert(1)")).await;
        assert!(matches!(bad_scheme.unwrap_err(), AppError::Validation { .. }));

        let too_slow = svc
            .create(
                &member(),
                CreateLink {
                    redirect_delay: 31,
                    ..input("https://example.com")
                },
            )
            .await;
        assert!(matches!(too_slow.unwrap_err(), AppError::Validation { .. }));

        let negative_limit = svc
            .create(
                &member(),
                CreateLink {
                    click_limit: -1,
                    ..input("https://example.com")
                },
            )
            .await;
        assert!(matches!(negative_limit.unwrap_err(), AppError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_create_rejects_time_restriction_without_windows() {
        let svc = service(MockLinkRepository::new());

        let result = svc
            .create(
                &member(),
                CreateLink {
                    restrictions: Restrictions {
                        time: Some(TimeRestriction {
                            utc_offset: None,
                            windows: vec![],
                        }),
                        ..Default::default()
                    },
                    ..input("https://example.com")
                },
            )
            .await;

        assert!(matches!(result.unwrap_err(), AppError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_get_is_scoped_to_owner() {
        let mut links = MockLinkRepository::new();
        links
            .expect_find_by_id()
            .withf(|id, scope| *id == 5 && *scope == Some(7))
            .times(1)
            .returning(|_, _| Ok(None));

        let err = service(links).get(&member(), 5).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_admin_list_is_unscoped() {
        let mut links = MockLinkRepository::new();
        links
            .expect_list()
            .withf(|scope, page, size| scope.is_none() && *page == 2 && *size == 10)
            .times(1)
            .returning(|_, _, _| Ok(vec![]));
        links
            .expect_count()
            .withf(|scope| scope.is_none())
            .times(1)
            .returning(|_| Ok(12));

        let (items, total) = service(links).list(&admin(), 2, 10).await.unwrap();

        assert!(items.is_empty());
        assert_eq!(total, 12);
    }

    #[tokio::test]
    async fn test_update_rejects_empty_patch() {
        let svc = service(MockLinkRepository::new());

        let err = svc
            .update(&member(), 1, UpdateLink::default())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_update_clears_password_with_empty_string() {
        let mut links = MockLinkRepository::new();
        links
            .expect_update()
            .withf(|id, scope, patch| {
                *id == 3 && *scope == Some(7) && patch.access_password_hash == Some(None)
            })
            .times(1)
            .returning(|_, _, _| {
                Ok(stored(NewTrackingLink {
                    token: "t".to_string(),
                    destination_url: "https://example.com".to_string(),
                    owner_id: 7,
                    campaign_id: None,
                    recipient_email: None,
                    recipient_name: None,
                    expires_at: None,
                    click_limit: 0,
                    custom_message: None,
                    redirect_delay: 0,
                    access_password_hash: None,
                    restrictions: Restrictions::default(),
                }))
            });

        let result = service(links)
            .update(
                &member(),
                3,
                UpdateLink {
                    access_password: Some(Some(String::new())),
                    ..Default::default()
                },
            )
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_update_validates_time_windows() {
        let svc = service(MockLinkRepository::new());
        let bad = TimeRestriction {
            utc_offset: Some("Mars/Olympus".to_string()),
            windows: vec![TimeWindow {
                days: vec![],
                start: "09:00".parse().unwrap(),
                end: "17:00".parse().unwrap(),
            }],
        };

        let err = svc
            .update(
                &member(),
                1,
                UpdateLink {
                    time: Some(Some(bad)),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_create_normalizes_destination() {
        let mut links = MockLinkRepository::new();
        links.expect_find_by_token().returning(|_| Ok(None));
        links
            .expect_create()
            .withf(|n| n.destination_url == "https://example.com/caf%C3%A9")
            .times(1)
            .returning(|n| Ok(stored(n)));

        let link = service(links)
            .create(&member(), input(" https://EXAMPLE.com/café"))
            .await
            .unwrap();

        assert_eq!(link.destination_url, "https://example.com/caf%C3%A9");
    }

    #[tokio::test]
    async fn test_destination_with_line_break_is_rejected() {
        let svc = service(MockLinkRepository::new());

        let created = svc
            .create(&member(), input("https://example.com/a\nb"))
            .await;
        let updated = svc
            .update(
                &member(),
                1,
                UpdateLink {
                    destination_url: Some("https://example.com/a\tb".to_string()),
                    ..Default::default()
                },
            )
            .await;

        assert!(matches!(created.unwrap_err(), AppError::Validation { .. }));
        assert!(matches!(updated.unwrap_err(), AppError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_create_requires_own_campaign() {
        let mut campaigns = MockCampaignRepository::new();
        campaigns
            .expect_find_by_id()
            .withf(|id, scope| *id == 12 && *scope == Some(7))
            .times(1)
            .returning(|_, _| Ok(None));

        let err = service_with_campaigns(MockLinkRepository::new(), campaigns)
            .create(
                &member(),
                CreateLink {
                    campaign_id: Some(12),
                    ..input("https://example.com")
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_admin_update_checks_campaign_against_link_owner() {
        let mut links = MockLinkRepository::new();
        links
            .expect_find_by_id()
            .withf(|id, scope| *id == 3 && scope.is_none())
            .times(1)
            .returning(|_, _| {
                let mut link = stored(NewTrackingLink {
                    token: "t".to_string(),
                    destination_url: "https://example.com".to_string(),
                    owner_id: 7,
                    campaign_id: None,
                    recipient_email: None,
                    recipient_name: None,
                    expires_at: None,
                    click_limit: 0,
                    custom_message: None,
                    redirect_delay: 0,
                    access_password_hash: None,
                    restrictions: Restrictions::default(),
                });
                link.id = 3;
                Ok(Some(link))
            });
        links
            .expect_update()
            .withf(|_, _, patch| patch.campaign_id == Some(Some(12)))
            .times(1)
            .returning(|_, _, _| {
                Ok(stored(NewTrackingLink {
                    token: "t".to_string(),
                    destination_url: "https://example.com".to_string(),
                    owner_id: 7,
                    campaign_id: Some(12),
                    recipient_email: None,
                    recipient_name: None,
                    expires_at: None,
                    click_limit: 0,
                    custom_message: None,
                    redirect_delay: 0,
                    access_password_hash: None,
                    restrictions: Restrictions::default(),
                }))
            });
        let mut campaigns = MockCampaignRepository::new();
        campaigns
            .expect_find_by_id()
            .withf(|id, scope| *id == 12 && *scope == Some(7))
            .times(1)
            .returning(|id, _| Ok(Some(campaign(id, 7))));

        let link = service_with_campaigns(links, campaigns)
            .update(
                &admin(),
                3,
                UpdateLink {
                    campaign_id: Some(Some(12)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(link.campaign_id, Some(12));
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let mut links = MockLinkRepository::new();
        links
            .expect_delete()
            .times(1)
            .returning(|_, _| Ok(false));

        let err = service(links).delete(&member(), 9).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }
}
