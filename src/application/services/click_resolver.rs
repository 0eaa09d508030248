//! Click resolution pipeline.
//!
//! Takes an inbound token through
//! `Received → LinkLoaded → PolicyChecked → Enriched → Recorded → Completed`
//! and returns a [`Resolution`]. Denials, unknown tokens and credential
//! challenges are ordinary outcomes; only store failures come back as
//! `Err`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::{debug, error};

use crate::domain::classifier::{Classification, ClientClassifier};
use crate::domain::entities::{EVENT_TYPE_CLICK, NewTrackingEvent, TrackingLink};
use crate::domain::geo::{GeoInfo, GeoLocator};
use crate::domain::policy::{
    CredentialCheck, Decision, DenyReason, PolicyContext, PolicyEvaluator,
};
use crate::domain::repositories::{ClickRecord, EventRepository, LinkRepository};
use crate::error::AppError;
use crate::utils::password::verify_password;

/// Facts about one inbound resolution request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub now: DateTime<Utc>,
    pub source_address: Option<String>,
    pub client_signature: Option<String>,
    pub referrer: Option<String>,
    /// Access password supplied by the requester, if any.
    pub credential: Option<String>,
}

impl RequestContext {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now,
            source_address: None,
            client_signature: None,
            referrer: None,
            credential: None,
        }
    }
}

/// Terminal outcome of a resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Follow `url`. A non-zero `delay_seconds` is an instruction for the client.
    Redirect {
        url: String,
        delay_seconds: u32,
        message: Option<String>,
    },
    Denied(DenyReason),
    NotFound,
    /// The link needs an access password. `attempted` is true after a wrong one.
    Challenge { attempted: bool },
}

impl Resolution {
    /// Outcome label used for metrics.
    pub fn outcome(&self) -> &'static str {
        match self {
            Resolution::Redirect { .. } => "redirect",
            Resolution::Denied(reason) => reason.as_str(),
            Resolution::NotFound => "not_found",
            Resolution::Challenge { .. } => "challenge",
        }
    }
}

/// Orchestrates policy, enrichment and click recording for one token.
pub struct ClickResolver {
    links: Arc<dyn LinkRepository>,
    events: Arc<dyn EventRepository>,
    geo: Arc<dyn GeoLocator>,
    classifier: ClientClassifier,
    policy: PolicyEvaluator,
}

impl ClickResolver {
    pub fn new(
        links: Arc<dyn LinkRepository>,
        events: Arc<dyn EventRepository>,
        geo: Arc<dyn GeoLocator>,
        classifier: ClientClassifier,
    ) -> Self {
        Self {
            links,
            events,
            geo,
            classifier,
            policy: PolicyEvaluator::new(),
        }
    }

    /// Resolves `token` for one request.
    ///
    /// Enrichment that a restriction depends on runs before the full policy
    /// evaluation, and only when such a restriction exists. The rest runs
    /// after the link is allowed.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if loading the link or recording the
    /// click fails. No redirect is produced in that case.
    pub async fn resolve(&self, token: &str, ctx: RequestContext) -> Result<Resolution, AppError> {
        let resolution = self.run(token, &ctx).await;

        match &resolution {
            Ok(r) => record_outcome(r.outcome()),
            Err(_) => record_outcome("error"),
        }

        resolution
    }

    async fn run(&self, token: &str, ctx: &RequestContext) -> Result<Resolution, AppError> {
        debug!(token, "resolution received");

        let Some(link) = self.links.find_by_token(token).await? else {
            debug!(token, "aborted: not_found");
            return Ok(Resolution::NotFound);
        };
        debug!(token, link_id = link.id, "link loaded");

        if let Err(reason) = self.policy.precheck(&link, ctx.now) {
            debug!(token, reason = reason.as_str(), "aborted: denied before enrichment");
            return Ok(Resolution::Denied(reason));
        }

        let restrictions = &link.restrictions;
        let classification = restrictions.needs_device().then(|| self.classify(ctx));
        let geo = if restrictions.needs_geo() {
            Some(self.locate(ctx).await)
        } else {
            None
        };
        let credential = check_credential(&link, ctx).await?;

        let decision = self.policy.evaluate(
            &link,
            &PolicyContext {
                now: ctx.now,
                country: geo.as_ref().and_then(|g| g.country.as_deref()),
                device_family: classification.as_ref().map(|c| c.device_family.as_str()),
                credential,
            },
        );

        match decision {
            Decision::Allow => debug!(token, "policy checked: allow"),
            Decision::Deny(reason) => {
                debug!(token, reason = reason.as_str(), "aborted: denied");
                return Ok(Resolution::Denied(reason));
            }
            Decision::RequireCredential { attempted } => {
                debug!(token, attempted, "credential required");
                return Ok(Resolution::Challenge { attempted });
            }
        }

        let classification = classification.unwrap_or_else(|| self.classify(ctx));
        let geo = match geo {
            Some(g) => g,
            None => self.locate(ctx).await,
        };
        if geo.is_unknown() {
            debug!(token, "enrichment degraded: location unknown");
        }
        debug!(token, is_bot = classification.is_bot, "enriched");

        let event = build_event(&link, ctx, geo, classification);

        match self.events.record_click(&link, event).await {
            Ok(ClickRecord::Recorded(event)) => {
                debug!(token, event_id = event.id, "click recorded");
            }
            Ok(ClickRecord::LimitReached) => {
                debug!(token, "aborted: limit reached while recording");
                return Ok(Resolution::Denied(DenyReason::LimitReached));
            }
            Err(e) => {
                error!(token, error = %e, "Failed to record click");
                return Err(e);
            }
        }

        debug!(token, "completed");

        Ok(Resolution::Redirect {
            url: link.destination_url,
            delay_seconds: u32::try_from(link.redirect_delay).unwrap_or(0),
            message: link.custom_message,
        })
    }

    fn classify(&self, ctx: &RequestContext) -> Classification {
        self.classifier.classify_request(
            ctx.client_signature.as_deref(),
            ctx.source_address.as_deref(),
            ctx.referrer.as_deref(),
        )
    }

    async fn locate(&self, ctx: &RequestContext) -> GeoInfo {
        match ctx.source_address.as_deref() {
            Some(address) => self.geo.resolve(address).await,
            None => GeoInfo::unknown(),
        }
    }
}

/// Verifies a submitted access password. Argon2 is CPU-bound, so it runs on
/// the blocking pool rather than an async worker.
async fn check_credential(
    link: &TrackingLink,
    ctx: &RequestContext,
) -> Result<CredentialCheck, AppError> {
    let (Some(stored), Some(supplied)) =
        (link.access_password_hash.clone(), ctx.credential.clone())
    else {
        return Ok(CredentialCheck::Absent);
    };

    let matched = tokio::task::spawn_blocking(move || verify_password(&supplied, &stored))
        .await
        .map_err(|e| {
            error!(error = %e, "Password verification task failed");
            AppError::internal("Password verification failed", json!({}))
        })?;

    Ok(if matched {
        CredentialCheck::Matched
    } else {
        CredentialCheck::Mismatched
    })
}

fn build_event(
    link: &TrackingLink,
    ctx: &RequestContext,
    geo: GeoInfo,
    classification: Classification,
) -> NewTrackingEvent {
    NewTrackingEvent {
        token: link.token.clone(),
        event_type: EVENT_TYPE_CLICK.to_string(),
        timestamp: ctx.now,
        source_address: ctx.source_address.clone(),
        client_signature: ctx.client_signature.clone(),
        referrer: ctx.referrer.clone(),
        country: geo.country,
        city: geo.city,
        device_family: Some(classification.device_family),
        browser_family: Some(classification.browser_family),
        platform_family: Some(classification.platform_family),
        is_bot: classification.is_bot,
        bot_confidence: classification.bot_confidence,
        bot_reason: classification.bot_reason,
        campaign_id: link.campaign_id,
        owner_id: Some(link.owner_id),
    }
}

fn record_outcome(outcome: &'static str) {
    metrics::counter!("link_resolutions_total", "outcome" => outcome).increment(1);
}
