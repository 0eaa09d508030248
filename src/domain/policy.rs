//! Policy Evaluator: decides whether a link may be followed.
//!
//! Checks run in a fixed order and the first failing check wins:
//!
//! 1. status must be `active`
//! 2. the link must not be expired
//! 3. a positive click limit must not be exhausted
//! 4. the current time must fall inside the time restriction, if any
//! 5. the resolved country must pass the geo restriction, if any
//! 6. the device family must pass the device restriction, if any
//! 7. the access password must match, if one is set
//!
//! Checks 1-4 only read stored data and are exposed separately as
//! [`PolicyEvaluator::precheck`], so callers can reject a request before
//! paying for enrichment. The evaluator never hashes: check 7 reads the
//! outcome of the caller's password verification from [`CredentialCheck`].

use chrono::{DateTime, Utc};
use std::fmt;

use crate::domain::entities::{LinkStatus, TrackingLink};
use crate::domain::restrictions::ListRule;

/// Why a resolution was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    Inactive,
    Expired,
    LimitReached,
    TimeRestricted,
    GeoRestricted,
    GeoUnknown,
    DeviceRestricted,
}

impl DenyReason {
    /// Stable reason code used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            DenyReason::Inactive => "inactive",
            DenyReason::Expired => "expired",
            DenyReason::LimitReached => "limit_reached",
            DenyReason::TimeRestricted => "time_restricted",
            DenyReason::GeoRestricted => "geo_restricted",
            DenyReason::GeoUnknown => "geo_unknown",
            DenyReason::DeviceRestricted => "device_restricted",
        }
    }
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a full policy evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
    /// A credential is needed. `attempted` is true when one was supplied but did not match.
    RequireCredential { attempted: bool },
}

/// Outcome of verifying a supplied access password against the stored hash.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum CredentialCheck {
    /// Nothing was supplied, or the link has no password.
    #[default]
    Absent,
    Matched,
    Mismatched,
}

/// Request facts the policy can see.
///
/// `country` and `device_family` are `None` until enrichment has produced
/// them; an absent value fails closed against a non-empty restriction.
#[derive(Debug, Clone, Copy)]
pub struct PolicyContext<'a> {
    pub now: DateTime<Utc>,
    pub country: Option<&'a str>,
    pub device_family: Option<&'a str>,
    pub credential: CredentialCheck,
}

/// Stateless evaluator over a link and a request context.
#[derive(Debug, Default, Clone, Copy)]
pub struct PolicyEvaluator;

impl PolicyEvaluator {
    pub fn new() -> Self {
        Self
    }

    /// Runs only the checks that depend on stored link data.
    pub fn precheck(&self, link: &TrackingLink, now: DateTime<Utc>) -> Result<(), DenyReason> {
        if link.status != LinkStatus::Active {
            return Err(DenyReason::Inactive);
        }
        if link.is_expired_at(now) {
            return Err(DenyReason::Expired);
        }
        if link.is_exhausted() {
            return Err(DenyReason::LimitReached);
        }
        if let Some(time) = &link.restrictions.time
            && !time.allows(now)
        {
            return Err(DenyReason::TimeRestricted);
        }

        Ok(())
    }

    /// Runs every check in order.
    pub fn evaluate(&self, link: &TrackingLink, ctx: &PolicyContext<'_>) -> Decision {
        if let Err(reason) = self.precheck(link, ctx.now) {
            return Decision::Deny(reason);
        }

        if let Some(rule) = &link.restrictions.geo {
            match check_list(rule, ctx.country) {
                ListCheck::Pass => {}
                ListCheck::Rejected => return Decision::Deny(DenyReason::GeoRestricted),
                ListCheck::Unknown => return Decision::Deny(DenyReason::GeoUnknown),
            }
        }

        if let Some(rule) = &link.restrictions.device
            && check_list(rule, ctx.device_family) != ListCheck::Pass
        {
            return Decision::Deny(DenyReason::DeviceRestricted);
        }

        if link.access_password_hash.is_some() {
            return match ctx.credential {
                CredentialCheck::Matched => Decision::Allow,
                CredentialCheck::Mismatched => Decision::RequireCredential { attempted: true },
                CredentialCheck::Absent => Decision::RequireCredential { attempted: false },
            };
        }

        Decision::Allow
    }
}

#[derive(Debug, PartialEq, Eq)]
enum ListCheck {
    Pass,
    Rejected,
    Unknown,
}

fn check_list(rule: &ListRule, value: Option<&str>) -> ListCheck {
    if rule.is_empty() {
        return ListCheck::Pass;
    }

    match value {
        None => ListCheck::Unknown,
        Some(v) if rule.permits(v) => ListCheck::Pass,
        Some(_) => ListCheck::Rejected,
    }
}
