//! Structured per-link access restrictions.
//!
//! Restrictions are stored as JSON text and parsed into tagged variants when a
//! link row is loaded. Malformed stored data never fails a resolution: it is
//! logged and treated as "no restriction of that kind".
//!
//! # Formats
//!
//! ```json
//! {"mode": "allow", "values": ["US", "CA"]}
//! {"mode": "deny", "values": ["bot"]}
//! {"utc_offset": "+02:00", "windows": [{"days": ["mon", "fri"], "start": "09:00", "end": "17:00"}]}
//! ```

use chrono::{DateTime, Datelike, FixedOffset, NaiveTime, Timelike, Utc, Weekday};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use std::fmt;
use std::str::FromStr;

/// Allow-list or deny-list over case-insensitive string values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "values", rename_all = "snake_case")]
pub enum ListRule {
    Allow(Vec<String>),
    Deny(Vec<String>),
}

impl ListRule {
    pub fn values(&self) -> &[String] {
        match self {
            ListRule::Allow(v) | ListRule::Deny(v) => v,
        }
    }

    /// An empty list constrains nothing.
    pub fn is_empty(&self) -> bool {
        self.values().is_empty()
    }

    pub fn contains(&self, value: &str) -> bool {
        let value = value.trim();
        self.values().iter().any(|v| v.trim().eq_ignore_ascii_case(value))
    }

    /// Whether a known value passes this rule.
    pub fn permits(&self, value: &str) -> bool {
        match self {
            _ if self.is_empty() => true,
            ListRule::Allow(_) => self.contains(value),
            ListRule::Deny(_) => !self.contains(value),
        }
    }
}

/// Wall-clock time of day written as `HH:MM`, or `HH:MM:SS` when the
/// seconds are not zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ClockTime(pub NaiveTime);

impl FromStr for ClockTime {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        NaiveTime::parse_from_str(s, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
            .map(ClockTime)
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.second() == 0 {
            write!(f, "{}", self.0.format("%H:%M"))
        } else {
            write!(f, "{}", self.0.format("%H:%M:%S"))
        }
    }
}

/// One daily availability window.
///
/// `end <= start` wraps past midnight; the window then belongs to the day on
/// which it starts. An empty `days` list means every day.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeWindow {
    #[serde_as(as = "Vec<DisplayFromStr>")]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub days: Vec<Weekday>,
    #[serde_as(as = "DisplayFromStr")]
    pub start: ClockTime,
    #[serde_as(as = "DisplayFromStr")]
    pub end: ClockTime,
}

impl TimeWindow {
    fn applies_on(&self, day: Weekday) -> bool {
        self.days.is_empty() || self.days.contains(&day)
    }

    fn contains(&self, day: Weekday, time: NaiveTime) -> bool {
        let (start, end) = (self.start.0, self.end.0);

        if start < end {
            return self.applies_on(day) && time >= start && time < end;
        }

        // overnight (or a full day when start == end)
        (self.applies_on(day) && time >= start) || (self.applies_on(day.pred()) && time < end)
    }
}

/// Availability schedule evaluated in a fixed UTC offset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeRestriction {
    /// `+HH:MM` / `-HH:MM`; UTC when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utc_offset: Option<String>,
    pub windows: Vec<TimeWindow>,
}

impl TimeRestriction {
    /// Parses the declared offset.
    pub fn offset(&self) -> Result<FixedOffset, String> {
        match self.utc_offset.as_deref().map(str::trim) {
            None | Some("") | Some("Z") | Some("UTC") | Some("utc") => Ok(utc()),
            Some(raw) => raw
                .parse::<FixedOffset>()
                .map_err(|e| format!("invalid utc_offset '{raw}': {e}")),
        }
    }

    /// Checks structural validity: a parseable offset and at least one window.
    pub fn validate(&self) -> Result<(), String> {
        self.offset()?;
        if self.windows.is_empty() {
            return Err("time restriction must declare at least one window".to_string());
        }
        Ok(())
    }

    /// Returns true if `now` falls inside any window (windows are unioned).
    pub fn allows(&self, now: DateTime<Utc>) -> bool {
        let offset = self.offset().unwrap_or_else(|_| utc());
        let local = now.with_timezone(&offset);
        let (day, time) = (local.weekday(), local.time());

        self.windows.iter().any(|w| w.contains(day, time))
    }
}

fn utc() -> FixedOffset {
    FixedOffset::east_opt(0).expect("zero offset is always valid")
}

/// Parses a stored restriction column.
///
/// Absent, blank and JSON `null` values mean "no restriction". Malformed
/// values are logged and also yield `None`.
pub fn parse_stored<T: DeserializeOwned>(field: &'static str, raw: Option<&str>) -> Option<T> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty() && *s != "null")?;

    match serde_json::from_str::<T>(raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(field, error = %e, "ignoring malformed restriction data");
            None
        }
    }
}

/// Parses a stored time restriction, additionally rejecting invalid schedules.
pub fn parse_stored_time(raw: Option<&str>) -> Option<TimeRestriction> {
    let restriction: TimeRestriction = parse_stored("time_restrictions", raw)?;

    match restriction.validate() {
        Ok(()) => Some(restriction),
        Err(e) => {
            tracing::warn!(field = "time_restrictions", error = %e, "ignoring malformed restriction data");
            None
        }
    }
}

/// Serializes a restriction for storage.
pub fn to_stored<T: Serialize>(value: Option<&T>) -> Option<String> {
    value.and_then(|v| serde_json::to_string(v).ok())
}
