//! Geolocation Resolver contract.
//!
//! Lookups are best-effort: every failure mode collapses into
//! [`GeoInfo::unknown`] and is logged by the implementation, so a resolution
//! never fails because of geolocation.

use async_trait::async_trait;

/// Coarse location of a network address.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeoInfo {
    /// ISO 3166-1 alpha-2 country code (e.g. `US`).
    pub country: Option<String>,
    /// City name in English.
    pub city: Option<String>,
}

impl GeoInfo {
    pub fn unknown() -> Self {
        Self::default()
    }

    pub fn is_unknown(&self) -> bool {
        self.country.is_none() && self.city.is_none()
    }
}

/// Read-only address → location lookup.
///
/// # Implementations
///
/// - [`crate::infrastructure::geoip::MaxMindLocator`] - local `.mmdb` database
/// - [`crate::infrastructure::geoip::NullLocator`] - always unknown
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GeoLocator: Send + Sync {
    /// Resolves an address. Never fails; unknown addresses yield empty fields.
    async fn resolve(&self, address: &str) -> GeoInfo;

    /// Provider name for logs and the health endpoint.
    fn name(&self) -> &'static str;
}
