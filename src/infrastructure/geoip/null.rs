//! Provider used when no GeoIP database is configured.

use async_trait::async_trait;

use crate::domain::geo::{GeoInfo, GeoLocator};

/// Resolves every address to unknown.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullLocator;

#[async_trait]
impl GeoLocator for NullLocator {
    async fn resolve(&self, _address: &str) -> GeoInfo {
        GeoInfo::unknown()
    }

    fn name(&self) -> &'static str {
        "none"
    }
}
