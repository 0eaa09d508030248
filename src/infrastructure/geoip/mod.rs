//! GeoIP providers.
//!
//! [`from_config`] picks the MaxMind reader when a database path is configured
//! and readable, and falls back to [`NullLocator`] otherwise.

mod maxmind;
mod null;

pub use maxmind::MaxMindLocator;
pub use null::NullLocator;

use std::sync::Arc;

use crate::domain::geo::GeoLocator;

/// Builds the configured provider. Never fails.
pub fn from_config(path: Option<&str>) -> Arc<dyn GeoLocator> {
    let locator: Arc<dyn GeoLocator> = match path {
        Some(path) => match MaxMindLocator::open(path) {
            Ok(locator) => {
                tracing::info!(path, "GeoIP: using MaxMind database");
                Arc::new(locator)
            }
            Err(e) => {
                tracing::warn!(path, error = %e, "GeoIP: failed to load database, lookups disabled");
                Arc::new(NullLocator)
            }
        },
        None => {
            tracing::info!("GeoIP: no database configured, lookups disabled");
            Arc::new(NullLocator)
        }
    };

    tracing::debug!(provider = locator.name(), "GeoIP provider ready");
    locator
}
