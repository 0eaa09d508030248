//! Infrastructure layer for external integrations.
//!
//! - [`persistence`] - PostgreSQL repository implementations
//! - [`geoip`] - GeoIP providers behind [`crate::domain::geo::GeoLocator`]

pub mod geoip;
pub mod persistence;
