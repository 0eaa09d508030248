//! MaxMind GeoLite2/GeoIP2 City database provider.

use std::net::IpAddr;
use std::path::Path;

use async_trait::async_trait;
use maxminddb::{Reader, geoip2};

use crate::domain::geo::{GeoInfo, GeoLocator};

/// Looks addresses up in a local `.mmdb` file loaded into memory.
///
/// The reader is immutable after loading and safe to share across tasks.
pub struct MaxMindLocator {
    reader: Reader<Vec<u8>>,
}

impl MaxMindLocator {
    /// Loads the database at `path`.
    ///
    /// # Errors
    ///
    /// Returns the reader error if the file is missing or not a valid database.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, maxminddb::MaxMindDbError> {
        let reader = Reader::open_readfile(path)?;
        Ok(Self { reader })
    }

    fn lookup(&self, ip: IpAddr) -> Result<Option<GeoInfo>, maxminddb::MaxMindDbError> {
        let result = self.reader.lookup(ip)?;

        let Some(city) = result.decode::<geoip2::City>()? else {
            return Ok(None);
        };

        Ok(Some(GeoInfo {
            country: city.country.iso_code.map(String::from),
            city: city.city.names.english.map(String::from),
        }))
    }
}

#[async_trait]
impl GeoLocator for MaxMindLocator {
    async fn resolve(&self, address: &str) -> GeoInfo {
        let Ok(ip) = address.parse::<IpAddr>() else {
            tracing::debug!(address, "Source address is not an IP, skipping geolocation");
            return GeoInfo::unknown();
        };

        match self.lookup(ip) {
            Ok(Some(info)) => {
                tracing::trace!(address, country = ?info.country, city = ?info.city, "GeoIP match");
                info
            }
            Ok(None) => GeoInfo::unknown(),
            Err(e) => {
                tracing::warn!(address, error = %e, "GeoIP lookup failed");
                GeoInfo::unknown()
            }
        }
    }

    fn name(&self) -> &'static str {
        "maxmind"
    }
}
