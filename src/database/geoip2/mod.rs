//! GeoIP2 database implementation
//!
//! This module implements support for the MaxMind GeoIP2/GeoLite2 City database
//! format and normalizes its records into `GeoData`.

use crate::database::types::{
    City, Continent, Country, GeoData, Location, Postal, RepresentedCountry, Subdivision, Traits,
};
use crate::database::Database;
use crate::error::{GeoIpError, Result};
use maxminddb::geoip2;
use std::collections::BTreeMap;
use std::net::IpAddr;
use std::path::Path;

/// Language used for localized names
const NAME_LANGUAGE: &str = "en";

/// GeoIP2 database implementation
pub struct GeoIP2Database {
    name: String,
    reader: maxminddb::Reader<Vec<u8>>,
}

impl GeoIP2Database {
    /// Open a database file
    pub fn open(file_path: &Path) -> Result<Self> {
        log::info!("Loading GeoIP2 database from: {}", file_path.display());

        let reader = maxminddb::Reader::open_readfile(file_path).map_err(|e| {
            GeoIpError::startup(format!(
                "Failed to open GeoIP2 database {}: {}",
                file_path.display(),
                e
            ))
        })?;

        log::info!(
            "Successfully loaded GeoIP2 database {} (built {})",
            reader.metadata.database_type,
            reader.metadata.build_epoch
        );

        Ok(Self {
            name: reader.metadata.database_type.clone(),
            reader,
        })
    }
}

impl Database for GeoIP2Database {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookup_ip(&self, ip: IpAddr) -> Result<GeoData> {
        let city: geoip2::City = self.reader.lookup(ip)?;
        Ok(GeoData::from(&city))
    }
}

fn localized_name(names: Option<&BTreeMap<&str, &str>>) -> String {
    names
        .and_then(|n| n.get(NAME_LANGUAGE))
        .map(|s| s.to_string())
        .unwrap_or_default()
}

fn text(value: Option<&str>) -> String {
    value.map(str::to_string).unwrap_or_default()
}

fn country(country: Option<&geoip2::city::Country>) -> Country {
    country
        .map(|c| Country {
            is_in_european_union: c.is_in_european_union.unwrap_or(false),
            iso_code: text(c.iso_code),
            name: localized_name(c.names.as_ref()),
        })
        .unwrap_or_default()
}

impl From<&geoip2::City<'_>> for GeoData {
    fn from(record: &geoip2::City<'_>) -> Self {
        let subdivisions: Vec<Subdivision> = record
            .subdivisions
            .iter()
            .flatten()
            .map(|sub| Subdivision {
                iso_code: text(sub.iso_code),
                name: localized_name(sub.names.as_ref()),
            })
            .collect();

        let subdivision = subdivisions.last().cloned().unwrap_or_default();

        let location = record
            .location
            .as_ref()
            .map(|l| Location {
                accuracy_radius: l.accuracy_radius.unwrap_or(0),
                latitude: l.latitude.unwrap_or(0.0),
                longitude: l.longitude.unwrap_or(0.0),
                metro_code: l.metro_code.unwrap_or(0),
                time_zone: text(l.time_zone),
            })
            .unwrap_or_default();

        let represented_country = record
            .represented_country
            .as_ref()
            .map(|c| RepresentedCountry {
                is_in_european_union: c.is_in_european_union.unwrap_or(false),
                iso_code: text(c.iso_code),
                name: localized_name(c.names.as_ref()),
                representation_type: text(c.representation_type),
            })
            .unwrap_or_default();

        let traits = record
            .traits
            .as_ref()
            .map(|t| Traits {
                is_anonymous_proxy: t.is_anonymous_proxy.unwrap_or(false),
                is_satellite_provider: t.is_satellite_provider.unwrap_or(false),
            })
            .unwrap_or_default();

        GeoData {
            city: City {
                name: localized_name(record.city.as_ref().and_then(|c| c.names.as_ref())),
            },
            continent: record
                .continent
                .as_ref()
                .map(|c| Continent {
                    code: text(c.code),
                    name: localized_name(c.names.as_ref()),
                })
                .unwrap_or_default(),
            country: country(record.country.as_ref()),
            location,
            postal: Postal {
                code: text(record.postal.as_ref().and_then(|p| p.code)),
            },
            registered_country: country(record.registered_country.as_ref()),
            represented_country,
            subdivisions,
            subdivision,
            traits,
        }
    }
}
