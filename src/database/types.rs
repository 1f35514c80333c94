//! Type definitions for the database module
//!
//! `GeoData` is the stable, JSON-friendly shape every lookup is normalized into.
//! Each field is omitted from the JSON output when it is empty, zero or false,
//! and each nested object is omitted when all of its fields are.

use serde::Serialize;

fn is_zero_u16(value: &u16) -> bool {
    *value == 0
}

fn is_zero_f64(value: &f64) -> bool {
    *value == 0.0
}

fn is_false(value: &bool) -> bool {
    !*value
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct City {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
}

impl City {
    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Continent {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub code: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
}

impl Continent {
    pub fn is_empty(&self) -> bool {
        self.code.is_empty() && self.name.is_empty()
    }
}

/// Country as seen in the `country` and `registered_country` fields
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Country {
    #[serde(skip_serializing_if = "is_false")]
    pub is_in_european_union: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub iso_code: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
}

impl Country {
    pub fn is_empty(&self) -> bool {
        !self.is_in_european_union && self.iso_code.is_empty() && self.name.is_empty()
    }
}

/// Country represented by users of the IP (e.g. a military base abroad)
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RepresentedCountry {
    #[serde(skip_serializing_if = "is_false")]
    pub is_in_european_union: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub iso_code: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(rename = "type", skip_serializing_if = "String::is_empty")]
    pub representation_type: String,
}

impl RepresentedCountry {
    pub fn is_empty(&self) -> bool {
        !self.is_in_european_union
            && self.iso_code.is_empty()
            && self.name.is_empty()
            && self.representation_type.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Location {
    #[serde(skip_serializing_if = "is_zero_u16")]
    pub accuracy_radius: u16,
    #[serde(skip_serializing_if = "is_zero_f64")]
    pub latitude: f64,
    #[serde(skip_serializing_if = "is_zero_f64")]
    pub longitude: f64,
    #[serde(skip_serializing_if = "is_zero_u16")]
    pub metro_code: u16,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub time_zone: String,
}

impl Location {
    pub fn is_empty(&self) -> bool {
        self.accuracy_radius == 0
            && self.latitude == 0.0
            && self.longitude == 0.0
            && self.metro_code == 0
            && self.time_zone.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Postal {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub code: String,
}

impl Postal {
    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Subdivision {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub iso_code: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
}

impl Subdivision {
    pub fn is_empty(&self) -> bool {
        self.iso_code.is_empty() && self.name.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Traits {
    #[serde(skip_serializing_if = "is_false")]
    pub is_anonymous_proxy: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub is_satellite_provider: bool,
}

impl Traits {
    pub fn is_empty(&self) -> bool {
        !self.is_anonymous_proxy && !self.is_satellite_provider
    }
}

/// Normalized geolocation record for a single IP
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GeoData {
    #[serde(skip_serializing_if = "City::is_empty")]
    pub city: City,
    #[serde(skip_serializing_if = "Continent::is_empty")]
    pub continent: Continent,
    #[serde(skip_serializing_if = "Country::is_empty")]
    pub country: Country,
    #[serde(skip_serializing_if = "Location::is_empty")]
    pub location: Location,
    #[serde(skip_serializing_if = "Postal::is_empty")]
    pub postal: Postal,
    #[serde(skip_serializing_if = "Country::is_empty")]
    pub registered_country: Country,
    #[serde(skip_serializing_if = "RepresentedCountry::is_empty")]
    pub represented_country: RepresentedCountry,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub subdivisions: Vec<Subdivision>,
    /// Most specific subdivision, i.e. the last entry of `subdivisions`
    #[serde(skip_serializing_if = "Subdivision::is_empty")]
    pub subdivision: Subdivision,
    #[serde(skip_serializing_if = "Traits::is_empty")]
    pub traits: Traits,
}

impl GeoData {
    /// True when the record carries no usable location data.
    ///
    /// Only city, continent and country names, the accuracy radius and the
    /// postal code are considered.
    pub fn is_unknown(&self) -> bool {
        self.city.name.is_empty()
            && self.continent.name.is_empty()
            && self.country.name.is_empty()
            && self.location.accuracy_radius == 0
            && self.postal.code.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_unknown() {
        assert!(GeoData::default().is_unknown());
    }

    #[test]
    fn test_accuracy_radius_alone_is_known() {
        let mut data = GeoData::default();
        data.location.accuracy_radius = 1000;
        assert!(!data.is_unknown());
    }

    #[test]
    fn test_subdivisions_do_not_affect_unknown() {
        let mut data = GeoData::default();
        data.subdivisions.push(Subdivision {
            iso_code: "CA".to_string(),
            name: "California".to_string(),
        });
        assert!(data.is_unknown());
    }

    #[test]
    fn test_empty_record_serializes_to_empty_object() {
        let json = serde_json::to_string(&GeoData::default()).unwrap();
        assert_eq!(json, "{}");
    }

    #[test]
    fn test_empty_fields_are_omitted() {
        let mut data = GeoData::default();
        data.country.iso_code = "DE".to_string();
        data.country.is_in_european_union = true;
        data.represented_country.representation_type = "military".to_string();

        let json = serde_json::to_string(&data).unwrap();
        assert_eq!(
            json,
            r#"{"country":{"is_in_european_union":true,"iso_code":"DE"},"represented_country":{"type":"military"}}"#
        );
    }

    #[test]
    fn test_location_serialization() {
        let mut data = GeoData::default();
        data.location = Location {
            accuracy_radius: 5,
            latitude: 37.751,
            longitude: -97.822,
            metro_code: 0,
            time_zone: "America/Chicago".to_string(),
        };

        let value = serde_json::to_value(&data).unwrap();
        assert_eq!(value["location"]["accuracy_radius"], 5);
        assert_eq!(value["location"]["time_zone"], "America/Chicago");
        assert!(value["location"].get("metro_code").is_none());
    }
}
