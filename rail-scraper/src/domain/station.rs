//! Station types.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use super::lenient::deserialize_null_default;
use super::numeric::deserialize_numeric_id;

/// Numeric station identifier assigned by the upstream API.
///
/// Serialized as a bare integer inside records and as a decimal string when
/// used as a JSON object key.
///
/// # Examples
///
/// ```
/// use rail_scraper::domain::StationId;
///
/// let id = StationId::new(61358);
/// assert_eq!(id.get(), 61358);
/// assert_eq!(id.to_string(), "61358");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct StationId(u64);

impl StationId {
    pub const fn new(id: u64) -> Self {
        StationId(id)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for StationId {
    fn from(id: u64) -> Self {
        StationId(id)
    }
}

impl<'de> Deserialize<'de> for StationId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserialize_numeric_id(deserializer)
    }
}

impl fmt::Debug for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StationId({})", self.0)
    }
}

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn default_country() -> String {
    "PL".to_string()
}

fn default_time_zone() -> String {
    "Europe/Warsaw".to_string()
}

fn country_or_default<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(default_country))
}

fn time_zone_or_default<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(default_time_zone))
}

/// A railway station as stored in the station cache.
///
/// Stations are immutable once fetched; a later fetch of the same id
/// replaces the whole value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub id: StationId,

    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub name: String,

    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub city: String,

    pub latitude: Option<f64>,

    pub longitude: Option<f64>,

    #[serde(default = "default_country", deserialize_with = "country_or_default")]
    pub country: String,

    /// Upstream transport mode, e.g. "rail" or "bus".
    #[serde(default)]
    pub transport_mode: Option<String>,

    #[serde(default, rename = "type")]
    pub kind: Option<String>,

    #[serde(default)]
    pub region: Option<String>,

    /// International station number (UIC/IBNR), when known.
    #[serde(default)]
    pub ibnr: Option<u64>,

    #[serde(default = "default_time_zone", deserialize_with = "time_zone_or_default")]
    pub time_zone: String,
}

impl Station {
    /// Create a station with only an id and a name; every other field takes
    /// its default.
    pub fn new(id: StationId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            city: String::new(),
            latitude: None,
            longitude: None,
            country: default_country(),
            transport_mode: None,
            kind: None,
            region: None,
            ibnr: None,
            time_zone: default_time_zone(),
        }
    }

    /// Set coordinates.
    pub fn with_coordinates(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
        self
    }

    /// Both coordinates, if the station has them.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        Some((self.latitude?, self.longitude?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn station_id_display_and_debug() {
        let id = StationId::new(45682);
        assert_eq!(id.to_string(), "45682");
        assert_eq!(format!("{id:?}"), "StationId(45682)");
    }

    #[test]
    fn missing_fields_take_defaults() {
        let station: Station = serde_json::from_str(r#"{"id": 7, "name": "Kraków Główny"}"#).unwrap();

        assert_eq!(station.id, StationId::new(7));
        assert_eq!(station.country, "PL");
        assert_eq!(station.time_zone, "Europe/Warsaw");
        assert!(station.coordinates().is_none());
    }

    #[test]
    fn null_fields_take_defaults() {
        let json = r#"{"id": 7, "name": "Kraków Główny", "city": null, "country": null, "time_zone": null}"#;
        let station: Station = serde_json::from_str(json).unwrap();

        assert_eq!(station.city, "");
        assert_eq!(station.country, "PL");
        assert_eq!(station.time_zone, "Europe/Warsaw");
    }

    #[test]
    fn type_field_is_renamed() {
        let json = r#"{"id": 1, "name": "A", "latitude": 50.0, "longitude": 19.9, "type": "station"}"#;
        let station: Station = serde_json::from_str(json).unwrap();
        assert_eq!(station.kind.as_deref(), Some("station"));
        assert_eq!(station.coordinates(), Some((50.0, 19.9)));

        let back = serde_json::to_value(&station).unwrap();
        assert_eq!(back["type"], "station");
    }
}
