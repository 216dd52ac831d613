//! Train route records.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use super::departure::{Departure, TrainDetails};
use super::lenient::{deserialize_label, deserialize_null_default};
use super::numeric::deserialize_numeric_id;
use super::station::{Station, StationId};
use super::stop_time::deserialize_stop_time;

/// Numeric train identifier assigned by the upstream API.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct TrainId(u64);

impl TrainId {
    pub const fn new(id: u64) -> Self {
        TrainId(id)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for TrainId {
    fn from(id: u64) -> Self {
        TrainId(id)
    }
}

impl<'de> Deserialize<'de> for TrainId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserialize_numeric_id(deserializer)
    }
}

impl fmt::Debug for TrainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TrainId({})", self.0)
    }
}

impl fmt::Display for TrainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single call of a train at a station.
///
/// Times are `HH:MM:SS` strings in the station's local time; either may be
/// absent at the first or last stop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stop {
    pub station_id: Option<StationId>,
    #[serde(default)]
    pub station_name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_stop_time")]
    pub arrival_time: Option<String>,
    #[serde(default, deserialize_with = "deserialize_stop_time")]
    pub departure_time: Option<String>,
}

/// What the departure board said about a train whose route could not be
/// resolved. Only present on stubs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartureContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub departure_station_id: Option<StationId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub departure_station_name: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_stop_time",
        skip_serializing_if = "Option::is_none"
    )]
    pub departure_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_station_id: Option<StationId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_station_name: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_label",
        skip_serializing_if = "Option::is_none"
    )]
    pub platform: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_label",
        skip_serializing_if = "Option::is_none"
    )]
    pub track: Option<String>,
}

impl DepartureContext {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A train route as stored in the train cache.
///
/// A train with an empty `stops` list is a stub: its detail fetch failed and
/// only the departure board information is known.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Train {
    pub train_id: TrainId,

    #[serde(default, deserialize_with = "deserialize_label")]
    pub train_number: Option<String>,

    /// Upstream brand (carrier) id.
    #[serde(default)]
    pub carrier: Option<u64>,

    /// Date of the departure board the train was found on.
    pub date: NaiveDate,

    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub stops: Vec<Stop>,

    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub route_name: String,

    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub total_stops: usize,

    #[serde(flatten)]
    pub context: DepartureContext,
}

impl Train {
    /// Build a complete train from a departure and its resolved details.
    pub fn full(train_id: TrainId, departure: &Departure, date: NaiveDate, details: TrainDetails) -> Self {
        let total_stops = details.stops.len();
        Self {
            train_id,
            train_number: departure.train_number.clone(),
            carrier: departure.carrier,
            date,
            stops: details.stops,
            route_name: details.route_name,
            total_stops,
            context: DepartureContext::default(),
        }
    }

    /// Build a stub from what the departure board of `station` said.
    pub fn stub(train_id: TrainId, departure: &Departure, station: &Station, date: NaiveDate) -> Self {
        Self {
            train_id,
            train_number: departure.train_number.clone(),
            carrier: departure.carrier,
            date,
            stops: Vec::new(),
            route_name: String::new(),
            total_stops: 0,
            context: DepartureContext {
                departure_station_id: Some(station.id),
                departure_station_name: Some(station.name.clone()),
                departure_time: departure.departure_time.clone(),
                destination_station_id: departure.destination_station_id,
                destination_station_name: departure.destination_station_name.clone(),
                platform: departure.platform.clone(),
                track: departure.track.clone(),
            },
        }
    }

    pub fn is_stub(&self) -> bool {
        self.stops.is_empty()
    }
}
