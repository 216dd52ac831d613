//! Conversion from Koleo DTOs to domain types.
//!
//! List responses are parsed element by element so one malformed row does
//! not discard the whole board.

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::domain::{Departure, RawStopTime, Station, Stop, TrainDetails};

use super::types::{DepartureDto, StationDto, StopDto, TrainDetailsDto};

/// Error during DTO to domain conversion.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConversionError {
    /// Element did not match the expected shape
    #[error("invalid {kind} at index {index}: {message}")]
    InvalidElement {
        kind: &'static str,
        index: usize,
        message: String,
    },
}

/// Parse each element of a JSON array independently, dropping the ones
/// that fail.
fn parse_each<T: DeserializeOwned>(kind: &'static str, values: Vec<serde_json::Value>) -> Vec<T> {
    let mut parsed = Vec::with_capacity(values.len());

    for (index, value) in values.into_iter().enumerate() {
        match serde_json::from_value::<T>(value) {
            Ok(item) => parsed.push(item),
            Err(e) => {
                let err = ConversionError::InvalidElement {
                    kind,
                    index,
                    message: e.to_string(),
                };
                debug!(error = %err, "Skipping malformed element");
            }
        }
    }

    parsed
}

pub fn convert_station(dto: StationDto) -> Station {
    let mut station = Station::new(dto.id, dto.name.unwrap_or_default());
    station.city = dto.city.unwrap_or_default();
    station.latitude = dto.latitude;
    station.longitude = dto.longitude;
    if let Some(country) = dto.country {
        station.country = country;
    }
    station.transport_mode = dto.transport_mode;
    station.kind = dto.kind;
    station.region = dto.region;
    station.ibnr = dto.ibnr;
    if let Some(tz) = dto.time_zone {
        station.time_zone = tz;
    }
    station
}

/// Convert a raw station list response.
pub fn convert_stations(values: Vec<serde_json::Value>) -> Vec<Station> {
    parse_each::<StationDto>("station", values)
        .into_iter()
        .map(convert_station)
        .collect()
}

pub fn convert_departure(dto: DepartureDto) -> Departure {
    // The first nested station carries the train reference and the
    // train's destination.
    let head = dto.stations.into_iter().next();
    let (train_id, destination_station_id, destination_station_name) = match head {
        Some(s) => (s.train_id, s.id, s.name),
        None => (None, None, None),
    };

    Departure {
        train_id,
        train_number: dto.train_full_name,
        carrier: dto.brand_id,
        departure_time: dto.departure.map(RawStopTime::normalize),
        destination_station_id,
        destination_station_name,
        platform: dto.platform.map(|p| p.into_string()),
        track: dto.track.map(|t| t.into_string()),
    }
}

/// Convert a raw departure board response.
pub fn convert_departures(values: Vec<serde_json::Value>) -> Vec<Departure> {
    parse_each::<DepartureDto>("departure", values)
        .into_iter()
        .map(convert_departure)
        .collect()
}

fn convert_stop(dto: StopDto) -> Stop {
    Stop {
        station_id: dto.station_id,
        station_name: dto.station_name,
        arrival_time: dto.arrival.map(RawStopTime::normalize),
        departure_time: dto.departure.map(RawStopTime::normalize),
    }
}

pub fn convert_train_details(dto: TrainDetailsDto) -> TrainDetails {
    TrainDetails {
        route_name: dto.train.name.unwrap_or_default(),
        stops: dto.stops.into_iter().map(convert_stop).collect(),
    }
}
