//! Koleo API response DTOs.
//!
//! These types map directly to the JSON the API returns. They use `Option`
//! liberally because the API omits fields rather than sending nulls, and
//! older responses spell ids and platform labels inconsistently.

use serde::Deserialize;

use crate::domain::{RawLabel, RawStopTime, StationId, TrainId};

/// A station from `GET /api/v2/main/stations`.
#[derive(Debug, Clone, Deserialize)]
pub struct StationDto {
    pub id: StationId,
    pub name: Option<String>,
    pub city: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub country: Option<String>,
    pub transport_mode: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub region: Option<String>,
    pub ibnr: Option<u64>,
    pub time_zone: Option<String>,
}

/// The train reference nested in a departure row.
///
/// `id` and `name` describe the train's destination station.
#[derive(Debug, Clone, Deserialize)]
pub struct DepartureStationDto {
    pub train_id: Option<TrainId>,
    pub id: Option<StationId>,
    pub name: Option<String>,
}

/// One row of `GET /api/v2/main/timetables/{station}/{date}/departures`.
#[derive(Debug, Clone, Deserialize)]
pub struct DepartureDto {
    #[serde(default)]
    pub stations: Vec<DepartureStationDto>,
    pub train_full_name: Option<String>,
    pub brand_id: Option<u64>,
    pub departure: Option<RawStopTime>,
    pub platform: Option<RawLabel>,
    pub track: Option<RawLabel>,
}

/// Header of a train detail response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrainInfoDto {
    #[serde(default)]
    pub name: Option<String>,
}

/// A stop in a train detail response.
#[derive(Debug, Clone, Deserialize)]
pub struct StopDto {
    pub station_id: Option<StationId>,
    pub station_name: Option<String>,
    pub arrival: Option<RawStopTime>,
    pub departure: Option<RawStopTime>,
}

/// Response from `GET /api/v2/main/train_calendars/{train_id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct TrainDetailsDto {
    #[serde(default)]
    pub train: TrainInfoDto,
    #[serde(default)]
    pub stops: Vec<StopDto>,
}
