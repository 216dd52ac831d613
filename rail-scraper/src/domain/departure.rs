//! What a departure board and a train detail lookup return.

use super::station::StationId;
use super::train::{Stop, TrainId};

/// One row of a station's departure board.
///
/// Only `train_id` is needed to resolve the full route; the other fields
/// are kept so a stub can record what the board showed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    pub train_id: Option<TrainId>,
    pub train_number: Option<String>,
    pub carrier: Option<u64>,
    pub departure_time: Option<String>,
    pub destination_station_id: Option<StationId>,
    pub destination_station_name: Option<String>,
    pub platform: Option<String>,
    pub track: Option<String>,
}

impl Departure {
    /// A departure with only a train id; used by tests and mock data.
    pub fn for_train(train_id: TrainId) -> Self {
        Self {
            train_id: Some(train_id),
            train_number: None,
            carrier: None,
            departure_time: None,
            destination_station_id: None,
            destination_station_name: None,
            platform: None,
            track: None,
        }
    }
}

/// The resolved route of a train.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainDetails {
    pub route_name: String,
    pub stops: Vec<Stop>,
}
