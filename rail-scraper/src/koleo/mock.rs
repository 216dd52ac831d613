//! Mock rail source for running without API access.
//!
//! Serves stations, departure boards and train details from memory, either
//! built up in code or loaded from a JSON fixture in the same shape the real
//! API returns. Every call is counted so tests can assert how much network
//! traffic a crawl would have produced.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::NaiveDate;
use serde::Deserialize;

use crate::domain::{Departure, Station, StationId, TrainDetails, TrainId};

use super::convert::{convert_departures, convert_stations, convert_train_details};
use super::error::KoleoError;
use super::source::RailSource;
use super::types::TrainDetailsDto;

/// On-disk fixture format.
///
/// ```json
/// {
///   "stations": [{"id": 1, "name": "A"}],
///   "departures": {"1": [{"stations": [{"train_id": 100}]}]},
///   "trains": {"100": {"train": {"name": "R"}, "stops": []}}
/// }
/// ```
#[derive(Debug, Deserialize)]
struct Fixture {
    #[serde(default)]
    stations: Vec<serde_json::Value>,
    #[serde(default)]
    departures: HashMap<StationId, Vec<serde_json::Value>>,
    #[serde(default)]
    trains: HashMap<TrainId, TrainDetailsDto>,
}

/// Number of calls made to each operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub list_stations: usize,
    pub list_departures: usize,
    pub get_train: usize,
}

impl CallCounts {
    pub fn total(&self) -> usize {
        self.list_stations + self.list_departures + self.get_train
    }
}

/// In-memory rail source.
///
/// Departure boards are the same for every date unless a dated board was
/// registered with [`MockSource::with_dated_departures`].
#[derive(Debug, Default)]
pub struct MockSource {
    stations: Vec<Station>,
    departures: HashMap<StationId, Vec<Departure>>,
    dated_departures: HashMap<(StationId, NaiveDate), Vec<Departure>>,
    trains: HashMap<TrainId, TrainDetails>,
    failing_trains: HashSet<TrainId>,
    failing_stations: HashSet<StationId>,
    fail_station_list: bool,
    list_stations_calls: AtomicUsize,
    list_departures_calls: AtomicUsize,
    get_train_calls: AtomicUsize,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a fixture file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, KoleoError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| KoleoError::Mock(format!("failed to read {}: {e}", path.display())))?;
        Self::from_json(&json)
            .map_err(|e| KoleoError::Mock(format!("failed to parse {}: {e}", path.display())))
    }

    /// Parse a fixture from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let fixture: Fixture = serde_json::from_str(json)?;

        let mut mock = Self::new();
        mock.stations = convert_stations(fixture.stations);
        mock.departures = fixture
            .departures
            .into_iter()
            .map(|(station, rows)| (station, convert_departures(rows)))
            .collect();
        mock.trains = fixture
            .trains
            .into_iter()
            .map(|(id, dto)| (id, convert_train_details(dto)))
            .collect();
        Ok(mock)
    }

    pub fn with_station(mut self, station: Station) -> Self {
        self.stations.push(station);
        self
    }

    /// Departures served for `station` on any date.
    pub fn with_departures(mut self, station: StationId, departures: Vec<Departure>) -> Self {
        self.departures.insert(station, departures);
        self
    }

    /// Departures served for `station` on `date` only.
    pub fn with_dated_departures(
        mut self,
        station: StationId,
        date: NaiveDate,
        departures: Vec<Departure>,
    ) -> Self {
        self.dated_departures.insert((station, date), departures);
        self
    }

    pub fn with_train(mut self, train_id: TrainId, details: TrainDetails) -> Self {
        self.trains.insert(train_id, details);
        self
    }

    /// Make detail lookups for `train_id` fail with a server error.
    pub fn with_failing_train(mut self, train_id: TrainId) -> Self {
        self.failing_trains.insert(train_id);
        self
    }

    /// Make departure board lookups for `station` fail with a server error.
    pub fn with_failing_station(mut self, station: StationId) -> Self {
        self.failing_stations.insert(station);
        self
    }

    /// Make the station list fail.
    pub fn with_failing_station_list(mut self) -> Self {
        self.fail_station_list = true;
        self
    }

    /// Allow a previously failing train to resolve.
    pub fn heal_train(&mut self, train_id: TrainId) {
        self.failing_trains.remove(&train_id);
    }

    pub fn calls(&self) -> CallCounts {
        CallCounts {
            list_stations: self.list_stations_calls.load(Ordering::Relaxed),
            list_departures: self.list_departures_calls.load(Ordering::Relaxed),
            get_train: self.get_train_calls.load(Ordering::Relaxed),
        }
    }

    pub fn reset_calls(&self) {
        self.list_stations_calls.store(0, Ordering::Relaxed);
        self.list_departures_calls.store(0, Ordering::Relaxed);
        self.get_train_calls.store(0, Ordering::Relaxed);
    }

    fn unavailable(what: String) -> KoleoError {
        KoleoError::Api {
            status: 503,
            message: format!("mock failure for {what}"),
        }
    }
}

impl RailSource for MockSource {
    async fn list_stations(&self) -> Result<Vec<Station>, KoleoError> {
        self.list_stations_calls.fetch_add(1, Ordering::Relaxed);
        if self.fail_station_list {
            return Err(Self::unavailable("station list".to_string()));
        }
        Ok(self.stations.clone())
    }

    async fn list_departures(
        &self,
        station: StationId,
        date: NaiveDate,
    ) -> Result<Vec<Departure>, KoleoError> {
        self.list_departures_calls.fetch_add(1, Ordering::Relaxed);
        if self.failing_stations.contains(&station) {
            return Err(Self::unavailable(format!("station {station}")));
        }

        let board = self
            .dated_departures
            .get(&(station, date))
            .or_else(|| self.departures.get(&station));
        Ok(board.cloned().unwrap_or_default())
    }

    async fn get_train(&self, train_id: TrainId) -> Result<TrainDetails, KoleoError> {
        self.get_train_calls.fetch_add(1, Ordering::Relaxed);
        if self.failing_trains.contains(&train_id) {
            return Err(Self::unavailable(format!("train {train_id}")));
        }

        self.trains
            .get(&train_id)
            .cloned()
            .ok_or_else(|| KoleoError::NotFound(format!("train {train_id}")))
    }
}
