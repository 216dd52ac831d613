//! Aggregate report over the final cache.

use std::path::Path;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::store::{Dataset, StoreError};

/// Counts written to `scraping_summary.json` at the end of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub scraping_date: DateTime<Local>,
    pub total_stations: usize,
    pub total_trains: usize,
    /// Trains with at least one stop, i.e. not stubs.
    pub trains_with_complete_routes: usize,
    pub total_stops_across_all_trains: usize,
    pub stations_processed: usize,
}

impl Summary {
    pub fn compute(dataset: &Dataset, stations_processed: usize, now: DateTime<Local>) -> Self {
        let trains = dataset.trains.values();
        Self {
            scraping_date: now,
            total_stations: dataset.stations.len(),
            total_trains: dataset.trains.len(),
            trains_with_complete_routes: trains.clone().filter(|t| !t.stops.is_empty()).count(),
            total_stops_across_all_trains: trains.map(|t| t.stops.len()).sum(),
            stations_processed,
        }
    }

    /// Write as pretty-printed JSON, replacing any previous report.
    pub fn write(&self, path: &Path) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(self).map_err(|e| StoreError::json(path, e))?;
        std::fs::write(path, json).map_err(|e| StoreError::io(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Departure, Station, StationId, Stop, Train, TrainDetails, TrainId};
    use chrono::{NaiveDate, TimeZone};
    use tempfile::tempdir;

    fn stop(id: u64) -> Stop {
        Stop {
            station_id: Some(StationId::new(id)),
            station_name: None,
            arrival_time: None,
            departure_time: None,
        }
    }

    fn dataset() -> Dataset {
        let date = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        let station = Station::new(StationId::new(1), "Kraków Główny");
        let mut dataset = Dataset::new();

        for (id, stops) in [(100, 3), (101, 2)] {
            let details = TrainDetails {
                route_name: "R".to_string(),
                stops: (0..stops).map(stop).collect(),
            };
            let train = Train::full(TrainId::new(id), &Departure::for_train(TrainId::new(id)), date, details);
            dataset.trains.insert(train.train_id, train);
        }
        let stub = Train::stub(TrainId::new(102), &Departure::for_train(TrainId::new(102)), &station, date);
        dataset.trains.insert(stub.train_id, stub);
        dataset.merge_stations([station, Station::new(StationId::new(2), "Warszawa Centralna")]);
        dataset
    }

    #[test]
    fn counts() {
        let now = Local.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let summary = Summary::compute(&dataset(), 1, now);

        assert_eq!(summary.total_stations, 2);
        assert_eq!(summary.total_trains, 3);
        assert_eq!(summary.trains_with_complete_routes, 2);
        assert_eq!(summary.total_stops_across_all_trains, 5);
        assert_eq!(summary.stations_processed, 1);
    }

    #[test]
    fn empty_dataset() {
        let summary = Summary::compute(&Dataset::new(), 0, Local::now());
        assert_eq!(summary.total_trains, 0);
        assert_eq!(summary.total_stops_across_all_trains, 0);
    }

    #[test]
    fn written_report_has_expected_keys() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scraping_summary.json");
        Summary::compute(&dataset(), 1, Local::now()).write(&path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        for key in [
            "scraping_date",
            "total_stations",
            "total_trains",
            "trains_with_complete_routes",
            "total_stops_across_all_trains",
            "stations_processed",
        ] {
            assert!(value.get(key).is_some(), "missing {key}");
        }
        assert_eq!(value["total_trains"], 3);
    }
}
