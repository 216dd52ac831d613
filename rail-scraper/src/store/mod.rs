//! Disk cache for stations and trains.
//!
//! Each collection lives in `<name>.json.gz` with an optional uncompressed
//! `<name>.json` mirror. Loading prefers the compressed file; saving
//! rewrites both. There is no journal and no backup: the last save wins.
//!
//! Besides stations and trains the store keeps the departure boards seen so
//! far (`boards.json.gz`), so a restarted crawl can tell which station/date
//! pairs are fully resolvable from cache.

mod boards;
mod codec;
mod error;
mod keys;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::StoreConfig;
use crate::domain::{Station, StationId, Train, TrainId};

pub use boards::{BoardKey, BoardMap, InvalidBoardKey};
pub use error::StoreError;
pub use keys::NormalizeStats;

use boards::normalize_boards;
use keys::{Keyed, normalize};

pub type StationMap = BTreeMap<StationId, Station>;
pub type TrainMap = BTreeMap<TrainId, Train>;

const STATIONS: &str = "stations";
const TRAINS: &str = "trains";
const BOARDS: &str = "boards";

/// Everything the scraper knows: the cached collections.
///
/// Owned by the caller and passed explicitly to the crawl and the store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub stations: StationMap,
    pub trains: TrainMap,
    pub boards: BoardMap,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace stations. Returns how many ids were new.
    pub fn merge_stations(&mut self, stations: impl IntoIterator<Item = Station>) -> usize {
        let mut added = 0;
        for station in stations {
            if self.stations.insert(station.id, station).is_none() {
                added += 1;
            }
        }
        added
    }

    /// Drop boards dated before `date`. Returns how many were removed.
    pub fn prune_boards_before(&mut self, date: NaiveDate) -> usize {
        let before = self.boards.len();
        self.boards.retain(|key, _| key.date >= date);
        before - self.boards.len()
    }
}

/// Sizes of one saved collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileStats {
    /// Size of `<name>.json.gz`.
    pub compressed_bytes: u64,
    /// Size of the pretty-printed JSON, whether or not the mirror was written.
    pub plain_bytes: u64,
}

impl FileStats {
    /// Percentage saved by compression.
    pub fn reduction_percent(&self) -> f64 {
        if self.plain_bytes == 0 {
            return 0.0;
        }
        (1.0 - self.compressed_bytes as f64 / self.plain_bytes as f64) * 100.0
    }
}

/// Result of a save.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveStats {
    pub stations: FileStats,
    pub trains: FileStats,
    pub boards: FileStats,
}

/// Loads and saves a [`Dataset`] under one data directory.
#[derive(Debug, Clone)]
pub struct CacheStore {
    config: StoreConfig,
}

impl CacheStore {
    pub fn new(config: StoreConfig) -> Self {
        Self { config }
    }

    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    /// Path of the compressed file for `name`.
    pub fn compressed_path(&self, name: &str) -> PathBuf {
        self.config.data_dir.join(format!("{name}.json.gz"))
    }

    /// Path of the uncompressed mirror for `name`.
    pub fn plain_path(&self, name: &str) -> PathBuf {
        self.config.data_dir.join(format!("{name}.json"))
    }

    /// Load every collection.
    ///
    /// Missing files yield empty collections. Unreadable files are logged
    /// and skipped, so a damaged cache never prevents a run.
    pub fn load(&self) -> Dataset {
        let (stations, station_stats) = self.load_collection::<Station>(STATIONS);
        let (trains, train_stats) = self.load_collection::<Train>(TRAINS);
        let (boards, board_stats) = match self.read_raw(BOARDS) {
            Some(raw) => normalize_boards(raw),
            None => (BoardMap::new(), NormalizeStats::default()),
        };

        info!(
            dir = %self.data_dir().display(),
            stations = stations.len(),
            trains = trains.len(),
            boards = boards.len(),
            duplicates = station_stats.duplicates + train_stats.duplicates + board_stats.duplicates,
            dropped = station_stats.dropped + train_stats.dropped + board_stats.dropped,
            "Loaded cache"
        );

        Dataset {
            stations,
            trains,
            boards,
        }
    }

    fn load_collection<T: Keyed>(&self, name: &str) -> (BTreeMap<T::Id, T>, NormalizeStats) {
        match self.read_raw(name) {
            Some(raw) => normalize::<T>(raw),
            None => (BTreeMap::new(), NormalizeStats::default()),
        }
    }

    /// Read the raw `key -> object` map for `name`, compressed first.
    fn read_raw(&self, name: &str) -> Option<BTreeMap<String, serde_json::Value>> {
        let gz = self.compressed_path(name);
        let plain = self.plain_path(name);

        if gz.exists() {
            match codec::read_gz_json(&gz) {
                Ok(raw) => {
                    debug!(path = %gz.display(), "Read compressed cache");
                    return Some(raw);
                }
                Err(e) => warn!(error = %e, "Could not load compressed cache"),
            }
        }

        if plain.exists() {
            match codec::read_plain_json(&plain) {
                Ok(raw) => {
                    debug!(path = %plain.display(), "Read uncompressed cache");
                    return Some(raw);
                }
                Err(e) => warn!(error = %e, "Could not load uncompressed cache"),
            }
        }

        None
    }

    /// Persist every collection.
    pub fn save(&self, dataset: &Dataset) -> Result<SaveStats, StoreError> {
        let stats = SaveStats {
            stations: self.save_collection(STATIONS, &dataset.stations)?,
            trains: self.save_collection(TRAINS, &dataset.trains)?,
            boards: self.save_collection(BOARDS, &dataset.boards)?,
        };

        info!(
            stations = dataset.stations.len(),
            trains = dataset.trains.len(),
            station_reduction = format!("{:.1}%", stats.stations.reduction_percent()),
            train_reduction = format!("{:.1}%", stats.trains.reduction_percent()),
            "Saved cache"
        );

        Ok(stats)
    }

    fn save_collection<T: Serialize>(&self, name: &str, value: &T) -> Result<FileStats, StoreError> {
        let gz = self.compressed_path(name);
        let plain = self.plain_path(name);

        let compressed_bytes = codec::write_gz_json(&gz, value)?;
        let pretty = codec::to_pretty_json(&plain, value)?;
        if self.config.write_plain_mirror {
            codec::write_plain_bytes(&plain, &pretty)?;
        }

        Ok(FileStats {
            compressed_bytes,
            plain_bytes: pretty.len() as u64,
        })
    }
}
