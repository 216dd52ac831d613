//! Rate-limited fetching of departure boards and train routes.
//!
//! Requests are issued strictly one at a time. After every train detail
//! request the fetcher pauses for `record_delay`; after a station's board
//! for one date it pauses for `station_delay`, but only when at least one
//! detail request was made. A board that resolves entirely from cache costs
//! no requests and no pauses, which keeps re-runs over a warm cache fast.

use std::time::Duration;

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::config::FetchConfig;
use crate::domain::{Departure, Station, Train, TrainId};
use crate::koleo::{KoleoError, RailSource};
use crate::store::{BoardKey, Dataset, TrainMap};

/// How one train was resolved.
#[derive(Debug)]
pub enum RecordOutcome {
    /// Already in the cache; no request made.
    Cached,
    /// Full route fetched and stored.
    Fetched,
    /// Detail request failed; a stub was stored instead.
    Degraded(KoleoError),
}

/// Counts for one station on one date.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DayReport {
    /// Rows on the departure board.
    pub departures: usize,
    /// Rows without a train reference.
    pub skipped: usize,
    pub cached: usize,
    pub fetched: usize,
    pub degraded: usize,
    /// The board itself came from the cache.
    pub board_from_cache: bool,
}

impl DayReport {
    /// Requests this day cost.
    pub fn network_requests(&self) -> usize {
        let board = if self.board_from_cache { 0 } else { 1 };
        board + self.fetched + self.degraded
    }

    /// Trains resolved, whatever the outcome.
    pub fn trains(&self) -> usize {
        self.cached + self.fetched + self.degraded
    }

    /// Fold another day's train counts into this one.
    pub fn add(&mut self, other: &DayReport) {
        self.departures += other.departures;
        self.skipped += other.skipped;
        self.cached += other.cached;
        self.fetched += other.fetched;
        self.degraded += other.degraded;
    }

    fn record(&mut self, outcome: &RecordOutcome) {
        match outcome {
            RecordOutcome::Cached => self.cached += 1,
            RecordOutcome::Fetched => self.fetched += 1,
            RecordOutcome::Degraded(_) => self.degraded += 1,
        }
    }
}

async fn pause(duration: Duration) {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}

/// Wraps a [`RailSource`] with throttling and cache lookups.
pub struct Fetcher<'a, S> {
    source: &'a S,
    config: FetchConfig,
}

impl<'a, S: RailSource> Fetcher<'a, S> {
    pub fn new(source: &'a S, config: FetchConfig) -> Self {
        Self { source, config }
    }

    /// Fetch the full station list. Not throttled: it is a single request.
    pub async fn list_stations(&self) -> Result<Vec<Station>, KoleoError> {
        self.source.list_stations().await
    }

    /// Whether a cached train counts as resolved.
    fn is_resident(&self, train: &Train) -> bool {
        !(self.config.retry_stubs && train.is_stub())
    }

    /// The cached board for `key`, if every train on it is resident.
    fn resident_board<'d>(&self, key: &BoardKey, dataset: &'d Dataset) -> Option<&'d [TrainId]> {
        let ids = dataset.boards.get(key)?;
        let all_resident = ids
            .iter()
            .all(|id| dataset.trains.get(id).is_some_and(|t| self.is_resident(t)));
        all_resident.then_some(ids.as_slice())
    }

    /// Resolve one departure's train into `trains`.
    pub async fn resolve_train(
        &self,
        train_id: TrainId,
        departure: &Departure,
        station: &Station,
        date: NaiveDate,
        trains: &mut TrainMap,
    ) -> RecordOutcome {
        if let Some(existing) = trains.get(&train_id)
            && self.is_resident(existing)
        {
            return RecordOutcome::Cached;
        }

        let outcome = match self.source.get_train(train_id).await {
            Ok(details) => {
                trains.insert(train_id, Train::full(train_id, departure, date, details));
                RecordOutcome::Fetched
            }
            Err(e) => {
                warn!(
                    train = %train_id,
                    station = %station.id,
                    error = %e,
                    "Failed to fetch train route, storing stub"
                );
                // An older stub stays as it was.
                trains
                    .entry(train_id)
                    .or_insert_with(|| Train::stub(train_id, departure, station, date));
                RecordOutcome::Degraded(e)
            }
        };

        pause(self.config.record_delay).await;
        outcome
    }

    /// Collect every train departing `station` on `date` into `dataset`.
    ///
    /// Fails only when the departure board itself cannot be fetched; a
    /// failing train detail degrades to a stub and the board continues.
    pub async fn fetch_station_day(
        &self,
        station: &Station,
        date: NaiveDate,
        dataset: &mut Dataset,
    ) -> Result<DayReport, KoleoError> {
        let key = BoardKey::new(station.id, date);

        if let Some(ids) = self.resident_board(&key, dataset) {
            debug!(station = %station.id, %date, trains = ids.len(), "Board resolved from cache");
            return Ok(DayReport {
                departures: ids.len(),
                cached: ids.len(),
                board_from_cache: true,
                ..DayReport::default()
            });
        }

        let departures = self.source.list_departures(station.id, date).await?;
        let mut report = DayReport {
            departures: departures.len(),
            ..DayReport::default()
        };
        let mut board: Vec<TrainId> = Vec::with_capacity(departures.len());

        for departure in &departures {
            let Some(train_id) = departure.train_id else {
                report.skipped += 1;
                continue;
            };
            if !board.contains(&train_id) {
                board.push(train_id);
            }

            let outcome = self
                .resolve_train(train_id, departure, station, date, &mut dataset.trains)
                .await;
            report.record(&outcome);
        }

        dataset.boards.insert(key, board);

        if report.fetched + report.degraded > 0 {
            pause(self.config.station_delay).await;
        }

        debug!(
            station = %station.id,
            %date,
            departures = report.departures,
            cached = report.cached,
            fetched = report.fetched,
            degraded = report.degraded,
            "Board resolved"
        );

        Ok(report)
    }
}
