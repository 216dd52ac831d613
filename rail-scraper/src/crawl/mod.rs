//! The resumable crawl loop.
//!
//! The crawl walks a worklist of stations. For each station not yet done it
//! collects every train departing over a window of days starting tomorrow,
//! then marks the station done. Every `checkpoint_every` completed stations
//! the whole dataset is written to disk, so a killed run loses at most one
//! interval of work; on restart the board and train caches let finished
//! stations resolve without requests.
//!
//! Failures are contained: a station whose board cannot be fetched is
//! logged and still marked done, and a failing checkpoint is logged and the
//! crawl carries on.

mod progress;

#[cfg(test)]
mod crawl_tests;

use std::collections::BTreeSet;

use chrono::{Days, NaiveDate};
use tracing::{debug, info, warn};

use crate::config::{CrawlConfig, FetchConfig};
use crate::domain::{Station, StationId};
use crate::fetch::{DayReport, Fetcher};
use crate::filter::StationFilter;
use crate::koleo::{KoleoError, RailSource};
use crate::store::{CacheStore, Dataset};

pub use progress::{EntityState, Progress};

/// A handful of large stations for quick sample runs.
pub const SAMPLE_STATIONS: [u64; 5] = [61358, 45682, 80416, 60103, 33605];

/// The `days` dates following `today`.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use rail_scraper::crawl::date_window;
///
/// let today = NaiveDate::from_ymd_opt(2025, 6, 30).unwrap();
/// let window = date_window(today, 2);
/// assert_eq!(window[0], NaiveDate::from_ymd_opt(2025, 7, 1).unwrap());
/// assert_eq!(window.len(), 2);
/// ```
pub fn date_window(today: NaiveDate, days: u32) -> Vec<NaiveDate> {
    (1..=u64::from(days))
        .filter_map(|offset| today.checked_add_days(Days::new(offset)))
        .collect()
}

/// Fetch the station list and merge it into `dataset`.
///
/// Returns the ids of the stations kept. A failure to list stations is
/// logged and yields an empty list, leaving `dataset` untouched.
pub async fn discover_stations<S: RailSource>(
    fetcher: &Fetcher<'_, S>,
    dataset: &mut Dataset,
    filter: Option<&StationFilter>,
) -> Vec<StationId> {
    let stations = match fetcher.list_stations().await {
        Ok(stations) => stations,
        Err(e) => {
            warn!(error = %e, "Failed to fetch station list, nothing to crawl");
            return Vec::new();
        }
    };
    let fetched = stations.len();

    let stations = match filter {
        Some(filter) => {
            let (kept, stats) = filter.apply(stations);
            info!(
                kept = stats.kept,
                short_name = stats.short_name,
                missing_coordinates = stats.missing_coordinates,
                too_far = stats.too_far,
                "Filtered stations"
            );
            kept
        }
        None => stations,
    };

    let ids: Vec<StationId> = stations.iter().map(|s| s.id).collect();
    let added = dataset.merge_stations(stations);
    info!(fetched, kept = ids.len(), new = added, "Fetched station list");
    ids
}

/// Choose which discovered stations to crawl.
///
/// Explicitly requested ids are crawled in the order given, but only if the
/// station list contained them. Otherwise the discovered list is used,
/// truncated to `max_stations`.
pub fn select_worklist(
    discovered: &[StationId],
    requested: &[StationId],
    max_stations: Option<usize>,
) -> Vec<StationId> {
    let mut worklist: Vec<StationId> = if requested.is_empty() {
        discovered.to_vec()
    } else {
        let known: BTreeSet<StationId> = discovered.iter().copied().collect();
        requested
            .iter()
            .copied()
            .filter(|id| {
                let found = known.contains(id);
                if !found {
                    warn!(station = %id, "Requested station not in station list");
                }
                found
            })
            .collect()
    };

    if let Some(max) = max_stations {
        worklist.truncate(max);
    }
    worklist
}

/// Totals for one [`Crawler::run`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlReport {
    /// Stations crawled and marked done, including failed ones.
    pub processed: usize,
    /// Worklist entries already done before this run.
    pub skipped: usize,
    /// Worklist entries with no cached station.
    pub unknown: usize,
    /// Stations whose crawl stopped on an error.
    pub failed: usize,
    pub cached: usize,
    pub fetched: usize,
    pub degraded: usize,
    pub boards_from_cache: usize,
    pub network_requests: usize,
    pub checkpoints: usize,
    pub checkpoint_failures: usize,
}

impl CrawlReport {
    fn absorb(&mut self, day: &DayReport) {
        self.cached += day.cached;
        self.fetched += day.fetched;
        self.degraded += day.degraded;
        self.network_requests += day.network_requests();
        if day.board_from_cache {
            self.boards_from_cache += 1;
        }
    }
}

/// Drives a [`Fetcher`] over a worklist and checkpoints through a
/// [`CacheStore`].
pub struct Crawler<'a, S> {
    fetcher: Fetcher<'a, S>,
    store: &'a CacheStore,
    config: CrawlConfig,
    progress: Progress,
}

impl<'a, S: RailSource> Crawler<'a, S> {
    pub fn new(source: &'a S, store: &'a CacheStore, fetch: FetchConfig, config: CrawlConfig) -> Self {
        Self {
            fetcher: Fetcher::new(source, fetch),
            store,
            config,
            progress: Progress::new(),
        }
    }

    pub fn fetcher(&self) -> &Fetcher<'a, S> {
        &self.fetcher
    }

    pub fn progress(&self) -> &Progress {
        &self.progress
    }

    /// Crawl every pending station of `worklist` over the window after
    /// `today`.
    pub async fn run(
        &mut self,
        dataset: &mut Dataset,
        worklist: &[StationId],
        today: NaiveDate,
    ) -> CrawlReport {
        let window = date_window(today, self.config.window_days);
        let mut report = CrawlReport::default();

        if let Some(&first) = window.first() {
            let pruned = dataset.prune_boards_before(first);
            if pruned > 0 {
                debug!(pruned, "Dropped boards older than the crawl window");
            }
        }

        info!(stations = worklist.len(), days = window.len(), "Starting crawl");
        let total = worklist.len();

        for (index, &id) in worklist.iter().enumerate() {
            if self.progress.is_done(id) {
                report.skipped += 1;
                continue;
            }
            let Some(station) = dataset.stations.get(&id).cloned() else {
                warn!(station = %id, "Station not in cache, skipping");
                report.unknown += 1;
                continue;
            };

            self.progress.start(id);
            let mut days = Vec::with_capacity(window.len());
            let result = self.crawl_station(&station, &window, dataset, &mut days).await;

            let mut totals = DayReport::default();
            for day in &days {
                report.absorb(day);
                totals.add(day);
            }

            match result {
                Ok(()) => info!(
                    station = %id,
                    name = %station.name,
                    progress = format!("{}/{}", index + 1, total),
                    trains = totals.trains(),
                    cached = totals.cached,
                    new = totals.fetched,
                    degraded = totals.degraded,
                    "Completed station"
                ),
                Err(e) => {
                    report.failed += 1;
                    // The failed board request.
                    report.network_requests += 1;
                    warn!(
                        station = %id,
                        name = %station.name,
                        days_done = days.len(),
                        error = %e,
                        "Failed to collect trains for station"
                    );
                }
            }

            let done = self.progress.finish(id);
            report.processed += 1;

            let every = self.config.checkpoint_every;
            if every > 0 && done % every == 0 {
                self.checkpoint(dataset, done, &mut report);
            }
        }

        info!(
            processed = report.processed,
            stations_done = self.progress.done_count(),
            failed = report.failed,
            cached = report.cached,
            fetched = report.fetched,
            degraded = report.degraded,
            requests = report.network_requests,
            "Crawl finished"
        );

        report
    }

    /// Collect one station over the window. Stops at the first board that
    /// cannot be fetched; days already collected stay in `dataset`.
    async fn crawl_station(
        &self,
        station: &Station,
        window: &[NaiveDate],
        dataset: &mut Dataset,
        days: &mut Vec<DayReport>,
    ) -> Result<(), KoleoError> {
        for &date in window {
            let day = self.fetcher.fetch_station_day(station, date, dataset).await?;
            days.push(day);
        }
        Ok(())
    }

    fn checkpoint(&self, dataset: &Dataset, done: usize, report: &mut CrawlReport) {
        match self.store.save(dataset) {
            Ok(_) => {
                report.checkpoints += 1;
                info!(stations_done = done, trains = dataset.trains.len(), "Checkpoint saved");
            }
            Err(e) => {
                report.checkpoint_failures += 1;
                warn!(stations_done = done, error = %e, "Checkpoint failed, continuing");
            }
        }
    }
}
