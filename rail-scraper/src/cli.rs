//! Command-line interface.

use std::path::PathBuf;

use clap::Parser;

use crate::config::{ConfigError, CrawlConfig, FetchConfig, ScraperConfig, StoreConfig};
use crate::crawl::SAMPLE_STATIONS;
use crate::filter::StationFilter;

const CHECKPOINT_EVERY: usize = 500;
const SAMPLE_CHECKPOINT_EVERY: usize = 10;

/// Collect Polish railway stations and train routes into a local cache.
///
/// Re-running over the same window reuses the cache and only fetches what
/// is missing.
#[derive(Parser, Debug)]
#[command(name = "rail-scraper")]
#[command(version)]
pub struct Cli {
    /// Only refresh the station list, skip train collection
    #[arg(long)]
    pub stations_only: bool,

    /// Crawl a small fixed set of major stations
    #[arg(long, conflicts_with = "station")]
    pub sample: bool,

    /// Crawl at most this many stations
    #[arg(long, value_name = "N")]
    pub max_stations: Option<usize>,

    /// Crawl only this station (repeatable)
    #[arg(long = "station", value_name = "ID")]
    pub station: Vec<u64>,

    /// Directory holding the cache files and the summary
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub data_dir: PathBuf,

    /// Days to collect, starting tomorrow
    #[arg(long, value_name = "N", default_value_t = 1)]
    pub days: u32,

    /// Save the cache after this many completed stations [default: 500, or 10 with --sample]
    #[arg(long, value_name = "N")]
    pub checkpoint_every: Option<usize>,

    /// Try again to fetch full routes for trains cached as stubs
    #[arg(long)]
    pub retry_stubs: bool,

    /// Don't write uncompressed .json mirrors
    #[arg(long)]
    pub no_plain_mirror: bool,

    /// Drop stations with short names or no coordinates
    #[arg(long)]
    pub filter_stations: bool,

    /// Only keep stations near this point (implies --filter-stations)
    #[arg(long, value_name = "LAT,LON", value_parser = parse_point)]
    pub near: Option<(f64, f64)>,

    /// Distance bound used with --near
    #[arg(long, value_name = "KM", default_value_t = 800.0)]
    pub max_distance_km: f64,

    /// Serve data from a JSON fixture instead of the live API
    #[arg(long, value_name = "FILE")]
    pub mock: Option<PathBuf>,
}

/// Parse `"LAT,LON"` in degrees.
pub fn parse_point(s: &str) -> Result<(f64, f64), String> {
    let (lat, lon) = s
        .split_once(',')
        .ok_or_else(|| format!("expected LAT,LON, got {s:?}"))?;
    let lat: f64 = lat.trim().parse().map_err(|_| format!("invalid latitude {lat:?}"))?;
    let lon: f64 = lon.trim().parse().map_err(|_| format!("invalid longitude {lon:?}"))?;

    if !(-90.0..=90.0).contains(&lat) {
        return Err(format!("latitude {lat} out of range"));
    }
    if !(-180.0..=180.0).contains(&lon) {
        return Err(format!("longitude {lon} out of range"));
    }
    Ok((lat, lon))
}

impl Cli {
    /// Build and validate the run configuration.
    pub fn config(&self) -> Result<ScraperConfig, ConfigError> {
        let mut store = StoreConfig::new(&self.data_dir);
        if self.no_plain_mirror {
            store = store.without_plain_mirror();
        }

        let stations = if self.sample {
            SAMPLE_STATIONS.to_vec()
        } else {
            self.station.clone()
        };

        let checkpoint_every = self.checkpoint_every.unwrap_or(if self.sample {
            SAMPLE_CHECKPOINT_EVERY
        } else {
            CHECKPOINT_EVERY
        });

        let config = ScraperConfig {
            fetch: FetchConfig {
                retry_stubs: self.retry_stubs,
                ..FetchConfig::default()
            },
            store,
            crawl: CrawlConfig {
                window_days: self.days,
                checkpoint_every,
            },
            stations_only: self.stations_only,
            max_stations: self.max_stations,
            stations,
        };
        config.validate()?;
        Ok(config)
    }

    /// The station filter, if any filtering was requested.
    pub fn station_filter(&self) -> Option<StationFilter> {
        if !self.filter_stations && self.near.is_none() {
            return None;
        }
        let filter = StationFilter::new().with_max_distance_km(self.max_distance_km);
        Some(match self.near {
            Some((lat, lon)) => filter.with_near(lat, lon),
            None => filter,
        })
    }
}
