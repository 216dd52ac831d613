//! Scraper configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Errors building a configuration from the environment or arguments.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// Environment variable present but unparseable
    #[error("invalid value for {name}: {value:?}")]
    InvalidEnv { name: &'static str, value: String },

    /// Argument combination or value that cannot work
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Throttling for the rate-limited fetcher.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Pause after each train detail request.
    pub record_delay: Duration,

    /// Pause after a station's board for one date, when it needed the network.
    pub station_delay: Duration,

    /// Treat cached stubs as misses and try to replace them with full routes.
    pub retry_stubs: bool,
}

impl FetchConfig {
    /// No pauses at all; for tests and mock runs.
    pub fn unthrottled() -> Self {
        Self {
            record_delay: Duration::ZERO,
            station_delay: Duration::ZERO,
            retry_stubs: false,
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            record_delay: Duration::from_millis(200),
            station_delay: Duration::from_millis(500),
            retry_stubs: false,
        }
    }
}

/// Where and how the cache is persisted.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Directory holding `stations.json[.gz]` and `trains.json[.gz]`.
    pub data_dir: PathBuf,

    /// Also write uncompressed `.json` mirrors next to the `.json.gz` files.
    pub write_plain_mirror: bool,
}

impl StoreConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            write_plain_mirror: true,
        }
    }

    pub fn without_plain_mirror(mut self) -> Self {
        self.write_plain_mirror = false;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new(".")
    }
}

/// Crawl loop parameters.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Number of consecutive days, starting tomorrow, to collect per station.
    pub window_days: u32,

    /// Persist the whole cache after this many completed stations.
    pub checkpoint_every: usize,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            window_days: 1,
            checkpoint_every: 500,
        }
    }
}

/// Complete configuration for one scraper run.
#[derive(Debug, Clone, Default)]
pub struct ScraperConfig {
    pub fetch: FetchConfig,
    pub store: StoreConfig,
    pub crawl: CrawlConfig,

    /// Only refresh the station list; skip train collection.
    pub stations_only: bool,

    /// Crawl at most this many stations (sample run).
    pub max_stations: Option<usize>,

    /// Crawl exactly these stations instead of the full list.
    pub stations: Vec<u64>,
}

impl ScraperConfig {
    /// Path of the summary report.
    pub fn summary_path(&self) -> PathBuf {
        self.store.data_dir.join("scraping_summary.json")
    }

    /// Reject values the crawl cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.crawl.window_days == 0 {
            return Err(ConfigError::Invalid("window must cover at least one day".into()));
        }
        if self.crawl.checkpoint_every == 0 {
            return Err(ConfigError::Invalid("checkpoint interval must be positive".into()));
        }
        if self.max_stations == Some(0) {
            return Err(ConfigError::Invalid("max stations must be positive".into()));
        }
        Ok(())
    }
}
