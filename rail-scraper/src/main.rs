use std::process::ExitCode;

use chrono::Local;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use rail_scraper::cli::Cli;
use rail_scraper::config::{ConfigError, ScraperConfig};
use rail_scraper::crawl::{Crawler, discover_stations, select_worklist};
use rail_scraper::domain::StationId;
use rail_scraper::filter::StationFilter;
use rail_scraper::koleo::{KoleoClient, KoleoConfig, KoleoError, MockSource, RailSource};
use rail_scraper::store::{CacheStore, StoreError};
use rail_scraper::summary::Summary;

/// Conditions that end a run early.
#[derive(Debug, thiserror::Error)]
enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to initialize data source: {0}")]
    Source(#[from] KoleoError),

    #[error("failed to write results: {0}")]
    Store(#[from] StoreError),
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    match start(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Scraper failed");
            ExitCode::FAILURE
        }
    }
}

async fn start(cli: &Cli) -> Result<(), RunError> {
    let config = cli.config()?;
    let filter = cli.station_filter();

    match &cli.mock {
        Some(path) => {
            let source = MockSource::from_file(path)?;
            info!(path = %path.display(), "Using mock data source");
            run(&source, &config, filter.as_ref()).await
        }
        None => {
            let client_config = KoleoConfig::from_env()?;
            info!(base_url = %client_config.base_url, "Using Koleo API");
            let client = KoleoClient::new(client_config)?;
            run(&client, &config, filter.as_ref()).await
        }
    }
}

async fn run<S: RailSource>(
    source: &S,
    config: &ScraperConfig,
    filter: Option<&StationFilter>,
) -> Result<(), RunError> {
    let store = CacheStore::new(config.store.clone());
    let mut dataset = store.load();

    let mut crawler = Crawler::new(source, &store, config.fetch.clone(), config.crawl.clone());
    let discovered = discover_stations(crawler.fetcher(), &mut dataset, filter).await;

    let processed = if config.stations_only {
        info!(stations = dataset.stations.len(), "Station list only, skipping trains");
        0
    } else {
        let requested: Vec<StationId> = config.stations.iter().copied().map(StationId::new).collect();
        let worklist = select_worklist(&discovered, &requested, config.max_stations);
        let report = crawler.run(&mut dataset, &worklist, Local::now().date_naive()).await;
        report.processed
    };

    store.save(&dataset)?;

    let summary = Summary::compute(&dataset, processed, Local::now());
    let path = config.summary_path();
    summary.write(&path)?;

    info!(
        stations = summary.total_stations,
        trains = summary.total_trains,
        complete_routes = summary.trains_with_complete_routes,
        stops = summary.total_stops_across_all_trains,
        processed = summary.stations_processed,
        path = %path.display(),
        "Scraping complete"
    );
    Ok(())
}
