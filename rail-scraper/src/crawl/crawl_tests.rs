//! Scenario tests for the crawl loop.

use super::*;
use crate::config::StoreConfig;
use crate::domain::{Departure, Stop, TrainDetails, TrainId};
use crate::koleo::MockSource;
use std::time::Duration;
use tempfile::{TempDir, tempdir};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
}

fn tomorrow() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 2).unwrap()
}

fn sid(id: u64) -> StationId {
    StationId::new(id)
}

fn tid(id: u64) -> TrainId {
    TrainId::new(id)
}

fn route(name: &str, calls: &[(u64, &str, &str, &str)]) -> TrainDetails {
    TrainDetails {
        route_name: name.to_string(),
        stops: calls
            .iter()
            .map(|(station, station_name, arr, dep)| Stop {
                station_id: Some(sid(*station)),
                station_name: Some((*station_name).to_string()),
                arrival_time: (!arr.is_empty()).then(|| (*arr).to_string()),
                departure_time: (!dep.is_empty()).then(|| (*dep).to_string()),
            })
            .collect(),
    }
}

/// Station `n` has one departure, train `n * 100`, running to station 9.
fn network(stations: &[u64]) -> MockSource {
    let mut mock = MockSource::new().with_station(Station::new(sid(9), "Terminus"));
    for &n in stations {
        let train = tid(n * 100);
        mock = mock
            .with_station(Station::new(sid(n), format!("Station {n}")))
            .with_departures(sid(n), vec![Departure::for_train(train)])
            .with_train(
                train,
                route(
                    &format!("Route {n}"),
                    &[(n, "Start", "", "08:00:00"), (9, "Terminus", "09:30:00", "")],
                ),
            );
    }
    mock
}

fn store_in(dir: &TempDir) -> CacheStore {
    CacheStore::new(StoreConfig::new(dir.path()))
}

fn crawl_config(window_days: u32, checkpoint_every: usize) -> CrawlConfig {
    CrawlConfig {
        window_days,
        checkpoint_every,
    }
}

async fn discovered(mock: &MockSource, dataset: &mut Dataset) -> Vec<StationId> {
    let fetcher = Fetcher::new(mock, FetchConfig::unthrottled());
    let ids = discover_stations(&fetcher, dataset, None).await;
    mock.reset_calls();
    ids
}

// ============================================================================
// Basic scenario
// ============================================================================

#[tokio::test]
async fn single_station_single_train() {
    let mock = MockSource::new()
        .with_station(Station::new(sid(1), "A"))
        .with_dated_departures(sid(1), tomorrow(), vec![Departure::for_train(tid(100))])
        .with_train(
            tid(100),
            route("R", &[(1, "A", "", "08:00:00"), (2, "B", "09:00:00", "")]),
        );
    let dir = tempdir().unwrap();
    let store = store_in(&dir);
    let mut dataset = Dataset::new();
    discovered(&mock, &mut dataset).await;

    let mut crawler = Crawler::new(&mock, &store, FetchConfig::unthrottled(), crawl_config(1, 500));
    let report = crawler.run(&mut dataset, &[sid(1)], today()).await;

    assert_eq!(report.processed, 1);
    assert_eq!(report.fetched, 1);
    assert_eq!(crawler.progress().state(sid(1)), EntityState::Done);
    assert_eq!(crawler.progress().done_count(), 1);

    let train = &dataset.trains[&tid(100)];
    assert_eq!(train.date, tomorrow());
    assert_eq!(train.stops.len(), 2);
    assert_eq!(train.stops[1].arrival_time.as_deref(), Some("09:00:00"));

    let json = serde_json::to_value(&dataset.trains).unwrap();
    assert_eq!(json["100"]["stops"][0]["station_id"], 1);
}

#[test]
fn window_starts_tomorrow() {
    let window = date_window(today(), 3);
    assert_eq!(
        window,
        vec![
            tomorrow(),
            NaiveDate::from_ymd_opt(2025, 6, 3).unwrap(),
            NaiveDate::from_ymd_opt(2025, 6, 4).unwrap(),
        ]
    );
    assert!(date_window(today(), 0).is_empty());
}

#[tokio::test]
async fn multi_day_window_fetches_each_train_once() {
    let mock = network(&[1]);
    let dir = tempdir().unwrap();
    let store = store_in(&dir);
    let mut dataset = Dataset::new();
    let ids = discovered(&mock, &mut dataset).await;

    let mut crawler = Crawler::new(&mock, &store, FetchConfig::unthrottled(), crawl_config(3, 500));
    let report = crawler.run(&mut dataset, &ids, today()).await;

    assert_eq!(mock.calls().list_departures, 3 * ids.len());
    // Train 100 is fetched on the first day and cached for the next two.
    assert_eq!(mock.calls().get_train, 1);
    assert_eq!(report.fetched, 1);
    assert_eq!(report.cached, 2);
    assert_eq!(dataset.boards.len(), 3 * ids.len());
}

// ============================================================================
// Idempotence
// ============================================================================

#[tokio::test]
async fn done_stations_are_skipped_without_requests() {
    let mock = network(&[1, 2]);
    let dir = tempdir().unwrap();
    let store = store_in(&dir);
    let mut dataset = Dataset::new();
    let ids = discovered(&mock, &mut dataset).await;

    let mut crawler = Crawler::new(&mock, &store, FetchConfig::unthrottled(), crawl_config(1, 500));
    crawler.run(&mut dataset, &ids, today()).await;
    mock.reset_calls();

    let report = crawler.run(&mut dataset, &ids, today()).await;
    assert_eq!(report.skipped, ids.len());
    assert_eq!(report.processed, 0);
    assert_eq!(mock.calls().total(), 0);
}

#[tokio::test]
async fn restart_over_cached_window_issues_no_requests() {
    let mock = network(&[1, 2]);
    let dir = tempdir().unwrap();
    let store = store_in(&dir);
    let mut dataset = Dataset::new();
    let ids = discovered(&mock, &mut dataset).await;

    let mut first = Crawler::new(&mock, &store, FetchConfig::unthrottled(), crawl_config(2, 500));
    first.run(&mut dataset, &ids, today()).await;
    store.save(&dataset).unwrap();
    mock.reset_calls();

    // Fresh process: empty processed-set, dataset reloaded from disk.
    let mut reloaded = store.load();
    let mut second = Crawler::new(&mock, &store, FetchConfig::unthrottled(), crawl_config(2, 500));
    let report = second.run(&mut reloaded, &ids, today()).await;

    assert_eq!(mock.calls().total(), 0);
    assert_eq!(report.network_requests, 0);
    assert_eq!(report.processed, ids.len());
    assert_eq!(report.boards_from_cache, 2 * ids.len());
    assert_eq!(reloaded.trains, dataset.trains);
}

#[tokio::test(start_paused = true)]
async fn cached_rerun_does_not_sleep() {
    let mock = network(&[1]);
    let dir = tempdir().unwrap();
    let store = store_in(&dir);
    let mut dataset = Dataset::new();
    let ids = discovered(&mock, &mut dataset).await;

    let start = tokio::time::Instant::now();
    Crawler::new(&mock, &store, FetchConfig::default(), crawl_config(1, 500))
        .run(&mut dataset, &ids, today())
        .await;
    assert_eq!(start.elapsed(), Duration::from_millis(200 + 500));

    let start = tokio::time::Instant::now();
    Crawler::new(&mock, &store, FetchConfig::default(), crawl_config(1, 500))
        .run(&mut dataset, &ids, today())
        .await;
    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test]
async fn boards_before_window_are_pruned() {
    let mock = network(&[1]);
    let dir = tempdir().unwrap();
    let store = store_in(&dir);
    let mut dataset = Dataset::new();
    let ids = discovered(&mock, &mut dataset).await;

    let stale = crate::store::BoardKey::new(sid(1), today());
    dataset.boards.insert(stale, vec![tid(100)]);

    Crawler::new(&mock, &store, FetchConfig::unthrottled(), crawl_config(1, 500))
        .run(&mut dataset, &ids, today())
        .await;

    assert!(!dataset.boards.contains_key(&stale));
    assert!(dataset.boards.contains_key(&crate::store::BoardKey::new(sid(1), tomorrow())));
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn failed_detail_leaves_stub() {
    let mock = network(&[1]).with_failing_train(tid(100));
    let dir = tempdir().unwrap();
    let store = store_in(&dir);
    let mut dataset = Dataset::new();
    let ids = discovered(&mock, &mut dataset).await;

    let report = Crawler::new(&mock, &store, FetchConfig::unthrottled(), crawl_config(1, 500))
        .run(&mut dataset, &ids, today())
        .await;

    assert_eq!(report.degraded, 1);
    assert_eq!(report.failed, 0);
    let stub = &dataset.trains[&tid(100)];
    assert!(stub.stops.is_empty());
    assert_eq!(stub.date, tomorrow());
}

#[tokio::test]
async fn failing_station_is_marked_done_and_crawl_continues() {
    let mock = network(&[1, 2, 3]).with_failing_station(sid(2));
    let dir = tempdir().unwrap();
    let store = store_in(&dir);
    let mut dataset = Dataset::new();
    let ids = discovered(&mock, &mut dataset).await;
    let worklist = [sid(1), sid(2), sid(3)];

    let mut crawler = Crawler::new(&mock, &store, FetchConfig::unthrottled(), crawl_config(1, 500));
    let report = crawler.run(&mut dataset, &worklist, today()).await;

    assert_eq!(ids.len(), 4);
    assert_eq!(report.processed, 3);
    assert_eq!(report.failed, 1);
    assert_eq!(crawler.progress().state(sid(2)), EntityState::Done);
    assert!(dataset.trains.contains_key(&tid(100)));
    assert!(!dataset.trains.contains_key(&tid(200)));
    assert!(dataset.trains.contains_key(&tid(300)));
}

#[tokio::test]
async fn degraded_train_on_later_day_still_completes_station() {
    let day_two = NaiveDate::from_ymd_opt(2025, 6, 3).unwrap();
    let mock = MockSource::new()
        .with_station(Station::new(sid(1), "A"))
        .with_dated_departures(sid(1), tomorrow(), vec![Departure::for_train(tid(100))])
        .with_dated_departures(sid(1), day_two, vec![Departure::for_train(tid(101))])
        .with_train(tid(100), route("R", &[(1, "A", "", "08:00:00")]))
        .with_train(tid(101), route("S", &[(1, "A", "", "10:00:00")]));
    let dir = tempdir().unwrap();
    let store = store_in(&dir);
    let mut dataset = Dataset::new();
    discovered(&mock, &mut dataset).await;

    // Day two's board names a train the source can't resolve, so it degrades
    // rather than failing; the station itself still completes.
    let mock = mock.with_failing_train(tid(101));
    let report = Crawler::new(&mock, &store, FetchConfig::unthrottled(), crawl_config(2, 500))
        .run(&mut dataset, &[sid(1)], today())
        .await;

    assert_eq!(report.failed, 0);
    assert!(!dataset.trains[&tid(100)].is_stub());
    assert!(dataset.trains[&tid(101)].is_stub());
}

#[tokio::test]
async fn unknown_stations_are_skipped() {
    let mock = network(&[1]);
    let dir = tempdir().unwrap();
    let store = store_in(&dir);
    let mut dataset = Dataset::new();
    discovered(&mock, &mut dataset).await;

    let mut crawler = Crawler::new(&mock, &store, FetchConfig::unthrottled(), crawl_config(1, 500));
    let report = crawler.run(&mut dataset, &[sid(1), sid(77)], today()).await;

    assert_eq!(report.processed, 1);
    assert_eq!(report.unknown, 1);
    assert_eq!(crawler.progress().state(sid(77)), EntityState::Pending);
    assert_eq!(mock.calls().list_departures, 1);
}

#[tokio::test]
async fn station_list_failure_yields_empty_worklist() {
    let mock = network(&[1]).with_failing_station_list();
    let fetcher = Fetcher::new(&mock, FetchConfig::unthrottled());
    let mut dataset = Dataset::new();

    let ids = discover_stations(&fetcher, &mut dataset, None).await;
    assert!(ids.is_empty());
    assert!(dataset.stations.is_empty());
}

// ============================================================================
// Checkpoints
// ============================================================================

#[tokio::test]
async fn checkpoint_after_every_k_stations() {
    let mock = network(&[1, 2, 3]);
    let dir = tempdir().unwrap();
    let store = store_in(&dir);
    let mut dataset = Dataset::new();
    discovered(&mock, &mut dataset).await;

    let report = Crawler::new(&mock, &store, FetchConfig::unthrottled(), crawl_config(1, 2))
        .run(&mut dataset, &[sid(1), sid(2), sid(3)], today())
        .await;
    assert_eq!(report.checkpoints, 1);

    // What a killed process would leave behind: the state after station 2.
    let on_disk = store.load();
    assert!(on_disk.trains.contains_key(&tid(100)));
    assert!(on_disk.trains.contains_key(&tid(200)));
    assert!(!on_disk.trains.contains_key(&tid(300)));
    assert_eq!(on_disk.stations.len(), 4);
}

#[tokio::test]
async fn checkpoint_failure_does_not_stop_the_crawl() {
    let mock = network(&[1, 2]);
    let dir = tempdir().unwrap();
    // A regular file where the data directory should be.
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, b"").unwrap();
    let store = CacheStore::new(StoreConfig::new(blocker.join("data")));
    let mut dataset = Dataset::new();
    discovered(&mock, &mut dataset).await;

    let report = Crawler::new(&mock, &store, FetchConfig::unthrottled(), crawl_config(1, 1))
        .run(&mut dataset, &[sid(1), sid(2)], today())
        .await;

    assert_eq!(report.processed, 2);
    assert_eq!(report.checkpoints, 0);
    assert_eq!(report.checkpoint_failures, 2);
    assert_eq!(dataset.trains.len(), 2);
}

// ============================================================================
// Worklist selection
// ============================================================================

#[test]
fn worklist_defaults_to_discovered() {
    let discovered = [sid(3), sid(1), sid(2)];
    assert_eq!(select_worklist(&discovered, &[], None), discovered.to_vec());
    assert_eq!(select_worklist(&discovered, &[], Some(2)), vec![sid(3), sid(1)]);
}

#[test]
fn requested_ids_must_be_known() {
    let discovered = [sid(1), sid(2), sid(3)];
    let selected = select_worklist(&discovered, &[sid(3), sid(8), sid(1)], None);
    assert_eq!(selected, vec![sid(3), sid(1)]);
    assert!(select_worklist(&[], &[sid(1)], None).is_empty());
}
