//! The data source abstraction the fetcher is written against.

use chrono::NaiveDate;

use crate::domain::{Departure, Station, StationId, TrainDetails, TrainId};

use super::error::KoleoError;

/// The three operations the scraper needs from a rail data source.
///
/// Implementations issue exactly one upstream request per call; throttling
/// is the caller's concern. This allows the crawl to be tested against
/// `MockSource`.
#[allow(async_fn_in_trait)]
pub trait RailSource {
    /// List every station the source knows about.
    async fn list_stations(&self) -> Result<Vec<Station>, KoleoError>;

    /// List departures from `station` on `date`.
    async fn list_departures(
        &self,
        station: StationId,
        date: NaiveDate,
    ) -> Result<Vec<Departure>, KoleoError>;

    /// Resolve the full route of a train.
    async fn get_train(&self, train_id: TrainId) -> Result<TrainDetails, KoleoError>;
}
