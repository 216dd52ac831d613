//! Domain types for the scraper.
//!
//! Stations and trains are stored exactly as they appear in the cache
//! files. Identifiers are validated integers; anything the upstream may
//! encode loosely (ids, stop times) is normalized on deserialization.

mod departure;
mod lenient;
mod numeric;
mod station;
mod stop_time;
mod train;

pub use departure::{Departure, TrainDetails};
pub use lenient::RawLabel;
pub use numeric::parse_numeric_id;
pub use station::{Station, StationId};
pub use stop_time::RawStopTime;
pub use train::{DepartureContext, Stop, Train, TrainId};
