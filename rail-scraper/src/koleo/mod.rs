//! Koleo rail API client.
//!
//! This module provides the `RailSource` abstraction the scraper is written
//! against, an HTTP implementation for the Koleo API, and an in-memory mock.
//!
//! Key characteristics of the API:
//! - Station and train ids are integers, but older payloads send them as
//!   strings
//! - A departure board row references its train only through the first
//!   nested station entry
//! - Train details are a separate request per train

mod client;
mod convert;
mod error;
mod mock;
mod source;
mod types;

pub use client::{BASE_URL_ENV, KoleoClient, KoleoConfig, TIMEOUT_ENV};
pub use convert::ConversionError;
pub use error::KoleoError;
pub use mock::{CallCounts, MockSource};
pub use source::RailSource;
pub use types::{DepartureDto, StationDto, StopDto, TrainDetailsDto};
