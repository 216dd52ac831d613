//! Resumable scraper for Polish railway stations and train routes.
//!
//! Collects the station list and every train departing each station over a
//! short window of days from the Koleo API, keeping everything in a gzip
//! JSON cache so an interrupted or repeated run only fetches what is missing.

pub mod cli;
pub mod config;
pub mod crawl;
pub mod domain;
pub mod fetch;
pub mod filter;
pub mod koleo;
pub mod store;
pub mod summary;
