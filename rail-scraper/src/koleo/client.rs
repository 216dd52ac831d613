//! Koleo HTTP client.
//!
//! Provides async methods for the three endpoints the scraper uses.
//! Transient failures (timeouts, 429, 5xx) are retried a fixed number of
//! times with a fixed pause; everything else is returned immediately.

use std::time::Duration;

use chrono::NaiveDate;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::ConfigError;
use crate::domain::{Departure, Station, StationId, TrainDetails, TrainId};

use super::convert::{convert_departures, convert_stations, convert_train_details};
use super::error::KoleoError;
use super::source::RailSource;
use super::types::TrainDetailsDto;

/// Default base URL for the Koleo API.
const DEFAULT_BASE_URL: &str = "https://koleo.pl";

/// Environment variable overriding the base URL.
pub const BASE_URL_ENV: &str = "KOLEO_BASE_URL";

/// Environment variable overriding the request timeout (seconds).
pub const TIMEOUT_ENV: &str = "KOLEO_TIMEOUT_SECS";

/// Configuration for the Koleo client.
#[derive(Debug, Clone)]
pub struct KoleoConfig {
    /// Base URL for the API
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// How many times a transient failure is retried
    pub retry_attempts: u32,
    /// Pause before each retry
    pub retry_delay: Duration,
}

impl KoleoConfig {
    /// Create a config pointing at the production API.
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
            retry_attempts: 3,
            retry_delay: Duration::from_secs(5),
        }
    }

    /// Apply `KOLEO_BASE_URL` and `KOLEO_TIMEOUT_SECS` when set.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::new();

        if let Some(url) = lookup(BASE_URL_ENV)
            && !url.trim().is_empty()
        {
            config.base_url = url.trim().trim_end_matches('/').to_string();
        }

        if let Some(raw) = lookup(TIMEOUT_ENV) {
            config.timeout_secs = raw.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                name: TIMEOUT_ENV,
                value: raw.clone(),
            })?;
        }

        Ok(config)
    }

    /// Set a custom base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set retry behaviour.
    pub fn with_retries(mut self, attempts: u32, delay: Duration) -> Self {
        self.retry_attempts = attempts;
        self.retry_delay = delay;
        self
    }
}

impl Default for KoleoConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Client for the Koleo rail API.
#[derive(Debug, Clone)]
pub struct KoleoClient {
    http: reqwest::Client,
    base_url: String,
    retry_attempts: u32,
    retry_delay: Duration,
}

impl KoleoClient {
    /// Create a new Koleo API client.
    pub fn new(config: KoleoConfig) -> Result<Self, KoleoError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static("x-koleo-version"),
            HeaderValue::from_static("1"),
        );
        // Required by the timetable endpoints since the EOL response rework.
        headers.insert(
            HeaderName::from_static("accept-eol-response-version"),
            HeaderValue::from_static("1"),
        );

        if !config.base_url.starts_with("http://") && !config.base_url.starts_with("https://") {
            return Err(KoleoError::Config(format!(
                "base URL must be http(s): {}",
                config.base_url
            )));
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url,
            retry_attempts: config.retry_attempts,
            retry_delay: config.retry_delay,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET `path` and parse the body, retrying transient failures.
    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, KoleoError> {
        let mut attempt = 0;
        loop {
            match self.get_json_once(path).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < self.retry_attempts => {
                    attempt += 1;
                    warn!(
                        path,
                        attempt,
                        error = %e,
                        "Transient Koleo error, retrying"
                    );
                    tokio::time::sleep(self.retry_delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn get_json_once<T: DeserializeOwned>(&self, path: &str) -> Result<T, KoleoError> {
        let url = self.url(path);
        debug!(%url, "GET");

        let response = self.http.get(&url).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(KoleoError::NotFound(path.to_string()));
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(KoleoError::RateLimited);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(KoleoError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text().await?;

        serde_json::from_str(&body).map_err(|e| KoleoError::Json {
            message: e.to_string(),
            body: Some(body.chars().take(500).collect()),
        })
    }
}

impl RailSource for KoleoClient {
    async fn list_stations(&self) -> Result<Vec<Station>, KoleoError> {
        let values: Vec<serde_json::Value> = self.get_json("/api/v2/main/stations").await?;
        Ok(convert_stations(values))
    }

    async fn list_departures(
        &self,
        station: StationId,
        date: NaiveDate,
    ) -> Result<Vec<Departure>, KoleoError> {
        let path = format!(
            "/api/v2/main/timetables/{}/{}/departures",
            station,
            date.format("%Y-%m-%d")
        );
        let values: Vec<serde_json::Value> = self.get_json(&path).await?;
        Ok(convert_departures(values))
    }

    async fn get_train(&self, train_id: TrainId) -> Result<TrainDetails, KoleoError> {
        let path = format!("/api/v2/main/train_calendars/{train_id}");
        let dto: TrainDetailsDto = self.get_json(&path).await?;
        Ok(convert_train_details(dto))
    }
}
