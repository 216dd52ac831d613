//! Koleo client error types.

/// Errors that can occur when talking to the rail data source.
#[derive(Debug, thiserror::Error)]
pub enum KoleoError {
    /// HTTP request failed (network error, timeout, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error status
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// The requested station or train does not exist upstream
    #[error("not found: {0}")]
    NotFound(String),

    /// Rate limited by the API
    #[error("rate limited by Koleo API")]
    RateLimited,

    /// Failed to parse response JSON
    #[error("JSON parse error: {message}")]
    Json {
        message: String,
        body: Option<String>,
    },

    /// Client could not be constructed from its configuration
    #[error("invalid client configuration: {0}")]
    Config(String),

    /// Mock fixture could not be loaded
    #[error("mock data error: {0}")]
    Mock(String),
}

impl KoleoError {
    /// Whether retrying the same request later may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            KoleoError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            KoleoError::Api { status, .. } => *status >= 500,
            KoleoError::RateLimited => true,
            KoleoError::NotFound(_)
            | KoleoError::Json { .. }
            | KoleoError::Config(_)
            | KoleoError::Mock(_) => false,
        }
    }
}
