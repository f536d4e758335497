//! Error types for the dashboard worker
//!
//! Uses thiserror for ergonomic error definitions.
//! All errors are non-panicking for production safety.
//!
//! Failure taxonomy: only a failed required source is fatal to a composed
//! view. Best-effort source failures and per-item enrichment failures are
//! downgraded inside the composition layer and never become a
//! `DashboardError`.

use thiserror::Error;

/// Custom Result type using our Error
pub type Result<T> = std::result::Result<T, DashboardError>;

/// Dashboard worker errors
#[derive(Error, Debug)]
pub enum DashboardError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// A required source fetch failed; aborts the whole composed view
    #[error("Required source '{source_name}' failed: {reason}")]
    RequiredSource { source_name: String, reason: String },

    /// Dashboard API errors (non-success status, malformed payload)
    #[error("Dashboard API error: {0}")]
    Api(String),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(String),

    /// JSON parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Worker runtime errors
    #[error("Worker error: {0}")]
    Worker(String),

    /// Storage errors (KV view state)
    #[error("Storage error: {0}")]
    Storage(String),
}

impl DashboardError {
    /// Build the fatal error for a failed required source
    pub fn required_source(source: &str, reason: impl Into<String>) -> Self {
        Self::RequiredSource {
            source_name: source.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<worker::Error> for DashboardError {
    fn from(err: worker::Error) -> Self {
        DashboardError::Worker(err.to_string())
    }
}

impl From<reqwest::Error> for DashboardError {
    fn from(err: reqwest::Error) -> Self {
        DashboardError::Http(err.to_string())
    }
}

impl From<DashboardError> for worker::Error {
    fn from(err: DashboardError) -> Self {
        worker::Error::RustError(err.to_string())
    }
}
