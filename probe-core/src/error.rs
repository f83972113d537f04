//! Error types surfaced by the core.

use thiserror::Error;

/// Failure while merging series for a chart.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SeriesError {
    #[error("series key '{0}' is produced by more than one series")]
    DuplicateKey(String),
    #[error("series key '{0}' clashes with the row time column")]
    ReservedKey(String),
}

/// Failure talking to the backend API.
///
/// A 404 is never represented here; the data source maps it to an empty
/// result before it reaches the caller.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("backend request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("backend returned status {status}: {body}")]
    Server { status: u16, body: String },
    #[error("backend response decode error: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid backend base URL '{0}'")]
    BaseUrl(String),
}
