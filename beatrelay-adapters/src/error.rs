//! Error types for adapters.

use thiserror::Error;

/// Errors that can occur when fetching a snapshot from a metrics source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// HTTP request failed before a response arrived.
    #[error("metrics request failed: {0}")]
    Fetch(String),

    /// The source answered with a non-success status.
    #[error("metrics source returned status {0}")]
    Status(u16),

    /// Timeout waiting for response.
    #[error("metrics request timed out")]
    Timeout,

    /// The body was not valid JSON or did not have the snapshot shape.
    #[error("failed to decode metrics snapshot: {0}")]
    Decode(String),
}

impl SourceError {
    /// True for transport-level failures, false for a malformed body.
    pub fn is_fetch(&self) -> bool {
        !matches!(self, SourceError::Decode(_))
    }
}

/// Errors that can occur when submitting to the storage backend.
///
/// All variants mean the batch as a whole did not go through. Rejections of
/// single documents inside a delivered batch are reported in the
/// [`BulkResponse`](crate::BulkResponse) instead.
#[derive(Debug, Error)]
pub enum SinkError {
    /// HTTP request failed.
    #[error("bulk submit failed: {0}")]
    Submit(String),

    /// Connection failed.
    #[error("connection to storage backend failed: {0}")]
    Connection(String),

    /// The backend answered with a non-success status.
    #[error("storage backend returned status {0}")]
    Status(u16),

    /// Timeout waiting for response.
    #[error("bulk submit timed out")]
    Timeout,

    /// Failed to encode the request or parse the response.
    #[error("failed to decode bulk response: {0}")]
    Decode(String),
}

#[cfg(feature = "dropwizard")]
impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SourceError::Timeout
        } else if err.is_decode() {
            SourceError::Decode(err.to_string())
        } else {
            SourceError::Fetch(err.to_string())
        }
    }
}

#[cfg(feature = "elastic")]
impl From<reqwest::Error> for SinkError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SinkError::Timeout
        } else if err.is_connect() {
            SinkError::Connection(err.to_string())
        } else if err.is_decode() {
            SinkError::Decode(err.to_string())
        } else {
            SinkError::Submit(err.to_string())
        }
    }
}

impl From<serde_json::Error> for SinkError {
    fn from(err: serde_json::Error) -> Self {
        SinkError::Decode(err.to_string())
    }
}
