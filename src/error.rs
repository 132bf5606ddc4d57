//! Errors of one relay cycle.

use thiserror::Error;

use beatrelay_adapters::{SinkError, SourceError};

/// Why a cycle was abandoned.
///
/// Every variant is recoverable: the cycle is dropped and the next one runs
/// on schedule.
#[derive(Debug, Error)]
pub enum CycleError {
    /// Fetching or decoding the snapshot failed.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// The batch write did not go through.
    #[error(transparent)]
    Sink(#[from] SinkError),
}

impl CycleError {
    /// Short name of the failed step, used as a log field.
    pub fn stage(&self) -> &'static str {
        match self {
            CycleError::Source(e) if e.is_fetch() => "fetch",
            CycleError::Source(_) => "decode",
            CycleError::Sink(_) => "submit",
        }
    }
}

/// Conditions that prevent the relay from starting.
#[derive(Debug, Error)]
pub enum StartupError {
    /// A client could not be constructed.
    #[error("failed to build metrics client: {0}")]
    SourceClient(#[source] SourceError),

    #[error("failed to build storage client: {0}")]
    SinkClient(#[source] SinkError),

    /// The storage backend did not answer the connection check.
    #[error("error when connecting to elastic ({endpoint}): {source}")]
    Connect {
        endpoint: String,
        #[source]
        source: SinkError,
    },

    #[error("failed to bind exposition endpoint {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}
