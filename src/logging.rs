//! Logging setup: console plus an append-only log file.

use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Filter used when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "info";

/// Errors from installing the log subscriber.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("log file path {0:?} has no file name")]
    InvalidPath(PathBuf),

    #[error("failed to install log subscriber: {0}")]
    Init(String),
}

/// Owns the log file writer. Flushing drops the writer, which drains
/// buffered lines to disk and closes the file.
pub struct LogHandle {
    guard: Mutex<Option<WorkerGuard>>,
}

impl LogHandle {
    /// Wrap the guard of a non-blocking writer.
    pub fn new(guard: WorkerGuard) -> Self {
        Self {
            guard: Mutex::new(Some(guard)),
        }
    }

    /// Flush and close the log file. Later calls do nothing.
    pub fn flush(&self) {
        if let Some(guard) = self.guard.lock().take() {
            drop(guard);
        }
    }

    /// Whether [`flush`](Self::flush) already ran.
    pub fn is_flushed(&self) -> bool {
        self.guard.lock().is_none()
    }
}

impl std::fmt::Debug for LogHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogHandle")
            .field("flushed", &self.is_flushed())
            .finish()
    }
}

/// Install the global subscriber and return the handle owning the file.
///
/// Lines go to stdout and are appended to `log_file`. The level filter comes
/// from `RUST_LOG`, defaulting to [`DEFAULT_FILTER`].
pub fn init_logging(log_file: &Path) -> Result<LogHandle, LoggingError> {
    let file_name = log_file
        .file_name()
        .ok_or_else(|| LoggingError::InvalidPath(log_file.to_path_buf()))?;
    let directory = match log_file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let appender = tracing_appender::rolling::never(directory, file_name);
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let console_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(false)
        .compact();

    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_target(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| LoggingError::Init(e.to_string()))?;

    Ok(LogHandle::new(guard))
}
