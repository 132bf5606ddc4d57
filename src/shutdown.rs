//! Signal-driven termination.
//!
//! On SIGINT or SIGTERM the log file is flushed and the process exits at
//! once. In-flight cycles and requests are neither awaited nor cancelled;
//! they end with the process.

use std::fmt;
use std::future::Future;
use std::io;
use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::logging::LogHandle;

/// Exit status after a signal-triggered shutdown.
pub const SHUTDOWN_EXIT_CODE: i32 = 1;

/// Which signal ended the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Interrupt,
    Terminate,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Interrupt => f.write_str("SIGINT"),
            Signal::Terminate => f.write_str("SIGTERM"),
        }
    }
}

/// Wait for Ctrl+C or, on unix, SIGTERM.
pub async fn wait_for_signal() -> io::Result<Signal> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut terminate = signal(SignalKind::terminate())?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => result.map(|_| Signal::Interrupt),
            _ = terminate.recv() => Ok(Signal::Terminate),
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await.map(|_| Signal::Interrupt)
    }
}

/// Wait for `signal`, then flush the log. Returns the signal received.
pub async fn run_shutdown<F>(signal: F, log: &LogHandle) -> io::Result<Signal>
where
    F: Future<Output = io::Result<Signal>>,
{
    let signal = signal.await?;
    tracing::info!(%signal, "Handling interruption, terminating now");
    log.flush();
    Ok(signal)
}

/// Spawn the listener that terminates the process on a signal.
pub fn install_shutdown_listener(log: Arc<LogHandle>) -> JoinHandle<()> {
    tokio::spawn(async move {
        match run_shutdown(wait_for_signal(), &log).await {
            Ok(_) => std::process::exit(SHUTDOWN_EXIT_CODE),
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for termination signals");
            }
        }
    })
}
