//! # beatrelay
//!
//! Relays dropwizard metrics snapshots into Elasticsearch as
//! metricbeat-shaped documents.
//!
//! Every `interval` the relay fetches a snapshot from the metrics endpoint,
//! turns it into six documents (version, gauges, counters, histograms,
//! meters, timers) and writes them to the cluster in a single bulk request.
//! The same documents can be pulled on demand over HTTP.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                             App                                  │
//! │                                                                  │
//! │  ┌───────────┐          ┌─────────────────────────────────────┐  │
//! │  │ scheduler │─ tick ──▶│               relay                 │  │
//! │  └───────────┘          │  ┌────────┐  ┌───────────┐  ┌─────┐ │  │
//! │  ┌───────────┐          │  │ source │─▶│ transform │─▶│fwd  │─┼──┼─▶ _bulk
//! │  │  server   │─ GET / ─▶│  └────────┘  └───────────┘  └─────┘ │  │
//! │  └───────────┘          └─────────────────────────────────────┘  │
//! │  ┌───────────┐                                                   │
//! │  │ shutdown  │── SIGINT/SIGTERM ─▶ flush log, exit               │
//! │  └───────────┘                                                   │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`relay`]**: the shared pipeline, fetch then [`transform`] then [`forward`]
//! - **[`scheduler`]**: fixed-rate cycles, skipping ticks while a cycle runs
//! - **[`server`]**: `GET /` returns freshly collected documents as a JSON array
//! - **[`shutdown`]**: flushes the log file and exits on a termination signal
//! - **[`config`]**, **[`logging`]**: process setup
//!
//! ## Usage
//!
//! ```bash
//! # config.cfg in the working directory
//! beatrelay
//!
//! # one cycle, then exit
//! beatrelay --config /etc/beatrelay.cfg --once
//! ```
//!
//! ### As a library
//!
//! ```
//! use std::sync::Arc;
//! use beatrelay::{HostnameCache, Transformer};
//! use beatrelay_types::{IndexTemplate, Snapshot};
//!
//! let transformer = Transformer::new(
//!     IndexTemplate::parse("metrics-%s").unwrap(),
//!     Arc::new(HostnameCache::new()),
//! );
//! let batch = transformer.transform(&Snapshot::default());
//! assert_eq!(batch.documents.len(), 6);
//! ```

pub mod app;
pub mod config;
pub mod error;
pub mod forward;
pub mod hostname;
pub mod logging;
pub mod relay;
pub mod scheduler;
pub mod server;
pub mod shutdown;
pub mod transform;

#[cfg(test)]
mod testing;

pub use app::App;
pub use crate::config::{ConfigError, RelayConfig};
pub use error::{CycleError, StartupError};
pub use forward::{BatchReport, Forwarder, ItemFailure};
pub use crate::hostname::{HostnameCache, HostnameError};
pub use logging::{init_logging, LogHandle, LoggingError};
pub use relay::Relay;
pub use scheduler::{Scheduler, SchedulerHandle, SchedulerStats};
pub use server::ExpositionServer;
pub use shutdown::install_shutdown_listener;
pub use transform::{Batch, Transformer};
