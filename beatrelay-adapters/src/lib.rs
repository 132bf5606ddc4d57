//! # beatrelay-adapters
//!
//! Adapters for the two external systems beatrelay talks to.
//!
//! Each side sits behind a trait so the relay core can be driven by any
//! implementation (and by in-memory fakes in tests):
//!
//! - [`MetricsSource`] - where snapshots come from. [`DropwizardSource`]
//!   (`dropwizard` feature) reads a dropwizard metrics servlet over HTTP.
//! - [`BulkSink`] - where documents go. [`ElasticClient`] (`elastic`
//!   feature) writes through the Elasticsearch `_bulk` API.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use beatrelay_adapters::{DropwizardSource, ElasticClient, MetricsSource, BulkSink};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let source = DropwizardSource::builder()
//!         .url("http://localhost:8081/metrics")
//!         .timeout(Duration::from_secs(5))
//!         .build()?;
//!
//!     let sink = ElasticClient::builder()
//!         .endpoint("http://localhost:9200")
//!         .build()?;
//!     sink.ping().await?;
//!
//!     let snapshot = source.fetch().await?;
//!     println!("Fetched {} metrics", snapshot.len());
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod sink;
pub mod source;

#[cfg(feature = "dropwizard")]
pub mod dropwizard;

#[cfg(feature = "elastic")]
pub mod elastic;

pub use error::{SinkError, SourceError};
pub use sink::{BulkItem, BulkItemResult, BulkOperation, BulkResponse, BulkSink, ItemError};
pub use source::MetricsSource;

#[cfg(feature = "dropwizard")]
pub use dropwizard::DropwizardSource;

#[cfg(feature = "elastic")]
pub use elastic::ElasticClient;

// Re-export types for convenience
pub use beatrelay_types::{Category, Document, Snapshot};
