//! Dropwizard metrics adapter using the metrics servlet's JSON endpoint.
//!
//! The endpoint (usually `/metrics` on the admin port) returns a document
//! with the top-level keys `version`, `gauges`, `counters`, `histograms`,
//! `meters` and `timers`.
//!
//! ## Example
//!
//! ```rust,no_run
//! use beatrelay_adapters::{DropwizardSource, MetricsSource};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let source = DropwizardSource::builder()
//!         .url("http://localhost:8081/metrics")
//!         .build()?;
//!
//!     let snapshot = source.fetch().await?;
//!     println!("Fetched {} gauges", snapshot.gauges.len());
//!     Ok(())
//! }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use beatrelay_types::Snapshot;

use crate::source::decode_snapshot;
use crate::{MetricsSource, SourceError};

/// Fetches snapshots from a dropwizard metrics endpoint over HTTP.
///
/// Cloning is cheap and clones share the connection pool.
#[derive(Debug, Clone)]
pub struct DropwizardSource {
    client: Client,
    url: String,
    description: String,
}

impl DropwizardSource {
    /// Create a new builder for configuring the source.
    pub fn builder() -> DropwizardSourceBuilder {
        DropwizardSourceBuilder::default()
    }

    /// The URL snapshots are fetched from.
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl MetricsSource for DropwizardSource {
    async fn fetch(&self) -> Result<Snapshot, SourceError> {
        let response = self.client.get(&self.url).send().await?;

        if !response.status().is_success() {
            return Err(SourceError::Status(response.status().as_u16()));
        }

        let body = response.bytes().await?;
        decode_snapshot(&body)
    }

    fn description(&self) -> &str {
        &self.description
    }
}

/// Builder for DropwizardSource.
#[derive(Debug, Default)]
pub struct DropwizardSourceBuilder {
    url: Option<String>,
    timeout: Option<Duration>,
}

impl DropwizardSourceBuilder {
    /// Set the metrics URL (e.g., "http://localhost:8081/metrics").
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Set the request timeout (default: 10 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the source.
    pub fn build(self) -> Result<DropwizardSource, SourceError> {
        let timeout = self.timeout.unwrap_or(Duration::from_secs(10));

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SourceError::Fetch(e.to_string()))?;

        let url = self
            .url
            .unwrap_or_else(|| "http://localhost:8081/metrics".to_string());

        Ok(DropwizardSource {
            client,
            description: format!("dropwizard: {}", url),
            url,
        })
    }
}
