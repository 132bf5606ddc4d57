//! Elasticsearch adapter using the `_bulk` HTTP API.
//!
//! ## Example
//!
//! ```rust,no_run
//! use beatrelay_adapters::{BulkOperation, BulkSink, ElasticClient};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ElasticClient::builder()
//!         .endpoint("http://localhost:9200")
//!         .build()?;
//!
//!     client.ping().await?;
//!
//!     let response = client
//!         .submit(&[BulkOperation {
//!             index: "metrics-2024.03.05".to_string(),
//!             record_type: "doc".to_string(),
//!             body: json!({ "hello": "world" }),
//!         }])
//!         .await?;
//!
//!     println!("errors: {}", response.had_errors);
//!     Ok(())
//! }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;

use crate::sink::encode_bulk_body;
use crate::{BulkOperation, BulkResponse, BulkSink, SinkError};

const NDJSON: &str = "application/x-ndjson";

/// Elasticsearch client for batch writes.
///
/// Cloning is cheap and clones share the connection pool.
#[derive(Debug, Clone)]
pub struct ElasticClient {
    client: Client,
    endpoint: String,
    description: String,
}

impl ElasticClient {
    /// Create a new builder for configuring the client.
    pub fn builder() -> ElasticClientBuilder {
        ElasticClientBuilder::default()
    }

    /// The base URL of the cluster, without trailing slash.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn bulk_url(&self) -> String {
        format!("{}/_bulk", self.endpoint)
    }
}

#[async_trait]
impl BulkSink for ElasticClient {
    async fn submit(&self, operations: &[BulkOperation]) -> Result<BulkResponse, SinkError> {
        let body = encode_bulk_body(operations)?;

        let response = self
            .client
            .post(self.bulk_url())
            .header(CONTENT_TYPE, NDJSON)
            .body(body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SinkError::Status(response.status().as_u16()));
        }

        response
            .json()
            .await
            .map_err(|e| SinkError::Decode(e.to_string()))
    }

    async fn ping(&self) -> Result<(), SinkError> {
        let response = self.client.get(format!("{}/", self.endpoint)).send().await?;

        if !response.status().is_success() {
            return Err(SinkError::Status(response.status().as_u16()));
        }

        Ok(())
    }

    fn description(&self) -> &str {
        &self.description
    }
}

/// Builder for ElasticClient.
#[derive(Debug, Default)]
pub struct ElasticClientBuilder {
    endpoint: Option<String>,
    timeout: Option<Duration>,
}

impl ElasticClientBuilder {
    /// Set the cluster endpoint (e.g., "http://localhost:9200").
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the request timeout (default: 10 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<ElasticClient, SinkError> {
        let timeout = self.timeout.unwrap_or(Duration::from_secs(10));

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SinkError::Connection(e.to_string()))?;

        let endpoint = self
            .endpoint
            .unwrap_or_else(|| "http://localhost:9200".to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(ElasticClient {
            client,
            description: format!("elastic: {}", endpoint),
            endpoint,
        })
    }
}
