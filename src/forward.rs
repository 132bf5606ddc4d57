//! Batch forwarding to the storage backend.

use std::sync::Arc;

use beatrelay_adapters::{BulkOperation, BulkResponse, BulkSink, SinkError};

use crate::transform::Batch;

/// Submits batches through a [`BulkSink`] and inspects per-item outcomes.
#[derive(Clone)]
pub struct Forwarder {
    sink: Arc<dyn BulkSink>,
}

impl Forwarder {
    pub fn new(sink: Arc<dyn BulkSink>) -> Self {
        Self { sink }
    }

    pub fn sink(&self) -> &Arc<dyn BulkSink> {
        &self.sink
    }

    /// One index operation per document, each targeting the batch index.
    pub fn build_batch(&self, batch: &Batch) -> Result<Vec<BulkOperation>, SinkError> {
        batch
            .documents
            .iter()
            .map(|doc| -> Result<BulkOperation, SinkError> {
                Ok(BulkOperation {
                    index: batch.index.clone(),
                    record_type: doc.record_type.clone(),
                    body: serde_json::to_value(&doc.source)?,
                })
            })
            .collect()
    }

    /// Submit the batch as one write.
    ///
    /// `Err` only when the write did not go through at all. Rejected items
    /// are logged and listed in the report; they are never retried.
    pub async fn forward(&self, batch: &Batch) -> Result<BatchReport, SinkError> {
        let operations = self.build_batch(batch)?;

        tracing::debug!(
            index = %batch.index,
            operations = operations.len(),
            sink = self.sink.description(),
            "Submitting bulk request"
        );

        let response = self.sink.submit(&operations).await?;
        let report = BatchReport::from_response(operations.len(), &response);
        report.log();
        Ok(report)
    }
}

impl std::fmt::Debug for Forwarder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Forwarder")
            .field("sink", &self.sink.description())
            .finish()
    }
}

/// Outcome of a delivered batch.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BatchReport {
    /// Number of operations submitted.
    pub submitted: usize,
    /// The backend's top-level error flag.
    pub had_errors: bool,
    /// Every rejected item, in submission order.
    pub failures: Vec<ItemFailure>,
}

/// A single rejected operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFailure {
    /// Position of the operation in the batch.
    pub position: usize,
    /// Operation name the result was keyed by.
    pub key: String,
    /// Document id assigned by the backend, if any.
    pub id: Option<String>,
    pub error_type: String,
    pub reason: String,
}

impl BatchReport {
    /// Collect item failures. Items are only inspected when the backend
    /// flagged errors.
    pub fn from_response(submitted: usize, response: &BulkResponse) -> Self {
        let mut failures = Vec::new();

        if response.had_errors {
            for (position, item) in response.items.iter().enumerate() {
                for (key, result) in item {
                    if let Some(error) = &result.error {
                        failures.push(ItemFailure {
                            position,
                            key: key.clone(),
                            id: result.id.clone(),
                            error_type: error.error_type.clone(),
                            reason: error.reason.clone(),
                        });
                    }
                }
            }
        }

        Self {
            submitted,
            had_errors: response.had_errors,
            failures,
        }
    }

    /// Whether every item went through.
    pub fn is_clean(&self) -> bool {
        !self.had_errors
    }

    /// One warning per rejected item, or a single confirmation when the
    /// backend reported no errors.
    pub fn log(&self) {
        if !self.had_errors {
            tracing::info!(
                submitted = self.submitted,
                "Bulk request returned no per-item errors"
            );
            return;
        }

        for failure in &self.failures {
            tracing::warn!(
                item = failure.position,
                key = %failure.key,
                id = failure.id.as_deref().unwrap_or(""),
                error_type = %failure.error_type,
                reason = %failure.reason,
                "Bulk item rejected"
            );
        }

        if self.failures.is_empty() {
            tracing::warn!(
                submitted = self.submitted,
                "Bulk request flagged errors but no item carried one"
            );
        }
    }
}
