//! The bulk write seam and the wire types of the bulk API.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::SinkError;

/// A backend that accepts batched index operations.
///
/// Shared by every cycle, so implementations must tolerate concurrent use.
#[async_trait]
pub trait BulkSink: Send + Sync {
    /// Submit all operations as one batch write.
    ///
    /// `Err` means the batch did not go through at all. Per-document
    /// rejections come back inside an `Ok` response.
    async fn submit(&self, operations: &[BulkOperation]) -> Result<BulkResponse, SinkError>;

    /// Check that the backend is reachable.
    async fn ping(&self) -> Result<(), SinkError> {
        Ok(())
    }

    /// Human-readable description of the sink, used in logs.
    fn description(&self) -> &str;
}

/// One index operation of a batch write.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkOperation {
    /// Target index.
    pub index: String,
    /// Mapping type.
    pub record_type: String,
    /// Document body.
    pub body: Value,
}

impl BulkOperation {
    /// The action line preceding the body in the NDJSON request.
    pub fn action(&self) -> Value {
        json!({ "index": { "_index": self.index, "_type": self.record_type } })
    }
}

/// Encode operations as the newline-delimited body of a `_bulk` request.
///
/// Every line, including the last, ends with `\n`.
pub fn encode_bulk_body(operations: &[BulkOperation]) -> Result<String, SinkError> {
    let mut body = String::new();
    for operation in operations {
        body.push_str(&serde_json::to_string(&operation.action())?);
        body.push('\n');
        body.push_str(&serde_json::to_string(&operation.body)?);
        body.push('\n');
    }
    Ok(body)
}

/// Response of a batch write.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BulkResponse {
    /// Milliseconds the backend spent on the batch.
    #[serde(default)]
    pub took: u64,

    /// True if at least one item failed.
    #[serde(rename = "errors", default)]
    pub had_errors: bool,

    /// One entry per submitted operation, in submission order.
    #[serde(default)]
    pub items: Vec<BulkItem>,
}

/// Outcome of one operation, keyed by the operation name (`index`).
pub type BulkItem = BTreeMap<String, BulkItemResult>;

/// Result details of one operation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BulkItemResult {
    #[serde(rename = "_index", default, skip_serializing_if = "Option::is_none")]
    pub index: Option<String>,

    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,

    /// Present only when this operation was rejected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ItemError>,
}

/// Why the backend rejected a single operation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ItemError {
    #[serde(rename = "type", default)]
    pub error_type: String,

    #[serde(default)]
    pub reason: String,
}
