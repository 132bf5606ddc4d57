//! Document - one forwardable record derived from a snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Category, Snapshot, BEAT_VERSION, MODULE_TAG, RECORD_TYPE};

/// Layout of the `@timestamp` field: UTC, millisecond precision.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Format an instant the way every document reports it.
pub fn format_timestamp(instant: DateTime<Utc>) -> String {
    instant.format(TIMESTAMP_FORMAT).to_string()
}

/// One record scoped to a single metric category.
///
/// Serializes to the metricbeat layout:
///
/// ```json
/// {
///   "_index": "metricbeat-6.2.4-2024.03.05",
///   "_type": "doc",
///   "_source": {
///     "@timestamp": "2024-03-05T10:00:00.000Z",
///     "metricset": { "name": "gauges", "module": "secretservice" },
///     "secretservice": { "gauges": { "a": 1 } },
///     "beat": { "name": "host", "hostname": "host", "version": "6.2.4" }
///   }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Target index name.
    #[serde(rename = "_index")]
    pub index: String,

    /// Mapping type, always [`RECORD_TYPE`].
    #[serde(rename = "_type")]
    pub record_type: String,

    /// The body that gets indexed.
    #[serde(rename = "_source")]
    pub source: DocumentSource,
}

impl Document {
    /// Build the document of one category of a snapshot.
    pub fn from_snapshot(
        snapshot: &Snapshot,
        category: Category,
        index: impl Into<String>,
        timestamp: impl Into<String>,
        origin: Origin,
    ) -> Self {
        let mut payload = Map::new();
        payload.insert(category.as_str().to_string(), snapshot.payload(category));

        Self {
            index: index.into(),
            record_type: RECORD_TYPE.to_string(),
            source: DocumentSource {
                timestamp: timestamp.into(),
                metricset: Metricset {
                    name: category,
                    module: MODULE_TAG.to_string(),
                },
                payload,
                origin,
            },
        }
    }

    /// The category this document represents.
    pub fn category(&self) -> Category {
        self.source.metricset.name
    }
}

/// The indexed body of a [`Document`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSource {
    /// Creation instant, formatted with [`TIMESTAMP_FORMAT`].
    #[serde(rename = "@timestamp")]
    pub timestamp: String,

    pub metricset: Metricset,

    /// Exactly one entry: category name to the snapshot's value for it.
    #[serde(rename = "secretservice")]
    pub payload: Map<String, Value>,

    #[serde(rename = "beat")]
    pub origin: Origin,
}

/// Which metric set a document carries and which module produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metricset {
    pub name: Category,
    pub module: String,
}

/// The process that produced a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Origin {
    /// Process name; the hostname, as metricbeat reports it.
    pub name: String,
    /// Resolved hostname, empty if resolution failed.
    pub hostname: String,
    /// Schema version of the beat layout.
    pub version: String,
}

impl Origin {
    /// Origin block for a host, with the current beat version.
    pub fn for_host(hostname: impl Into<String>) -> Self {
        let hostname = hostname.into();
        Self {
            name: hostname.clone(),
            hostname,
            version: BEAT_VERSION.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_format_timestamp_millis() {
        let instant = Utc.with_ymd_and_hms(2024, 3, 5, 7, 8, 9).unwrap()
            + chrono::Duration::milliseconds(42);
        assert_eq!(format_timestamp(instant), "2024-03-05T07:08:09.042Z");
    }

    #[test]
    fn test_document_wire_layout() {
        let snapshot = Snapshot::builder().gauge("a", json!(1)).build();
        let doc = Document::from_snapshot(
            &snapshot,
            Category::Gauges,
            "metrics-2024.03.05",
            "2024-03-05T00:00:00.000Z",
            Origin::for_host("node-1"),
        );

        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(
            value,
            json!({
                "_index": "metrics-2024.03.05",
                "_type": "doc",
                "_source": {
                    "@timestamp": "2024-03-05T00:00:00.000Z",
                    "metricset": { "name": "gauges", "module": "secretservice" },
                    "secretservice": { "gauges": { "a": 1 } },
                    "beat": { "name": "node-1", "hostname": "node-1", "version": "6.2.4" }
                }
            })
        );
        assert_eq!(doc.category(), Category::Gauges);
    }

    #[test]
    fn test_origin_with_unknown_host() {
        let origin = Origin::for_host("");
        assert!(origin.hostname.is_empty());
        assert_eq!(origin.version, BEAT_VERSION);
    }
}
