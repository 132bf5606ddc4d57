//! The metrics source seam.

use async_trait::async_trait;

use beatrelay_types::Snapshot;

use crate::SourceError;

/// Something a [`Snapshot`] can be fetched from.
///
/// Implementations must be safe to call from several tasks at once: the
/// periodic cycle and every exposition request fetch independently.
#[async_trait]
pub trait MetricsSource: Send + Sync {
    /// Fetch and decode one snapshot. No retries; the caller decides.
    async fn fetch(&self) -> Result<Snapshot, SourceError>;

    /// Human-readable description of the source, used in logs.
    fn description(&self) -> &str;
}

/// Decode a response body into a snapshot.
pub fn decode_snapshot(body: &[u8]) -> Result<Snapshot, SourceError> {
    serde_json::from_slice(body).map_err(|e| SourceError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_snapshot() {
        let body = br#"{"version":"1.2.3","gauges":{"a":1},"counters":{},"histograms":{},"meters":{},"timers":{}}"#;
        let snapshot = decode_snapshot(body).unwrap();
        assert_eq!(snapshot.version, json!("1.2.3"));
        assert_eq!(snapshot.gauges["a"], json!(1));
    }

    #[test]
    fn test_decode_invalid_json() {
        let err = decode_snapshot(b"<html>oops</html>").unwrap_err();
        assert!(matches!(err, SourceError::Decode(_)));
        assert!(!err.is_fetch());
    }

    #[test]
    fn test_decode_wrong_shape() {
        let err = decode_snapshot(br#"{"meters": "nope"}"#).unwrap_err();
        assert!(matches!(err, SourceError::Decode(_)));
    }
}
