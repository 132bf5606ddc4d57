//! The fetch, transform and forward pipeline.

use std::sync::Arc;

use beatrelay_adapters::{MetricsSource, SourceError};

use crate::error::CycleError;
use crate::forward::{BatchReport, Forwarder};
use crate::transform::{Batch, Transformer};

/// Shared context of the periodic cycle and the exposition endpoint.
///
/// Cloning is cheap; clones share the source, the sink and the hostname
/// cache. Everything here is read-only after startup except the hostname,
/// which is written once.
#[derive(Clone)]
pub struct Relay {
    source: Arc<dyn MetricsSource>,
    transformer: Transformer,
    forwarder: Forwarder,
}

impl Relay {
    pub fn new(
        source: Arc<dyn MetricsSource>,
        transformer: Transformer,
        forwarder: Forwarder,
    ) -> Self {
        Self {
            source,
            transformer,
            forwarder,
        }
    }

    pub fn source(&self) -> &Arc<dyn MetricsSource> {
        &self.source
    }

    pub fn forwarder(&self) -> &Forwarder {
        &self.forwarder
    }

    /// Fetch a fresh snapshot and transform it.
    pub async fn collect(&self) -> Result<Batch, SourceError> {
        let snapshot = self.source.fetch().await?;
        tracing::debug!(metrics = snapshot.len(), "Fetched snapshot");
        Ok(self.transformer.transform(&snapshot))
    }

    /// Run one full cycle: fetch, transform, forward.
    pub async fn run_cycle(&self) -> Result<BatchReport, CycleError> {
        let batch = self.collect().await?;
        let report = self.forwarder.forward(&batch).await?;
        tracing::info!(
            index = %batch.index,
            documents = batch.len(),
            rejected = report.failures.len(),
            "Batch forwarded"
        );
        Ok(report)
    }
}

impl std::fmt::Debug for Relay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Relay")
            .field("source", &self.source.description())
            .field("transformer", &self.transformer)
            .field("forwarder", &self.forwarder)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hostname::HostnameCache;
    use crate::testing::{RecordingSink, StaticSource};
    use beatrelay_types::{IndexTemplate, Snapshot};
    use serde_json::json;

    fn relay(source: Arc<StaticSource>, sink: Arc<RecordingSink>) -> Relay {
        let hostname = Arc::new(HostnameCache::with_resolver(|| Ok("node-1".to_string())));
        Relay::new(
            source,
            Transformer::new(IndexTemplate::parse("metrics-%s").unwrap(), hostname),
            Forwarder::new(sink),
        )
    }

    #[tokio::test]
    async fn test_run_cycle() {
        let source = Arc::new(StaticSource::new(
            Snapshot::builder().gauge("a", json!(1)).build(),
        ));
        let sink = Arc::new(RecordingSink::new());

        let report = relay(source.clone(), sink.clone()).run_cycle().await.unwrap();

        assert!(report.is_clean());
        assert_eq!(source.calls(), 1);
        assert_eq!(sink.batches()[0].len(), 6);
    }

    #[tokio::test]
    async fn test_collect_does_not_forward() {
        let source = Arc::new(StaticSource::new(Snapshot::default()));
        let sink = Arc::new(RecordingSink::new());

        let batch = relay(source, sink.clone()).collect().await.unwrap();

        assert_eq!(batch.len(), 6);
        assert_eq!(sink.calls(), 0);
    }

    #[tokio::test]
    async fn test_fetch_failure_skips_submit() {
        let source = Arc::new(StaticSource::new(Snapshot::default()));
        source.set_failing(true);
        let sink = Arc::new(RecordingSink::new());

        let err = relay(source, sink.clone()).run_cycle().await.unwrap_err();

        assert!(matches!(err, CycleError::Source(SourceError::Status(500))));
        assert_eq!(sink.calls(), 0);
    }

    #[tokio::test]
    async fn test_submit_failure_is_sink_error() {
        let source = Arc::new(StaticSource::new(Snapshot::default()));
        let sink = Arc::new(RecordingSink::new());
        sink.set_failing(true);

        let err = relay(source, sink).run_cycle().await.unwrap_err();
        assert_eq!(err.stage(), "submit");
    }
}
