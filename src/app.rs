//! Process wiring: clients, shared context and the concurrent activities.

use std::sync::Arc;

use beatrelay_adapters::{BulkSink, DropwizardSource, ElasticClient, MetricsSource};

use crate::config::RelayConfig;
use crate::error::{CycleError, StartupError};
use crate::forward::{BatchReport, Forwarder};
use crate::hostname::HostnameCache;
use crate::logging::LogHandle;
use crate::relay::Relay;
use crate::scheduler::Scheduler;
use crate::server::ExpositionServer;
use crate::shutdown::install_shutdown_listener;
use crate::transform::Transformer;

/// A connected relay, ready to run.
#[derive(Debug)]
pub struct App {
    config: Arc<RelayConfig>,
    relay: Relay,
    log: Arc<LogHandle>,
}

impl App {
    /// Build the HTTP clients from the configuration and check the storage
    /// backend is reachable.
    pub async fn connect(config: RelayConfig, log: Arc<LogHandle>) -> Result<Self, StartupError> {
        let source = DropwizardSource::builder()
            .url(config.metrics_url.clone())
            .timeout(config.request_timeout)
            .build()
            .map_err(StartupError::SourceClient)?;

        let sink = ElasticClient::builder()
            .endpoint(config.elastic_url.clone())
            .timeout(config.request_timeout)
            .build()
            .map_err(StartupError::SinkClient)?;

        Self::with_clients(config, Arc::new(source), Arc::new(sink), log).await
    }

    /// Wire the relay around existing clients. Fails if the sink does not
    /// answer its connection check.
    pub async fn with_clients(
        config: RelayConfig,
        source: Arc<dyn MetricsSource>,
        sink: Arc<dyn BulkSink>,
        log: Arc<LogHandle>,
    ) -> Result<Self, StartupError> {
        tracing::info!(sink = sink.description(), "Connecting to storage backend");
        sink.ping().await.map_err(|source| StartupError::Connect {
            endpoint: config.elastic_url.clone(),
            source,
        })?;
        tracing::info!("Storage backend reachable");

        // Resolved before any concurrent activity starts.
        let hostname = Arc::new(HostnameCache::new());
        hostname.get();

        let relay = Relay::new(
            source,
            Transformer::new(config.index_template.clone(), hostname),
            Forwarder::new(sink),
        );

        Ok(Self {
            config: Arc::new(config),
            relay,
            log,
        })
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    pub fn relay(&self) -> &Relay {
        &self.relay
    }

    /// Run a single cycle and return its outcome.
    pub async fn run_once(&self) -> Result<BatchReport, CycleError> {
        self.relay.run_cycle().await
    }

    /// Run the periodic schedule and the exposition endpoint until a
    /// termination signal ends the process.
    pub async fn run(self) -> Result<(), StartupError> {
        install_shutdown_listener(self.log.clone());

        let addr = self.config.listen_addr();
        let server = ExpositionServer::bind(&addr, self.relay.clone())
            .await
            .map_err(|source| {
                tracing::error!(%addr, error = %source, "Failed to bind exposition endpoint");
                StartupError::Bind {
                    addr: addr.clone(),
                    source,
                }
            })?;

        let scheduler = Scheduler::new(self.relay.clone(), self.config.interval);
        let _schedule = scheduler.start();
        tracing::info!(
            interval_secs = self.config.interval.as_secs(),
            index_template = %self.config.index_template,
            "Periodic forwarding scheduled"
        );

        if let Err(e) = server.serve().await {
            tracing::error!(error = %e, "Exposition endpoint stopped");
        }
        Ok(())
    }
}
