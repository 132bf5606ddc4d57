use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use beatrelay::{init_logging, App, RelayConfig};

#[derive(Parser, Debug)]
#[command(name = "beatrelay")]
#[command(about = "Relay dropwizard metrics into Elasticsearch as metricbeat documents")]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.cfg")]
    config: PathBuf,

    /// Log file path (overrides `log_file` from the configuration)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Run a single forwarding cycle and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = RelayConfig::load(&args.config)
        .with_context(|| format!("failed to load {}", args.config.display()))?;
    if let Some(log_file) = args.log_file {
        config.log_file = log_file;
    }

    let log = Arc::new(init_logging(&config.log_file)?);
    tracing::info!(
        config = %args.config.display(),
        metrics = %config.metrics_url,
        elastic = %config.elastic_url,
        "Starting beatrelay"
    );

    let app = match App::connect(config, log.clone()).await {
        Ok(app) => app,
        Err(e) => {
            tracing::error!(error = %e, "Startup failed");
            return Err(e.into());
        }
    };

    if args.once {
        let result = app.run_once().await;
        log.flush();
        result?;
        return Ok(());
    }

    let result = app.run().await;
    log.flush();
    result?;
    Ok(())
}
