//! Relay configuration.
//!
//! Read from a `key=value` file with `#` comment lines, with any key
//! overridable through `BEATRELAY_`-prefixed environment variables:
//!
//! ```text
//! # seconds between forwarding cycles
//! interval=30
//! port=8081
//! format=metricbeat-6.2.4-%s
//! metrics=http://localhost:8080/metrics
//! elastic=http://localhost:9200/
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use thiserror::Error;

use beatrelay_types::{IndexTemplate, TemplateError};

/// Prefix of environment variable overrides.
pub const ENV_PREFIX: &str = "BEATRELAY";

const DEFAULT_TIMEOUT_SECS: u64 = 10;
/// One week.
pub const MAX_INTERVAL_SECS: u64 = 7 * 24 * 60 * 60;
/// One hour.
pub const MAX_TIMEOUT_SECS: u64 = 60 * 60;
const DEFAULT_LOG_FILE: &str = "log.txt";
const DEFAULT_BIND: &str = "0.0.0.0";

/// Errors from loading or validating the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read or a value had the wrong type.
    #[error("failed to read configuration: {0}")]
    Source(#[from] config::ConfigError),

    /// A required key is absent.
    #[error("missing required key `{0}` (check that all fields are specified)")]
    Missing(&'static str),

    /// A duration key is zero.
    #[error("`{0}` must be greater than zero")]
    Zero(&'static str),

    /// A duration key exceeds its upper bound.
    #[error("`{key}` must be at most {max} seconds, got {value}")]
    TooLarge {
        key: &'static str,
        value: u64,
        max: u64,
    },

    /// The index template is unusable.
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// A URL key does not hold an http(s) URL.
    #[error("`{key}` is not an http(s) URL: {value}")]
    InvalidUrl { key: &'static str, value: String },
}

/// Keys as they appear in the file, before validation.
#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    interval: Option<u64>,
    port: Option<u16>,
    format: Option<String>,
    metrics: Option<String>,
    elastic: Option<String>,
    timeout: Option<u64>,
    log_file: Option<PathBuf>,
    bind: Option<String>,
}

/// Resolved, validated configuration. Read-only for the process lifetime.
#[derive(Debug, Clone, PartialEq)]
pub struct RelayConfig {
    /// Time between periodic cycles.
    pub interval: Duration,
    /// Port of the exposition endpoint.
    pub port: u16,
    /// Host the exposition endpoint binds to.
    pub bind: String,
    /// Index name template.
    pub index_template: IndexTemplate,
    /// Where snapshots are fetched from.
    pub metrics_url: String,
    /// Base URL of the storage backend.
    pub elastic_url: String,
    /// Bound on every outbound request.
    pub request_timeout: Duration,
    /// Log file path.
    pub log_file: PathBuf,
}

impl RelayConfig {
    /// Load from a file plus environment overrides.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::new(&path.to_string_lossy(), FileFormat::Ini))
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()?;
        Self::from_config(config)
    }

    /// Parse configuration text, without environment overrides.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::from_str(content, FileFormat::Ini))
            .build()?;
        Self::from_config(config)
    }

    fn from_config(config: Config) -> Result<Self, ConfigError> {
        let raw: RawConfig = config.try_deserialize()?;
        Self::validate(raw)
    }

    fn validate(raw: RawConfig) -> Result<Self, ConfigError> {
        let interval = raw.interval.ok_or(ConfigError::Missing("interval"))?;
        check_seconds("interval", interval, MAX_INTERVAL_SECS)?;

        let timeout = raw.timeout.unwrap_or(DEFAULT_TIMEOUT_SECS);
        check_seconds("timeout", timeout, MAX_TIMEOUT_SECS)?;

        let port = raw.port.ok_or(ConfigError::Missing("port"))?;
        let format = raw.format.ok_or(ConfigError::Missing("format"))?;
        let metrics_url = check_url("metrics", raw.metrics)?;
        let elastic_url = check_url("elastic", raw.elastic)?;

        Ok(Self {
            interval: Duration::from_secs(interval),
            port,
            bind: raw.bind.unwrap_or_else(|| DEFAULT_BIND.to_string()),
            index_template: IndexTemplate::parse(format)?,
            metrics_url,
            elastic_url,
            request_timeout: Duration::from_secs(timeout),
            log_file: raw.log_file.unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE)),
        })
    }

    /// The `host:port` the exposition endpoint listens on.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

fn check_seconds(key: &'static str, value: u64, max: u64) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::Zero(key));
    }
    if value > max {
        return Err(ConfigError::TooLarge { key, value, max });
    }
    Ok(())
}

fn check_url(key: &'static str, value: Option<String>) -> Result<String, ConfigError> {
    let value = value.ok_or(ConfigError::Missing(key))?;
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(value)
    } else {
        Err(ConfigError::InvalidUrl { key, value })
    }
}
