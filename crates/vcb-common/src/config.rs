//! ---
//! vcb_section: "04-configuration-logging"
//! vcb_subsection: "module"
//! vcb_type: "source"
//! vcb_scope: "code"
//! vcb_description: "Shared configuration and logging primitives."
//! vcb_version: "v0.1.0-dev"
//! vcb_owner: "tbd"
//! ---
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationMilliSeconds};
use tracing::debug;

use crate::logging::LogFormat;

fn default_inbound_filter() -> String {
    "vehicle/parameters".to_owned()
}

fn default_outbound_topic() -> String {
    "vehicle/parameters".to_owned()
}

fn default_queue_capacity() -> usize {
    64
}

fn default_send_timeout() -> Duration {
    Duration::from_millis(1000)
}

fn default_batch_size() -> usize {
    10
}

fn default_batch_timeout() -> Duration {
    Duration::from_millis(50)
}

fn default_logging_directory() -> PathBuf {
    PathBuf::from("target/logs")
}

fn default_log_format() -> LogFormat {
    LogFormat::StructuredJson
}

fn default_feed_interval() -> Duration {
    Duration::from_millis(1000)
}

fn default_feed_speed_step() -> i32 {
    5
}

/// Primary configuration object for the VCB runtime.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Bus topics, queue sizing, and delivery timeouts.
    #[serde(default)]
    pub transport: TransportConfig,
    /// Ingest batching parameters.
    #[serde(default)]
    pub ingest: IngestConfig,
    /// Log destinations and formats.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Synthetic telemetry feed used for demos.
    #[serde(default)]
    pub feed: FeedConfig,
}

/// Metadata describing where an [`AppConfig`] was loaded from.
#[derive(Debug, Clone)]
pub struct LoadedAppConfig {
    /// The parsed configuration.
    pub config: AppConfig,
    /// Path of the file the configuration came from.
    pub source: PathBuf,
}

impl AppConfig {
    /// Environment variable overriding the config search path.
    pub const ENV_CONFIG_PATH: &str = "VCB_CONFIG";

    /// Load configuration from disk, respecting the `VCB_CONFIG` override.
    pub fn load<P: AsRef<Path>>(candidates: &[P]) -> Result<Self> {
        Ok(Self::load_with_source(candidates)?.config)
    }

    /// Load configuration from disk together with the effective source path.
    pub fn load_with_source<P: AsRef<Path>>(candidates: &[P]) -> Result<LoadedAppConfig> {
        if let Ok(env_path) = std::env::var(Self::ENV_CONFIG_PATH) {
            if !env_path.trim().is_empty() {
                let path = PathBuf::from(env_path);
                let config = Self::from_path(path.clone())?;
                return Ok(LoadedAppConfig {
                    config,
                    source: path,
                });
            }
        }

        for candidate in candidates {
            if candidate.as_ref().exists() {
                let path = candidate.as_ref().to_path_buf();
                let config = Self::from_path(path.clone())?;
                return Ok(LoadedAppConfig {
                    config,
                    source: path,
                });
            }
        }

        Err(anyhow!(
            "no configuration files found. inspected: {}",
            candidates
                .iter()
                .map(|p| p.as_ref().display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ))
    }

    fn from_path(path: PathBuf) -> Result<Self> {
        debug!(config_path = %path.display(), "loading configuration");
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("unable to read config file {}", path.display()))?;
        let config = toml::from_str::<AppConfig>(&contents)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate structural invariants.
    pub fn validate(&self) -> Result<()> {
        if self.ingest.batch_size == 0 {
            return Err(anyhow!("ingest.batch_size must be at least 1"));
        }
        if self.ingest.batch_timeout.is_zero() {
            return Err(anyhow!("ingest.batch_timeout_ms must be at least 1"));
        }
        if self.transport.queue_capacity < self.ingest.batch_size {
            return Err(anyhow!(
                "transport.queue_capacity ({}) must not be smaller than ingest.batch_size ({})",
                self.transport.queue_capacity,
                self.ingest.batch_size
            ));
        }
        if self.transport.inbound_filter.trim().is_empty() {
            return Err(anyhow!("transport.inbound_filter must not be empty"));
        }
        if self.transport.outbound_topic.trim().is_empty() {
            return Err(anyhow!("transport.outbound_topic must not be empty"));
        }
        Ok(())
    }
}

/// Bus-facing settings: topics, queue sizing, delivery timeout.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Topic filter the binder subscribes to for inbound telemetry.
    #[serde(default = "default_inbound_filter")]
    pub inbound_filter: String,
    /// Topic outbound snapshots are published to.
    #[serde(default = "default_outbound_topic")]
    pub outbound_topic: String,
    /// Capacity of the bounded ingest queue. Producers block when it fills.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// Upper bound on one outbound delivery attempt.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(default = "default_send_timeout", rename = "send_timeout_ms")]
    pub send_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            inbound_filter: default_inbound_filter(),
            outbound_topic: default_outbound_topic(),
            queue_capacity: default_queue_capacity(),
            send_timeout: default_send_timeout(),
        }
    }
}

/// Batching parameters for the ingest consumer.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Maximum number of messages reduced as one batch.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Bounded wait for the first message of a batch.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(default = "default_batch_timeout", rename = "batch_timeout_ms")]
    pub batch_timeout: Duration,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            batch_timeout: default_batch_timeout(),
        }
    }
}

/// Log destinations and formats.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Directory receiving the rolling log files.
    #[serde(default = "default_logging_directory")]
    pub directory: PathBuf,
    /// Stdout formatting.
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
    /// Optional file-name prefix; defaults to the service name.
    #[serde(default)]
    pub file_prefix: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: default_logging_directory(),
            format: default_log_format(),
            file_prefix: None,
        }
    }
}

/// Synthetic telemetry feed settings, used by the daemon's demo mode.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Whether the feed task is spawned at all.
    #[serde(default)]
    pub enabled: bool,
    /// Interval between synthetic frames.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(default = "default_feed_interval", rename = "interval_ms")]
    pub interval: Duration,
    /// Speed delta applied per frame before the ramp reverses.
    #[serde(default = "default_feed_speed_step")]
    pub speed_step: i32,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval: default_feed_interval(),
            speed_step: default_feed_speed_step(),
        }
    }
}
