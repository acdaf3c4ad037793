// src/utils/config.rs
//! Layered configuration
//!
//! Sources, lowest precedence first:
//!
//! 1. Built-in defaults
//! 2. `betreader.{toml,yaml,json}` in the working directory, or the file named
//!    by `BETREADER_CONFIG`
//! 3. Environment variables such as `BETREADER__DELIVERY__ENDPOINT`

use crate::utils::errors::{ReaderError, Result};
use ::config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Application identifier monitored unless configured otherwise
pub const DEFAULT_MONITORED_APPLICATION: &str = "com.whatsapp";

/// Top-level reader configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    pub monitor: MonitorConfig,
    pub pipeline: PipelineConfig,
    pub delivery: DeliveryConfig,
    pub session: SessionStoreConfig,
    pub observability: ObservabilityConfig,
}

/// Which application's notifications are eligible
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub application: String,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            application: DEFAULT_MONITORED_APPLICATION.to_string(),
        }
    }
}

/// Admission pipeline tunables
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Fingerprints remembered before LRU eviction
    pub dedup_capacity: usize,

    /// Minimum gap between two suppression actions (milliseconds)
    pub suppression_interval_ms: u64,

    /// Buffer of the UI feed broadcast channel
    pub feed_channel_capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            dedup_capacity: 100,
            suppression_interval_ms: 5_000,
            feed_channel_capacity: 1_024,
        }
    }
}

impl PipelineConfig {
    pub fn suppression_interval(&self) -> Duration {
        Duration::from_millis(self.suppression_interval_ms)
    }
}

/// Remote collector delivery
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryConfig {
    /// Collector URL; deliveries are only logged when unset
    pub endpoint: Option<String>,

    /// Per-request timeout (milliseconds)
    pub timeout_ms: u64,

    /// Concurrent outbound requests
    pub max_in_flight: usize,

    /// Payloads buffered ahead of the workers
    pub queue_capacity: usize,

    /// How long shutdown waits for in-flight requests (milliseconds)
    pub shutdown_grace_ms: u64,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_ms: 10_000,
            max_in_flight: 8,
            queue_capacity: 256,
            shutdown_grace_ms: 5_000,
        }
    }
}

impl DeliveryConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}

/// Where the active session is persisted for restore-on-restart
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionStoreConfig {
    pub store_path: PathBuf,
}

impl Default for SessionStoreConfig {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from("betreader-session.json"),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub log_format: LogFormat,

    /// Prometheus scrape address; metrics are not exported when unset
    pub metrics_addr: Option<SocketAddr>,
}

impl ReaderConfig {
    /// Load configuration from the default file, `BETREADER_CONFIG` and the environment
    pub fn load() -> Result<Self> {
        let file = match std::env::var("BETREADER_CONFIG") {
            Ok(path) => File::with_name(&path).required(true),
            Err(_) => File::with_name("betreader").required(false),
        };

        let config: ReaderConfig = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix("BETREADER")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML document (no env overlay)
    pub fn from_toml_str(toml: &str) -> Result<Self> {
        let config: ReaderConfig = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.monitor.application.trim().is_empty() {
            return Err(ReaderError::ConfigError(
                "monitor.application cannot be empty".to_string(),
            ));
        }

        if self.pipeline.dedup_capacity == 0 {
            return Err(ReaderError::ConfigError(
                "pipeline.dedup_capacity must be at least 1".to_string(),
            ));
        }

        if self.pipeline.feed_channel_capacity == 0 {
            return Err(ReaderError::ConfigError(
                "pipeline.feed_channel_capacity must be at least 1".to_string(),
            ));
        }

        if self.delivery.max_in_flight == 0 || self.delivery.queue_capacity == 0 {
            return Err(ReaderError::ConfigError(
                "delivery.max_in_flight and delivery.queue_capacity must be at least 1".to_string(),
            ));
        }

        if let Some(endpoint) = &self.delivery.endpoint {
            if !endpoint.starts_with("https://") && !endpoint.starts_with("http://") {
                return Err(ReaderError::ConfigError(format!(
                    "delivery.endpoint must be an http(s) URL: {}",
                    endpoint
                )));
            }
        }

        Ok(())
    }
}
