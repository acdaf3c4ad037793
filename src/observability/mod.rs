// src/observability/mod.rs
//! Logging and metrics setup
//!
//! - **Tracing**: `tracing-subscriber` with an `EnvFilter` (`RUST_LOG`, default `info`),
//!   human-readable or JSON output
//! - **Metrics**: counters recorded through the `metrics` facade, optionally exported
//!   for Prometheus scraping

use crate::utils::config::LogFormat;
use crate::utils::errors::{ReaderError, Result};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::info;
use tracing_subscriber::EnvFilter;

pub const EVENTS_RECEIVED: &str = "betreader_events_received_total";
pub const EVENTS_ADMITTED: &str = "betreader_events_admitted_total";
pub const EVENTS_DUPLICATE: &str = "betreader_events_duplicate_total";
pub const EVENTS_REJECTED: &str = "betreader_events_rejected_total";
pub const EVENTS_MALFORMED: &str = "betreader_events_malformed_total";
pub const SUPPRESSIONS: &str = "betreader_suppressions_total";
pub const DELIVERIES: &str = "betreader_deliveries_total";
pub const DELIVERIES_DROPPED: &str = "betreader_deliveries_dropped_total";

/// Install the global tracing subscriber
pub fn init_tracing(format: LogFormat) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let result = match format {
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .try_init(),
    };

    result.map_err(|e| ReaderError::ConfigError(format!("Failed to install tracing: {}", e)))
}

/// Install the Prometheus exporter when a listen address is configured
///
/// Must be called from within a tokio runtime.
pub fn init_metrics(addr: Option<SocketAddr>) -> Result<()> {
    let Some(addr) = addr else {
        return Ok(());
    };

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| {
            ReaderError::ConfigError(format!("Failed to install metrics exporter: {}", e))
        })?;

    info!("Prometheus metrics listening on {}", addr);
    Ok(())
}
