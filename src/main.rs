// src/main.rs
//! Bet Reader
//!
//! Reads raw notification events as JSON lines on stdin, records the ones
//! belonging to the active session and forwards them to the collector.
//!
//! A session persisted by a previous run is restored on startup; otherwise
//! `BETREADER_TARGET` (and optionally `BETREADER_RACE`) start a new one.

use anyhow::Result;
use betreader_engine::delivery::{sink_from_config, DeliveryDispatcher};
use betreader_engine::feed::UiFeed;
use betreader_engine::observability::{init_metrics, init_tracing};
use betreader_engine::pipeline::{AdmissionFilter, EventPipeline};
use betreader_engine::session::{JsonFileSessionStore, DEFAULT_RACE_NUMBER};
use betreader_engine::source::{JsonLinesSource, LoggingSuppressor};
use betreader_engine::utils::config::ReaderConfig;
use std::sync::Arc;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first so it can pick the log format
    let config = ReaderConfig::load()?;

    init_tracing(config.observability.log_format)?;
    init_metrics(config.observability.metrics_addr)?;

    info!("Starting Bet Reader v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration loaded: {:?}", config);

    let sink = sink_from_config(&config.delivery)?;
    let dispatcher = Arc::new(DeliveryDispatcher::spawn(sink, &config.delivery));

    let feed = Arc::new(UiFeed::new(config.pipeline.feed_channel_capacity));
    let store = Arc::new(JsonFileSessionStore::new(config.session.store_path.clone()));
    info!("Session store at {}", store.path().display());

    let pipeline = Arc::new(
        EventPipeline::new(
            &config.pipeline,
            AdmissionFilter::new(config.monitor.application.clone()),
            Arc::clone(&feed),
            dispatcher.clone(),
            Arc::new(LoggingSuppressor),
        )
        .with_store(store),
    );

    let restored = match pipeline.restore_session() {
        Ok(restored) => restored,
        Err(e) => {
            warn!("Could not restore previous session: {}", e);
            None
        }
    };

    if restored.is_none() {
        if let Ok(target) = std::env::var("BETREADER_TARGET") {
            let race = std::env::var("BETREADER_RACE")
                .unwrap_or_else(|_| DEFAULT_RACE_NUMBER.to_string());
            pipeline.start_session(&target, &race)?;
        } else {
            warn!("No active session; events will be observed but not recorded");
        }
    }

    let source = JsonLinesSource::new(tokio::io::stdin(), Arc::clone(&pipeline));

    tokio::select! {
        result = source.run() => {
            if let Err(e) = result {
                error!("Event source failed: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal, cleaning up...");
        }
    }

    let stats = pipeline.stats();
    info!(
        received = stats.received,
        admitted = stats.admitted,
        duplicates = stats.duplicates,
        rejected = stats.rejected,
        admission_rate = stats.admission_rate(),
        "Pipeline finished"
    );

    dispatcher.shutdown(config.delivery.shutdown_grace()).await?;
    Ok(())
}
