// src/delivery/mod.rs
//! Remote delivery of admitted events
//!
//! - **Sink**: `DeliverySink` trait, wire payload, no-op sink
//! - **HTTP Sink**: JSON POST to the collection endpoint (reqwest)
//! - **Dispatcher**: bounded queue + concurrency-limited worker with cancellation
//!
//! Delivery is best-effort. Nothing here can fail admission, roll back a
//! sequence number or re-queue a payload.

pub mod dispatcher;
pub mod http_sink;
pub mod sink;

// Re-export commonly used types
pub use dispatcher::{DeliveryDispatcher, DeliveryQueue, DispatcherStats};
pub use http_sink::HttpDeliverySink;
pub use sink::{DeliveryPayload, DeliverySink, NoopSink};

use crate::utils::config::DeliveryConfig;
use crate::utils::errors::Result;
use std::sync::Arc;
use tracing::info;

/// Sink for the configured endpoint, or `NoopSink` when none is set
pub fn sink_from_config(config: &DeliveryConfig) -> Result<Arc<dyn DeliverySink>> {
    match &config.endpoint {
        Some(endpoint) => {
            let sink = HttpDeliverySink::new(endpoint.clone(), config.timeout())?;
            info!(endpoint = sink.endpoint(), "Delivering events to collector");
            Ok(Arc::new(sink))
        }
        None => {
            info!("No delivery endpoint configured, deliveries are only logged");
            Ok(Arc::new(NoopSink))
        }
    }
}
