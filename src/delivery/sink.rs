// src/delivery/sink.rs
//! Delivery sink abstraction and wire payload

use crate::pipeline::event::AdmittedEvent;
use crate::session::SessionConfig;
use crate::utils::errors::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

/// JSON body posted to the collector for each admitted event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryPayload {
    pub id: u64,
    pub sender: String,
    pub message: String,
    pub group_name: String,

    /// Admission time, milliseconds since the Unix epoch
    pub timestamp: i64,

    pub race_number: String,
}

impl DeliveryPayload {
    pub fn new(event: &AdmittedEvent, session: &SessionConfig) -> Self {
        Self {
            id: event.id,
            sender: event.sender.clone(),
            message: event.message.clone(),
            group_name: session.target_name.clone(),
            timestamp: event.timestamp.timestamp_millis(),
            race_number: session.race_number.clone(),
        }
    }
}

/// Best-effort forwarding of admitted events to a remote collector
#[async_trait]
pub trait DeliverySink: Send + Sync {
    async fn deliver(&self, payload: &DeliveryPayload) -> Result<()>;
}

/// Sink used when no collector endpoint is configured
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

#[async_trait]
impl DeliverySink for NoopSink {
    async fn deliver(&self, payload: &DeliveryPayload) -> Result<()> {
        info!(
            id = payload.id,
            group = %payload.group_name,
            "No collector configured, skipping delivery"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionState;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_payload_wire_format() {
        let mut state = SessionState::new();
        state.start("Gladiators Indian Racing", "3").unwrap();

        let event = AdmittedEvent {
            id: 12,
            sender: "Alice".to_string(),
            message: "bet 100 on horse 3".to_string(),
            timestamp: Utc.timestamp_millis_opt(1_700_000_000_123).unwrap(),
        };

        let payload = DeliveryPayload::new(&event, &state.snapshot());
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "id": 12,
                "sender": "Alice",
                "message": "bet 100 on horse 3",
                "groupName": "Gladiators Indian Racing",
                "timestamp": 1_700_000_000_123i64,
                "raceNumber": "3",
            })
        );
    }

    #[tokio::test]
    async fn test_noop_sink() {
        let payload = DeliveryPayload {
            id: 1,
            sender: "A".to_string(),
            message: "m".to_string(),
            group_name: "G".to_string(),
            timestamp: 0,
            race_number: "1".to_string(),
        };
        assert!(NoopSink.deliver(&payload).await.is_ok());
    }
}
