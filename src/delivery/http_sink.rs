// src/delivery/http_sink.rs
//! HTTPS POST delivery to the collection endpoint
//!
//! One request per event, no retries. Non-2xx responses and transport errors
//! come back as `DeliveryFailed` for the dispatcher to log.

use crate::delivery::sink::{DeliveryPayload, DeliverySink};
use crate::utils::errors::{ReaderError, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Response bodies longer than this are truncated in logs
const MAX_LOGGED_BODY: usize = 2_000;

pub struct HttpDeliverySink {
    client: Client,
    endpoint: String,
}

impl HttpDeliverySink {
    /// Create a sink posting to `endpoint`, giving up on a request after `timeout`
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ReaderError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl DeliverySink for HttpDeliverySink {
    async fn deliver(&self, payload: &DeliveryPayload) -> Result<()> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(payload)
            .send()
            .await
            .map_err(|e| ReaderError::DeliveryFailed(format!("HTTP error: {}", e)))?;

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => truncate_for_log(body),
            Err(e) => {
                debug!(id = payload.id, %status, "Failed to read collector response: {}", e);
                String::new()
            }
        };

        if status.is_success() {
            debug!(id = payload.id, %status, response = %body, "Collector accepted event");
            Ok(())
        } else {
            Err(ReaderError::DeliveryFailed(format!(
                "collector returned {}: {}",
                status.as_u16(),
                body
            )))
        }
    }
}

/// Cut `body` to at most `MAX_LOGGED_BODY` bytes on a char boundary
fn truncate_for_log(mut body: String) -> String {
    if body.len() > MAX_LOGGED_BODY {
        let mut cut = MAX_LOGGED_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
    }
    body
}
