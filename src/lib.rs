// src/lib.rs
//! Bet Reader Engine Library
//!
//! Watches a stream of chat notifications for one monitored application and
//! turns it into a clean, ordered, deduplicated sequence of session events.
//!
//! # Architecture
//!
//! The engine is structured into several key modules:
//!
//! - **pipeline**: dedup cache, admission filter, sequencing, orchestration
//! - **session**: the single recording session and its persistence
//! - **feed**: most-recent-first UI feed with broadcast subscriptions
//! - **delivery**: best-effort forwarding to the remote collector
//! - **source**: JSON-lines raw event source
//! - **observability**: tracing and metrics setup
//! - **utils**: configuration and errors
//!
//! ```text
//! RawEvent → EventPipeline ─┬─► UiFeed
//!                           ├─► DeliveryDispatcher ─► HttpDeliverySink
//!                           └─► Suppressor (≤ 1 per 5s)
//! ```

// Public module exports
pub mod delivery;
pub mod feed;
pub mod observability;
pub mod pipeline;
pub mod session;
pub mod source;
pub mod utils;

// Re-export commonly used types
pub use delivery::{DeliveryDispatcher, DeliveryPayload, DeliverySink, HttpDeliverySink};
pub use feed::{FeedUpdate, UiFeed};
pub use pipeline::{Admission, AdmissionFilter, AdmittedEvent, EventPipeline, RawEvent, Verdict};
pub use session::{SessionConfig, SessionStore};
pub use utils::config::ReaderConfig;
pub use utils::errors::{ReaderError, Result};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
