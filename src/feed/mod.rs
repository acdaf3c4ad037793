// src/feed/mod.rs
//! UI feed of admitted events
//!
//! The pipeline publishes; any number of views subscribe. A late subscriber
//! reads `snapshot()` first and then follows the broadcast stream.
//!
//! ```text
//! EventPipeline ── publish() ──► UiFeed ──► [snapshot: newest first]
//!                                   │
//!                                   └──► broadcast ──► subscribers
//! ```

use crate::pipeline::event::AdmittedEvent;
use parking_lot::RwLock;
use std::collections::VecDeque;
use tokio::sync::broadcast;

/// Default buffer of the broadcast channel
pub const DEFAULT_FEED_CHANNEL_CAPACITY: usize = 1_024;

/// Change notification sent to subscribers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedUpdate {
    /// A new event was prepended
    Admitted(AdmittedEvent),

    /// A new session started; drop everything shown so far
    Cleared,
}

/// Ordered, most-recent-first list of the session's admitted events
pub struct UiFeed {
    events: RwLock<VecDeque<AdmittedEvent>>,
    tx: broadcast::Sender<FeedUpdate>,
}

impl UiFeed {
    pub fn new(channel_capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(channel_capacity.max(1));
        Self {
            events: RwLock::new(VecDeque::new()),
            tx,
        }
    }

    /// Prepend `event` and notify subscribers
    pub fn publish(&self, event: AdmittedEvent) {
        self.events.write().push_front(event.clone());

        // No subscribers is fine
        let _ = self.tx.send(FeedUpdate::Admitted(event));
    }

    /// Drop all events and notify subscribers
    pub fn clear(&self) {
        self.events.write().clear();
        let _ = self.tx.send(FeedUpdate::Cleared);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FeedUpdate> {
        self.tx.subscribe()
    }

    /// Current events, newest first
    pub fn snapshot(&self) -> Vec<AdmittedEvent> {
        self.events.read().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }
}

impl Default for UiFeed {
    fn default() -> Self {
        Self::new(DEFAULT_FEED_CHANNEL_CAPACITY)
    }
}
