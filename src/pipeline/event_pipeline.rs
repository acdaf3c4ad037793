// src/pipeline/event_pipeline.rs
//! Admission orchestrator
//!
//! Raw events are processed strictly one at a time under a single lock that
//! also guards the session. A session start therefore resets the dedup cache,
//! sequence counter and UI feed atomically with respect to event processing.
//!
//! ```text
//! RawEvent ─► malformed? ─► seen? ─► filter ─► remember + next id
//!                                                  │
//!                       ┌──────────────────────────┼──────────────────┐
//!                       ▼                          ▼                  ▼
//!                 UiFeed::publish      DeliveryQueue::dispatch   Suppressor
//!                                         (non-blocking)        (throttled)
//! ```

use crate::delivery::{DeliveryPayload, DeliveryQueue};
use crate::feed::UiFeed;
use crate::observability::{
    EVENTS_ADMITTED, EVENTS_DUPLICATE, EVENTS_MALFORMED, EVENTS_RECEIVED, EVENTS_REJECTED,
    SUPPRESSIONS,
};
use crate::pipeline::dedup::DedupCache;
use crate::pipeline::event::{fingerprint, AdmittedEvent, RawEvent};
use crate::pipeline::filter::{normalize_sender, AdmissionFilter, Verdict};
use crate::pipeline::sequence::SequenceCounter;
use crate::pipeline::suppression::{SuppressionThrottle, Suppressor};
use crate::session::{SessionConfig, SessionState, SessionStore};
use crate::utils::config::PipelineConfig;
use crate::utils::errors::Result;
use chrono::Utc;
use metrics::counter;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

/// What happened to one raw event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    Admitted(AdmittedEvent),

    /// Same title and body already seen this session
    Duplicate,

    Rejected(Verdict),

    /// Title or body missing
    Malformed,
}

impl Admission {
    pub fn admitted(&self) -> Option<&AdmittedEvent> {
        match self {
            Admission::Admitted(event) => Some(event),
            _ => None,
        }
    }
}

/// State mutated only under the pipeline lock
struct PipelineCore {
    session: SessionState,
    dedup: DedupCache,
    counter: SequenceCounter,
    throttle: SuppressionThrottle,
}

impl PipelineCore {
    fn reset(&mut self) {
        self.dedup.clear();
        self.counter.reset();
    }
}

#[derive(Debug, Default)]
struct Counters {
    received: AtomicU64,
    admitted: AtomicU64,
    duplicates: AtomicU64,
    rejected: AtomicU64,
    malformed: AtomicU64,
    suppressions: AtomicU64,
}

/// Pipeline statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub received: u64,
    pub admitted: u64,
    pub duplicates: u64,
    pub rejected: u64,
    pub malformed: u64,
    pub suppressions: u64,
}

impl PipelineStats {
    /// Share of received events that were admitted (percent)
    pub fn admission_rate(&self) -> f64 {
        if self.received == 0 {
            0.0
        } else {
            (self.admitted as f64 / self.received as f64) * 100.0
        }
    }
}

pub struct EventPipeline {
    core: Mutex<PipelineCore>,
    filter: AdmissionFilter,
    feed: Arc<UiFeed>,
    delivery: Arc<dyn DeliveryQueue>,
    suppressor: Arc<dyn Suppressor>,
    store: Option<Arc<dyn SessionStore>>,
    counters: Counters,
}

impl EventPipeline {
    pub fn new(
        config: &PipelineConfig,
        filter: AdmissionFilter,
        feed: Arc<UiFeed>,
        delivery: Arc<dyn DeliveryQueue>,
        suppressor: Arc<dyn Suppressor>,
    ) -> Self {
        info!(
            application = filter.monitored_application(),
            dedup_capacity = config.dedup_capacity,
            "Initializing event pipeline"
        );

        Self {
            core: Mutex::new(PipelineCore {
                session: SessionState::new(),
                dedup: DedupCache::new(config.dedup_capacity),
                counter: SequenceCounter::new(),
                throttle: SuppressionThrottle::new(config.suppression_interval()),
            }),
            filter,
            feed,
            delivery,
            suppressor,
            store: None,
            counters: Counters::default(),
        }
    }

    /// Persist session changes to `store`
    pub fn with_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Run one raw event through dedup, admission and fan-out
    pub fn process(&self, raw: &RawEvent) -> Admission {
        self.counters.received.fetch_add(1, Ordering::Relaxed);
        counter!(EVENTS_RECEIVED).increment(1);

        let Some((title, body)) = raw.parts() else {
            trace!(app = %raw.source_application, "Ignoring notification without title or body");
            self.counters.malformed.fetch_add(1, Ordering::Relaxed);
            counter!(EVENTS_MALFORMED).increment(1);
            return Admission::Malformed;
        };

        let fingerprint = fingerprint(title, body);

        let mut core = self.core.lock();

        if core.dedup.seen(&fingerprint) {
            debug!(%fingerprint, "Skipping duplicate notification");
            self.counters.duplicates.fetch_add(1, Ordering::Relaxed);
            counter!(EVENTS_DUPLICATE).increment(1);
            return Admission::Duplicate;
        }

        let verdict = self
            .filter
            .evaluate(&raw.source_application, title, body, core.session.config());

        if !verdict.is_admit() {
            if verdict == Verdict::WrongApplication {
                trace!(app = %raw.source_application, "Notification from another application");
            } else {
                debug!(reason = verdict.as_str(), %title, "Rejected notification");
            }
            self.counters.rejected.fetch_add(1, Ordering::Relaxed);
            counter!(EVENTS_REJECTED, "reason" => verdict.as_str()).increment(1);
            return Admission::Rejected(verdict);
        }

        core.dedup.remember(fingerprint);
        let id = core.counter.next();

        let event = AdmittedEvent {
            id,
            sender: normalize_sender(title),
            message: body.to_string(),
            timestamp: Utc::now(),
        };

        info!(id, sender = %event.sender, message = %event.message, "Admitted event");

        // publish and enqueue under the lock so feed and queue order match ids
        self.feed.publish(event.clone());
        self.delivery
            .dispatch(DeliveryPayload::new(&event, core.session.config()));

        let suppress = core.throttle.try_acquire();
        drop(core);

        self.counters.admitted.fetch_add(1, Ordering::Relaxed);
        counter!(EVENTS_ADMITTED).increment(1);

        if suppress {
            match &raw.key {
                Some(key) => {
                    debug!(?key, "Suppressing processed notification");
                    self.suppressor.suppress(key);
                    self.counters.suppressions.fetch_add(1, Ordering::Relaxed);
                    counter!(SUPPRESSIONS).increment(1);
                }
                None => trace!(id, "No notification key, nothing to suppress"),
            }
        }

        Admission::Admitted(event)
    }

    /// Start a session; clears dedup state, sequence and feed
    pub fn start_session(&self, target_name: &str, race_number: &str) -> Result<()> {
        let mut core = self.core.lock();
        core.session.start(target_name, race_number)?;
        core.reset();
        self.feed.clear();

        let session = core.session.snapshot();
        info!(
            session_id = ?session.session_id,
            target = %session.target_name,
            race = %session.race_number,
            "Recording session started"
        );

        if let (Some(store), Some(persisted)) = (&self.store, core.session.persisted()) {
            if let Err(e) = store.save(&persisted) {
                warn!("Failed to persist session: {}", e);
            }
        }

        Ok(())
    }

    /// Stop admitting events; in-flight deliveries are left to finish
    pub fn stop_session(&self) {
        let mut core = self.core.lock();
        let was_active = core.session.is_active();
        core.session.stop();

        if was_active {
            info!(
                target = %core.session.config().target_name,
                admitted = core.counter.current(),
                "Recording session stopped"
            );
        }

        if let Some(store) = &self.store {
            if let Err(e) = store.clear() {
                warn!("Failed to clear persisted session: {}", e);
            }
        }
    }

    /// Re-enter the session persisted by a previous run, if any
    pub fn restore_session(&self) -> Result<Option<SessionConfig>> {
        let Some(store) = &self.store else {
            return Ok(None);
        };
        let Some(persisted) = store.load()? else {
            return Ok(None);
        };

        let mut core = self.core.lock();
        core.session.restore(&persisted)?;
        core.reset();
        self.feed.clear();

        let session = core.session.snapshot();
        info!(
            target = %session.target_name,
            race = %session.race_number,
            started_at = %persisted.started_at,
            "Restored recording session"
        );

        Ok(Some(session))
    }

    pub fn session(&self) -> SessionConfig {
        self.core.lock().session.snapshot()
    }

    pub fn feed(&self) -> &Arc<UiFeed> {
        &self.feed
    }

    pub fn stats(&self) -> PipelineStats {
        PipelineStats {
            received: self.counters.received.load(Ordering::Relaxed),
            admitted: self.counters.admitted.load(Ordering::Relaxed),
            duplicates: self.counters.duplicates.load(Ordering::Relaxed),
            rejected: self.counters.rejected.load(Ordering::Relaxed),
            malformed: self.counters.malformed.load(Ordering::Relaxed),
            suppressions: self.counters.suppressions.load(Ordering::Relaxed),
        }
    }
}
