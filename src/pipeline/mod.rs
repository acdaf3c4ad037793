// src/pipeline/mod.rs
//! Event admission and deduplication
//!
//! This module turns a noisy, duplicate-prone notification stream into an
//! ordered, deduplicated sequence of session events:
//!
//! - **Event**: raw and admitted event records, fingerprints
//! - **Dedup**: bounded LRU of seen fingerprints
//! - **Filter**: admission rules and sender normalization
//! - **Sequence**: per-session gapless ids
//! - **Suppression**: throttled dismissal of processed notifications
//! - **Event Pipeline**: the orchestrator tying them together

pub mod dedup;
pub mod event;
pub mod event_pipeline;
pub mod filter;
pub mod sequence;
pub mod suppression;

// Re-export commonly used types
pub use dedup::{DedupCache, DEFAULT_DEDUP_CAPACITY};
pub use event::{fingerprint, AdmittedEvent, NotificationKey, RawEvent};
pub use event_pipeline::{Admission, EventPipeline, PipelineStats};
pub use filter::{normalize_sender, AdmissionFilter, Verdict};
pub use sequence::SequenceCounter;
pub use suppression::{SuppressionThrottle, Suppressor, DEFAULT_SUPPRESSION_INTERVAL};
