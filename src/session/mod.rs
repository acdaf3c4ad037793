// src/session/mod.rs
//! Session lifecycle
//!
//! - **State**: the single active recording session and its invariants
//! - **Store**: persisted session fields for restore-on-restart

pub mod state;
pub mod store;

// Re-export commonly used types
pub use state::{SessionConfig, SessionState, DEFAULT_RACE_NUMBER};
pub use store::{JsonFileSessionStore, MemorySessionStore, PersistedSession, SessionStore};
