// src/session/state.rs
//! Recording session state
//!
//! At most one session is active at a time. The pipeline holds the only
//! `SessionState` and resets its dedup cache and sequence counter in the same
//! critical section as `start`.

use crate::session::store::PersistedSession;
use crate::utils::errors::{ReaderError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Race label used when none has been chosen
pub const DEFAULT_RACE_NUMBER: &str = "1";

/// Snapshot of the session as seen by the admission filter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Whether events are currently being recorded
    pub active: bool,

    /// Group/channel name the session is scoped to
    pub target_name: String,

    /// Opaque label forwarded to the collector
    pub race_number: String,

    /// Set while active
    pub started_at: Option<DateTime<Utc>>,

    /// Identifies the session in logs
    pub session_id: Option<Ulid>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            active: false,
            target_name: String::new(),
            race_number: DEFAULT_RACE_NUMBER.to_string(),
            started_at: None,
            session_id: None,
        }
    }
}

impl SessionConfig {
    /// True when the session can admit events
    pub fn is_recording(&self) -> bool {
        self.active && !self.target_name.trim().is_empty() && self.started_at.is_some()
    }
}

/// Owner of the single session
#[derive(Debug, Default)]
pub struct SessionState {
    config: SessionConfig,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a session targeting `target_name`
    ///
    /// A blank target leaves the current state untouched.
    pub fn start(&mut self, target_name: &str, race_number: &str) -> Result<()> {
        self.enter(target_name, race_number, Utc::now())
    }

    /// Re-enter a session persisted by an earlier run, keeping its start time
    pub fn restore(&mut self, persisted: &PersistedSession) -> Result<()> {
        self.enter(
            &persisted.target_name,
            &persisted.race_number,
            persisted.started_at,
        )
    }

    fn enter(
        &mut self,
        target_name: &str,
        race_number: &str,
        started_at: DateTime<Utc>,
    ) -> Result<()> {
        if target_name.trim().is_empty() {
            return Err(ReaderError::InvalidSession(
                "target name cannot be blank".to_string(),
            ));
        }

        let race_number = if race_number.trim().is_empty() {
            DEFAULT_RACE_NUMBER
        } else {
            race_number
        };

        self.config = SessionConfig {
            active: true,
            target_name: target_name.to_string(),
            race_number: race_number.to_string(),
            started_at: Some(started_at),
            session_id: Some(Ulid::new()),
        };

        Ok(())
    }

    /// End the session; target and race number stay for display
    pub fn stop(&mut self) {
        self.config.active = false;
        self.config.started_at = None;
    }

    pub fn is_active(&self) -> bool {
        self.config.active
    }

    pub fn snapshot(&self) -> SessionConfig {
        self.config.clone()
    }

    /// Borrowed view used on the hot path
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Fields persisted for restore-on-restart, if a session is active
    pub fn persisted(&self) -> Option<PersistedSession> {
        let started_at = self.config.started_at?;
        if !self.config.active {
            return None;
        }

        Some(PersistedSession {
            target_name: self.config.target_name.clone(),
            race_number: self.config.race_number.clone(),
            started_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_and_stop() {
        let mut state = SessionState::new();
        assert!(!state.is_active());

        state.start("Gladiators Indian Racing", "3").unwrap();
        let snapshot = state.snapshot();
        assert!(snapshot.active);
        assert!(snapshot.is_recording());
        assert_eq!(snapshot.target_name, "Gladiators Indian Racing");
        assert_eq!(snapshot.race_number, "3");
        assert!(snapshot.started_at.is_some());
        assert!(snapshot.session_id.is_some());

        state.stop();
        let snapshot = state.snapshot();
        assert!(!snapshot.active);
        assert!(!snapshot.is_recording());
        assert!(snapshot.started_at.is_none());
        assert_eq!(snapshot.target_name, "Gladiators Indian Racing");
    }

    #[test]
    fn test_blank_target_rejected() {
        let mut state = SessionState::new();
        state.start("Gladiators Indian Racing", "1").unwrap();
        let before = state.snapshot();

        let result = state.start("   ", "2");
        assert!(matches!(result, Err(ReaderError::InvalidSession(_))));
        assert_eq!(state.snapshot(), before);
    }

    #[test]
    fn test_blank_race_number_defaults() {
        let mut state = SessionState::new();
        state.start("Gladiators", "").unwrap();
        assert_eq!(state.snapshot().race_number, DEFAULT_RACE_NUMBER);
    }

    #[test]
    fn test_restore_keeps_start_time() {
        let started_at = Utc::now() - chrono::Duration::minutes(30);
        let persisted = PersistedSession {
            target_name: "Gladiators International Racing".to_string(),
            race_number: "7".to_string(),
            started_at,
        };

        let mut state = SessionState::new();
        state.restore(&persisted).unwrap();

        assert!(state.is_active());
        assert_eq!(state.snapshot().started_at, Some(started_at));
        assert_eq!(state.persisted(), Some(persisted));
    }

    #[test]
    fn test_persisted_none_when_inactive() {
        let mut state = SessionState::new();
        assert!(state.persisted().is_none());

        state.start("Gladiators", "1").unwrap();
        state.stop();
        assert!(state.persisted().is_none());
    }
}
