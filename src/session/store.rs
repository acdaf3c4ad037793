// src/session/store.rs
//! Persistence of the active session for restore-on-restart
//!
//! Only `{target_name, race_number, started_at}` survive a restart. Admitted
//! events are never persisted.

use crate::utils::errors::{ReaderError, Result};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Session fields that survive a restart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedSession {
    pub target_name: String,
    pub race_number: String,
    pub started_at: DateTime<Utc>,
}

/// Key-value settings store holding at most one persisted session
pub trait SessionStore: Send + Sync {
    /// Persisted session, if any
    fn load(&self) -> Result<Option<PersistedSession>>;

    /// Replace the persisted session
    fn save(&self, session: &PersistedSession) -> Result<()>;

    /// Forget the persisted session
    fn clear(&self) -> Result<()>;
}

/// Session store backed by a single JSON file
#[derive(Debug, Clone)]
pub struct JsonFileSessionStore {
    path: PathBuf,
}

impl JsonFileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl SessionStore for JsonFileSessionStore {
    fn load(&self) -> Result<Option<PersistedSession>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(ReaderError::StorageFailed(format!(
                    "Failed to read {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        let session = serde_json::from_slice(&bytes).map_err(|e| {
            ReaderError::StorageFailed(format!(
                "Corrupt session file {}: {}",
                self.path.display(),
                e
            ))
        })?;

        Ok(Some(session))
    }

    fn save(&self, session: &PersistedSession) -> Result<()> {
        let json = serde_json::to_vec_pretty(session)
            .map_err(|e| ReaderError::StorageFailed(format!("Serialization error: {}", e)))?;

        // write-then-rename so a crash never leaves a truncated file
        let tmp = self.temp_path();
        fs::write(&tmp, json).map_err(|e| {
            ReaderError::StorageFailed(format!("Failed to write {}: {}", tmp.display(), e))
        })?;
        fs::rename(&tmp, &self.path).map_err(|e| {
            ReaderError::StorageFailed(format!("Failed to replace {}: {}", self.path.display(), e))
        })?;

        debug!("Persisted session to {}", self.path.display());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ReaderError::StorageFailed(format!(
                "Failed to remove {}: {}",
                self.path.display(),
                e
            ))),
        }
    }
}

/// In-process store, for tests and embedders without a filesystem
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    slot: Mutex<Option<PersistedSession>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<PersistedSession>> {
        Ok(self.slot.lock().clone())
    }

    fn save(&self, session: &PersistedSession) -> Result<()> {
        *self.slot.lock() = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.slot.lock() = None;
        Ok(())
    }
}
