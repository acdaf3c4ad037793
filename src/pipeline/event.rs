// src/pipeline/event.rs
//! Raw and admitted event types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Separator between title and body in a fingerprint
pub const FINGERPRINT_SEPARATOR: &str = "::";

/// Platform handle of an observed notification, used to dismiss it
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NotificationKey {
    #[serde(default)]
    pub tag: Option<String>,
    pub id: i64,
}

/// Notification as reported by the platform, for any application
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEvent {
    pub source_application: String,

    /// Sender/channel label; absent on some notification shapes
    #[serde(default)]
    pub title: Option<String>,

    /// Message text
    #[serde(default)]
    pub body: Option<String>,

    #[serde(default)]
    pub key: Option<NotificationKey>,
}

impl RawEvent {
    pub fn new(
        source_application: impl Into<String>,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            source_application: source_application.into(),
            title: Some(title.into()),
            body: Some(body.into()),
            key: None,
        }
    }

    pub fn with_key(mut self, key: NotificationKey) -> Self {
        self.key = Some(key);
        self
    }

    /// Title and body, or `None` if either is missing
    pub fn parts(&self) -> Option<(&str, &str)> {
        Some((self.title.as_deref()?, self.body.as_deref()?))
    }

    /// Deduplication key: `title + "::" + body`
    pub fn fingerprint(&self) -> Option<String> {
        let (title, body) = self.parts()?;
        Some(fingerprint(title, body))
    }
}

pub fn fingerprint(title: &str, body: &str) -> String {
    let mut key = String::with_capacity(title.len() + FINGERPRINT_SEPARATOR.len() + body.len());
    key.push_str(title);
    key.push_str(FINGERPRINT_SEPARATOR);
    key.push_str(body);
    key
}

/// Event accepted into the session; immutable once created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdmittedEvent {
    /// Sequence number within the session, starting at 1
    pub id: u64,

    /// Title with the group prefix stripped
    pub sender: String,

    pub message: String,

    /// Wall-clock time of admission
    pub timestamp: DateTime<Utc>,
}
