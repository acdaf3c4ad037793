// src/pipeline/filter.rs
//! Admission rules for raw notifications
//!
//! The platform gives no structured group identifier, only free-text title
//! and body. A group message is recognized by a colon in the title plus a
//! mention of the target name in either field. The heuristic admits some
//! false positives and misses some messages.

use crate::session::SessionConfig;
use once_cell::sync::Lazy;
use regex::Regex;

/// Aggregate notifications such as "5 new messages"
static SUMMARY_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]+ new messages$").expect("summary pattern is valid"));

/// Outcome of evaluating one event, naming the first rule that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Admit,
    WrongApplication,
    NoActiveSession,
    NotGroupShaped,
    TargetMismatch,
    SummaryNotification,
}

impl Verdict {
    pub fn is_admit(self) -> bool {
        self == Verdict::Admit
    }

    /// Label used for the rejection metric
    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Admit => "admit",
            Verdict::WrongApplication => "wrong_application",
            Verdict::NoActiveSession => "no_active_session",
            Verdict::NotGroupShaped => "not_group_shaped",
            Verdict::TargetMismatch => "target_mismatch",
            Verdict::SummaryNotification => "summary_notification",
        }
    }
}

/// Stateless admission predicate for one monitored application
#[derive(Debug, Clone)]
pub struct AdmissionFilter {
    monitored_application: String,
}

impl AdmissionFilter {
    pub fn new(monitored_application: impl Into<String>) -> Self {
        Self {
            monitored_application: monitored_application.into(),
        }
    }

    pub fn monitored_application(&self) -> &str {
        &self.monitored_application
    }

    /// True when every admission rule passes
    pub fn admit(
        &self,
        source_application: &str,
        title: &str,
        body: &str,
        session: &SessionConfig,
    ) -> bool {
        self.evaluate(source_application, title, body, session).is_admit()
    }

    /// Apply the rules in order and report the first failure
    pub fn evaluate(
        &self,
        source_application: &str,
        title: &str,
        body: &str,
        session: &SessionConfig,
    ) -> Verdict {
        if source_application != self.monitored_application {
            return Verdict::WrongApplication;
        }

        if !session.is_recording() {
            return Verdict::NoActiveSession;
        }

        if !title.contains(':') {
            return Verdict::NotGroupShaped;
        }

        if !contains_ignore_case(title, &session.target_name)
            && !contains_ignore_case(body, &session.target_name)
        {
            return Verdict::TargetMismatch;
        }

        if SUMMARY_PATTERN.is_match(body) {
            return Verdict::SummaryNotification;
        }

        Verdict::Admit
    }
}

/// Sender shown for a title such as `"Group: Alice"` → `"Alice"`
pub fn normalize_sender(title: &str) -> String {
    match title.split_once(": ") {
        Some((_, sender)) => sender.trim().to_string(),
        None => title.to_string(),
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionState;

    const APP: &str = "com.whatsapp";
    const GROUP: &str = "Gladiators Indian Racing";

    fn active_session() -> SessionConfig {
        let mut state = SessionState::new();
        state.start(GROUP, "1").unwrap();
        state.snapshot()
    }

    #[test]
    fn test_admits_group_message() {
        let filter = AdmissionFilter::new(APP);
        let session = active_session();
        let title = "Gladiators Indian Racing: Alice";

        assert!(filter.admit(APP, title, "bet 100 on horse 3", &session));
        assert_eq!(normalize_sender(title), "Alice");
    }

    #[test]
    fn test_target_match_is_case_insensitive() {
        let filter = AdmissionFilter::new(APP);
        let session = active_session();

        assert_eq!(
            filter.evaluate(APP, "GLADIATORS indian racing: Bob", "2 on 5", &session),
            Verdict::Admit
        );
        // target only mentioned in the body
        assert_eq!(
            filter.evaluate(APP, "Bob: Carol", "fwd from gladiators indian racing", &session),
            Verdict::Admit
        );
    }

    #[test]
    fn test_rejects_other_application() {
        let filter = AdmissionFilter::new(APP);
        let session = active_session();
        assert_eq!(
            filter.evaluate("org.telegram", "Gladiators Indian Racing: A", "hi", &session),
            Verdict::WrongApplication
        );
    }

    #[test]
    fn test_rejects_inactive_session() {
        let filter = AdmissionFilter::new(APP);
        let mut state = SessionState::new();
        state.start(GROUP, "1").unwrap();
        state.stop();

        assert_eq!(
            filter.evaluate(APP, "Gladiators Indian Racing: A", "hi", &state.snapshot()),
            Verdict::NoActiveSession
        );
        assert_eq!(
            filter.evaluate(APP, "Gladiators Indian Racing: A", "hi", &SessionConfig::default()),
            Verdict::NoActiveSession
        );
    }

    #[test]
    fn test_rejects_title_without_colon() {
        let filter = AdmissionFilter::new(APP);
        let session = active_session();
        assert_eq!(
            filter.evaluate(APP, "Gladiators Indian Racing", "bet 100", &session),
            Verdict::NotGroupShaped
        );
    }

    #[test]
    fn test_rejects_other_group() {
        let filter = AdmissionFilter::new(APP);
        let session = active_session();
        assert_eq!(
            filter.evaluate(APP, "Family: Mum", "dinner at 8", &session),
            Verdict::TargetMismatch
        );
    }

    #[test]
    fn test_rejects_summary() {
        let filter = AdmissionFilter::new(APP);
        let session = active_session();
        assert_eq!(
            filter.evaluate(APP, "Gladiators Indian Racing: 2 chats", "5 new messages", &session),
            Verdict::SummaryNotification
        );
        // only an exact summary is excluded
        assert_eq!(
            filter.evaluate(APP, "Gladiators Indian Racing: A", "I saw 5 new messages", &session),
            Verdict::Admit
        );
    }

    #[test]
    fn test_summary_counts_are_ascii_digits() {
        let filter = AdmissionFilter::new(APP);
        let session = active_session();
        assert_eq!(
            filter.evaluate(APP, "Gladiators Indian Racing: A", "12 new messages", &session),
            Verdict::SummaryNotification
        );
        assert_eq!(
            filter.evaluate(APP, "Gladiators Indian Racing: A", "५ new messages", &session),
            Verdict::Admit
        );
    }

    #[test]
    fn test_normalize_sender() {
        assert_eq!(normalize_sender("Group: Alice"), "Alice");
        assert_eq!(normalize_sender("Group:  Alice  "), "Alice");
        assert_eq!(normalize_sender("A: B: C"), "B: C");
        assert_eq!(normalize_sender("Group:Alice"), "Group:Alice");
        assert_eq!(normalize_sender("Alice"), "Alice");
    }
}
