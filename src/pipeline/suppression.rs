// src/pipeline/suppression.rs
//! Rate-limited dismissal of processed notifications
//!
//! Clearing every notification is visible to the user, so dismissals are
//! batched to at most one per interval.

use crate::pipeline::event::NotificationKey;
use std::time::Duration;
use tokio::time::Instant;

/// Default gap between two dismissals
pub const DEFAULT_SUPPRESSION_INTERVAL: Duration = Duration::from_millis(5_000);

/// Platform surface able to dismiss a notification it reported
pub trait Suppressor: Send + Sync {
    fn suppress(&self, key: &NotificationKey);
}

/// Throttle deciding when a dismissal may happen
#[derive(Debug)]
pub struct SuppressionThrottle {
    interval: Duration,
    last: Instant,
}

impl SuppressionThrottle {
    /// The window starts now, so the first dismissal is one interval away
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: Instant::now(),
        }
    }

    /// True, and restarts the window, if a full interval has elapsed
    pub fn try_acquire(&mut self) -> bool {
        self.try_acquire_at(Instant::now())
    }

    pub fn try_acquire_at(&mut self, now: Instant) -> bool {
        if now.saturating_duration_since(self.last) >= self.interval {
            self.last = now;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_window_starts_at_construction() {
        let start = Instant::now();
        let mut throttle = SuppressionThrottle::new(DEFAULT_SUPPRESSION_INTERVAL);

        assert!(!throttle.try_acquire_at(start + Duration::from_millis(4_999)));
        assert!(throttle.try_acquire_at(start + Duration::from_millis(5_000)));
    }

    #[test]
    fn test_at_most_once_per_interval() {
        let start = Instant::now();
        let mut throttle = SuppressionThrottle::new(DEFAULT_SUPPRESSION_INTERVAL);

        let first = start + Duration::from_secs(6);
        assert!(throttle.try_acquire_at(first));
        assert!(!throttle.try_acquire_at(first + Duration::from_millis(1)));
        assert!(!throttle.try_acquire_at(first + Duration::from_millis(4_999)));
        assert!(throttle.try_acquire_at(first + Duration::from_millis(5_000)));
    }

    #[test]
    fn test_zero_interval_always_allows() {
        let mut throttle = SuppressionThrottle::new(Duration::ZERO);
        assert!(throttle.try_acquire());
        assert!(throttle.try_acquire());
    }
}
