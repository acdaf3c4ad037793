// src/pipeline/dedup.rs
//! Bounded LRU set of seen fingerprints
//!
//! `seen` is a touching lookup: checking a fingerprint promotes it, so a
//! frequently repeated notification is the last to be evicted.

use lru::LruCache;
use std::num::NonZeroUsize;

/// Fingerprints kept before the least recently used one is evicted
pub const DEFAULT_DEDUP_CAPACITY: usize = 100;

pub struct DedupCache {
    entries: LruCache<String, ()>,
}

impl DedupCache {
    /// Create a cache holding `capacity` fingerprints (at least one)
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
        }
    }

    /// True if `fingerprint` is present; promotes it when it is
    pub fn seen(&mut self, fingerprint: &str) -> bool {
        self.entries.get(fingerprint).is_some()
    }

    /// Mark `fingerprint` as seen, evicting the LRU entry when full
    pub fn remember(&mut self, fingerprint: String) {
        self.entries.put(fingerprint, ());
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.entries.cap().get()
    }
}

impl Default for DedupCache {
    fn default() -> Self {
        Self::new(DEFAULT_DEDUP_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seen_after_remember() {
        let mut cache = DedupCache::default();
        assert_eq!(cache.capacity(), 100);
        assert!(!cache.seen("a::b"));

        cache.remember("a::b".to_string());
        assert!(cache.seen("a::b"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_evicts_least_recently_used() {
        let mut cache = DedupCache::default();
        for i in 0..100 {
            cache.remember(format!("fp{}", i));
        }
        assert_eq!(cache.len(), 100);

        cache.remember("fp100".to_string());
        assert_eq!(cache.len(), 100);
        assert!(!cache.seen("fp0"));
        assert!(cache.seen("fp1"));
        assert!(cache.seen("fp100"));
    }

    #[test]
    fn test_seen_promotes_entry() {
        let mut cache = DedupCache::new(3);
        cache.remember("a".to_string());
        cache.remember("b".to_string());
        cache.remember("c".to_string());

        // touch "a" so "b" becomes the eviction candidate
        assert!(cache.seen("a"));
        cache.remember("d".to_string());

        assert!(cache.seen("a"));
        assert!(!cache.seen("b"));
    }

    #[test]
    fn test_clear() {
        let mut cache = DedupCache::new(4);
        cache.remember("a".to_string());
        cache.clear();
        assert!(cache.is_empty());
        assert!(!cache.seen("a"));
    }

    #[test]
    fn test_zero_capacity_clamped() {
        let cache = DedupCache::new(0);
        assert_eq!(cache.capacity(), 1);
    }
}
