//! Signature deduplication store
//!
//! Remembers transaction signatures for a fixed TTL so the same webhook
//! event is never processed twice inside the retention window. Early
//! eviction under capacity pressure can only cause reprocessing, never
//! drop an unseen signature.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::debug;

use crate::config::DedupConfig;

/// Entry in the signature store with TTL
#[derive(Debug, Clone, Copy)]
struct SeenSignature {
    seen_at: Instant,
}

impl SeenSignature {
    fn new() -> Self {
        Self {
            seen_at: Instant::now(),
        }
    }

    fn is_expired(&self, ttl: Duration) -> bool {
        self.seen_at.elapsed() > ttl
    }
}

/// Dedup statistics for monitoring
#[derive(Default)]
pub struct DedupStats {
    pub duplicates: AtomicU64,
    pub recorded: AtomicU64,
    pub evicted: AtomicU64,
}

impl DedupStats {
    fn record_duplicate(&self) {
        self.duplicates.fetch_add(1, Ordering::Relaxed);
    }

    fn record_new(&self) {
        self.recorded.fetch_add(1, Ordering::Relaxed);
    }

    fn record_evicted(&self, n: usize) {
        self.evicted.fetch_add(n as u64, Ordering::Relaxed);
    }
}

/// Time-bounded set of processed transaction signatures
pub struct DedupStore {
    seen: DashMap<String, SeenSignature>,
    ttl: Duration,
    max_entries: usize,
    stats: DedupStats,
}

impl DedupStore {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            seen: DashMap::with_capacity(max_entries.min(16_384)),
            ttl,
            max_entries: max_entries.max(1),
            stats: DedupStats::default(),
        }
    }

    pub fn from_config(config: &DedupConfig) -> Self {
        Self::new(Duration::from_secs(config.ttl_secs), config.max_entries)
    }

    /// Check whether a signature was seen within the TTL
    pub fn seen(&self, signature: &str) -> bool {
        if let Some(entry) = self.seen.get(signature) {
            if !entry.is_expired(self.ttl) {
                return true;
            }
            drop(entry);
            self.seen
                .remove_if(signature, |_, e| e.is_expired(self.ttl));
        }
        false
    }

    /// Record a signature, restarting its TTL
    pub fn mark_seen(&self, signature: &str) {
        self.make_room();
        self.seen.insert(signature.to_string(), SeenSignature::new());
        self.stats.record_new();
    }

    /// Atomically test-and-set a signature
    ///
    /// Returns `true` when the signature was not present (or had expired)
    /// and is now recorded. Holds the shard lock for the key, so two
    /// concurrent callers with the same signature cannot both get `true`.
    pub fn check_and_mark(&self, signature: &str) -> bool {
        self.make_room();
        match self.seen.entry(signature.to_string()) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().is_expired(self.ttl) {
                    occupied.insert(SeenSignature::new());
                    self.stats.record_new();
                    true
                } else {
                    self.stats.record_duplicate();
                    false
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(SeenSignature::new());
                self.stats.record_new();
                true
            }
        }
    }

    /// Drop expired signatures, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let before = self.seen.len();
        self.seen.retain(|_, e| !e.is_expired(self.ttl));
        let removed = before.saturating_sub(self.seen.len());
        if removed > 0 {
            self.stats.record_evicted(removed);
        }
        removed
    }

    fn make_room(&self) {
        if self.seen.len() < self.max_entries {
            return;
        }

        if self.purge_expired() > 0 && self.seen.len() < self.max_entries {
            return;
        }

        // Still full: drop ~10% of entries
        let to_remove = (self.max_entries / 10).max(1);
        let keys: Vec<_> = self
            .seen
            .iter()
            .take(to_remove)
            .map(|r| r.key().clone())
            .collect();
        for key in &keys {
            self.seen.remove(key);
        }
        self.stats.record_evicted(keys.len());
        debug!(evicted = keys.len(), "Dedup store at capacity, evicted signatures");
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn stats(&self) -> &DedupStats {
        &self.stats
    }
}

impl Default for DedupStore {
    fn default() -> Self {
        Self::from_config(&DedupConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_mark_then_seen() {
        let store = DedupStore::default();
        assert!(!store.seen("sig1"));
        store.mark_seen("sig1");
        assert!(store.seen("sig1"));
        assert!(!store.seen("sig2"));
        assert_eq!(store.ttl(), Duration::from_secs(86_400));
    }

    #[test]
    fn test_check_and_mark_only_first_wins() {
        let store = DedupStore::default();
        assert!(store.check_and_mark("sig1"));
        assert!(!store.check_and_mark("sig1"));
        assert!(store.seen("sig1"));

        let stats = store.stats();
        assert_eq!(stats.recorded.load(Ordering::Relaxed), 1);
        assert_eq!(stats.duplicates.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_expired_signature_is_processed_again() {
        let store = DedupStore::new(Duration::from_millis(20), 100);
        assert!(store.check_and_mark("sig1"));
        std::thread::sleep(Duration::from_millis(50));
        assert!(!store.seen("sig1"));
        assert!(store.check_and_mark("sig1"));
    }

    #[test]
    fn test_purge_expired() {
        let store = DedupStore::new(Duration::from_millis(20), 100);
        store.mark_seen("a");
        store.mark_seen("b");
        std::thread::sleep(Duration::from_millis(50));
        store.mark_seen("c");
        assert_eq!(store.purge_expired(), 2);
        assert_eq!(store.len(), 1);
        assert!(store.seen("c"));
    }

    #[test]
    fn test_capacity_eviction_keeps_bound() {
        let store = DedupStore::new(Duration::from_secs(60), 20);
        for i in 0..100 {
            store.mark_seen(&format!("sig{}", i));
        }
        assert!(store.len() <= 20);
        // The newest signature is always recorded
        assert!(store.seen("sig99"));
    }

    #[tokio::test]
    async fn test_concurrent_check_and_mark_single_winner() {
        let store = Arc::new(DedupStore::default());
        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move { store.check_and_mark("shared") }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }
}
