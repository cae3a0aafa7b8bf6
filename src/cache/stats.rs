//! Lookup and eviction counters.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters updated atomically by lookups and continuations.
#[derive(Debug, Default)]
pub(crate) struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
    joins: AtomicU64,
    evictions: AtomicU64,
}

impl CacheStats {
    pub(crate) fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_join(&self) {
        self.joins.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self, entries: usize) -> CacheStatsSnapshot {
        CacheStatsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            joins: self.joins.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            entries,
        }
    }
}

/// A point-in-time copy of the cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStatsSnapshot {
    /// Lookups that resolved with a response.
    pub hits: u64,
    /// Lookups that failed with [`CacheError::Miss`](super::CacheError::Miss).
    pub misses: u64,
    /// `fetch` calls that joined an existing entry instead of issuing a request.
    pub joins: u64,
    /// Entries removed after settling non-cacheable or failed.
    pub evictions: u64,
    /// Entries present when the snapshot was taken.
    pub entries: usize,
}

impl CacheStatsSnapshot {
    /// Hits over completed hit-or-miss lookups, `0.0` when none happened.
    #[allow(clippy::cast_precision_loss)]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
