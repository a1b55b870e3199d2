//! Cache statistics
//!
//! Counters live in an explicit [`Stats`] value handed to the manager, so
//! independent caches (and tests) never share counts. Several managers may
//! share one `Arc<Stats>` on purpose to get aggregate numbers.

use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters, updated by the cache manager
#[derive(Debug, Default)]
pub struct Stats {
    hits: AtomicU64,
    misses: AtomicU64,
    insertions: AtomicU64,
    evictions: AtomicU64,
    evicted_bytes: AtomicU64,
    faces_created: AtomicU64,
    faces_destroyed: AtomicU64,
    soft_budget_exceeded: AtomicU64,
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_insertion(&self) {
        self.insertions.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_eviction(&self, bytes: usize) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
        self.evicted_bytes.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_face_created(&self) {
        self.faces_created.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_face_destroyed(&self) {
        self.faces_destroyed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_soft_budget_exceeded(&self) {
        self.soft_budget_exceeded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn evictions(&self) -> u64 {
        self.evictions.load(Ordering::Relaxed)
    }

    /// Zeroes every counter
    pub fn reset(&self) {
        for counter in [
            &self.hits,
            &self.misses,
            &self.insertions,
            &self.evictions,
            &self.evicted_bytes,
            &self.faces_created,
            &self.faces_destroyed,
            &self.soft_budget_exceeded,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }

    pub(crate) fn snapshot(&self, usage: Usage) -> CacheStats {
        CacheStats {
            hits: self.hits(),
            misses: self.misses(),
            insertions: self.insertions.load(Ordering::Relaxed),
            evictions: self.evictions(),
            evicted_bytes: self.evicted_bytes.load(Ordering::Relaxed),
            faces_created: self.faces_created.load(Ordering::Relaxed),
            faces_destroyed: self.faces_destroyed.load(Ordering::Relaxed),
            soft_budget_exceeded: self.soft_budget_exceeded.load(Ordering::Relaxed),
            faces: usage.faces,
            glyphs: usage.glyphs,
            running_total: usage.running_total,
            min_budget: usage.min_budget,
            max_budget: usage.max_budget,
            budget_exceeded: usage.budget_exceeded,
        }
    }
}

/// Point-in-time usage figures read under the manager lock
#[derive(Debug, Clone, Copy)]
pub(crate) struct Usage {
    pub faces: usize,
    pub glyphs: usize,
    pub running_total: usize,
    pub min_budget: usize,
    pub max_budget: usize,
    pub budget_exceeded: bool,
}

/// Everything you need to know about cache performance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub insertions: u64,
    pub evictions: u64,
    pub evicted_bytes: u64,
    pub faces_created: u64,
    pub faces_destroyed: u64,
    /// Eviction passes that ran out of glyphs while still above `min_budget`
    pub soft_budget_exceeded: u64,
    pub faces: usize,
    pub glyphs: usize,
    pub running_total: usize,
    pub min_budget: usize,
    pub max_budget: usize,
    /// The most recent eviction pass stopped above `min_budget`
    pub budget_exceeded: bool,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Human-readable report
    pub fn report(&self) -> String {
        format!(
            "Glyph Cache:\n\
             - Faces: {} live ({} created, {} destroyed)\n\
             - Glyphs: {} cached, {} bytes (budget {}..{})\n\
             - Hit Rate: {:.2}% ({} hits, {} misses)\n\
             - Evictions: {} glyphs, {} bytes\n\
             - Soft budget overruns: {}{}",
            self.faces,
            self.faces_created,
            self.faces_destroyed,
            self.glyphs,
            self.running_total,
            self.min_budget,
            self.max_budget,
            self.hit_rate() * 100.0,
            self.hits,
            self.misses,
            self.evictions,
            self.evicted_bytes,
            self.soft_budget_exceeded,
            if self.budget_exceeded { " (currently over)" } else { "" },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usage() -> Usage {
        Usage {
            faces: 1,
            glyphs: 2,
            running_total: 100,
            min_budget: 10,
            max_budget: 20,
            budget_exceeded: true,
        }
    }

    #[test]
    fn test_counters_and_hit_rate() {
        let stats = Stats::new();
        stats.record_hit();
        stats.record_hit();
        stats.record_hit();
        stats.record_miss();
        stats.record_eviction(64);

        let snap = stats.snapshot(usage());
        assert_eq!(snap.hits, 3);
        assert_eq!(snap.misses, 1);
        assert_eq!(snap.evicted_bytes, 64);
        assert!((snap.hit_rate() - 0.75).abs() < f64::EPSILON);
        assert!(snap.report().contains("currently over"));
    }

    #[test]
    fn test_reset() {
        let stats = Stats::new();
        stats.record_face_created();
        stats.record_soft_budget_exceeded();
        stats.reset();
        let snap = stats.snapshot(usage());
        assert_eq!(snap.faces_created, 0);
        assert_eq!(snap.soft_budget_exceeded, 0);
        assert_eq!(snap.hit_rate(), 0.0);
    }
}
