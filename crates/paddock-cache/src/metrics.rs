//! Metrics collection for cache operations

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters shared by every handle of a coordinator
#[derive(Debug, Default)]
pub struct CacheMetrics {
    memory_hits: AtomicU64,
    disk_hits: AtomicU64,
    builds_started: AtomicU64,
    builds_succeeded: AtomicU64,
    builds_failed: AtomicU64,
    joined_waiters: AtomicU64,
    wait_timeouts: AtomicU64,
    evictions: AtomicU64,
    sweep_count: AtomicU64,
}

/// Point-in-time copy of [`CacheMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Requests served from memory
    pub memory_hits: u64,
    /// Requests served from the persisted tier
    pub disk_hits: u64,
    /// Aggregator builds started
    pub builds_started: u64,
    /// Builds that were persisted and promoted
    pub builds_succeeded: u64,
    /// Builds that failed or could not be persisted
    pub builds_failed: u64,
    /// Requests that joined an in-flight build
    pub joined_waiters: u64,
    /// Requests that gave up waiting on a build
    pub wait_timeouts: u64,
    /// Memory entries evicted by sweeps
    pub evictions: u64,
    /// Janitor sweeps completed
    pub sweep_count: u64,
}

fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

impl CacheMetrics {
    /// Create zeroed metrics
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_memory_hit(&self) {
        bump(&self.memory_hits);
    }

    pub(crate) fn record_disk_hit(&self) {
        bump(&self.disk_hits);
    }

    pub(crate) fn record_build_started(&self) {
        bump(&self.builds_started);
    }

    pub(crate) fn record_build_succeeded(&self) {
        bump(&self.builds_succeeded);
    }

    pub(crate) fn record_build_failed(&self) {
        bump(&self.builds_failed);
    }

    pub(crate) fn record_joined_waiter(&self) {
        bump(&self.joined_waiters);
    }

    pub(crate) fn record_wait_timeout(&self) {
        bump(&self.wait_timeouts);
    }

    pub(crate) fn record_sweep(&self, evicted: usize) {
        bump(&self.sweep_count);
        self.evictions.fetch_add(evicted as u64, Ordering::Relaxed);
    }

    /// Copy the current counter values
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            memory_hits: self.memory_hits.load(Ordering::Relaxed),
            disk_hits: self.disk_hits.load(Ordering::Relaxed),
            builds_started: self.builds_started.load(Ordering::Relaxed),
            builds_succeeded: self.builds_succeeded.load(Ordering::Relaxed),
            builds_failed: self.builds_failed.load(Ordering::Relaxed),
            joined_waiters: self.joined_waiters.load(Ordering::Relaxed),
            wait_timeouts: self.wait_timeouts.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            sweep_count: self.sweep_count.load(Ordering::Relaxed),
        }
    }
}

impl MetricsSnapshot {
    /// Generate a summary report of metrics
    pub fn summary(&self) -> String {
        [
            "Cache Metrics Summary".to_string(),
            "=====================".to_string(),
            format!("Memory hits: {}", self.memory_hits),
            format!("Disk hits: {}", self.disk_hits),
            format!(
                "Builds: {} started, {} succeeded, {} failed",
                self.builds_started, self.builds_succeeded, self.builds_failed
            ),
            format!(
                "Waiters: {} joined, {} timed out",
                self.joined_waiters, self.wait_timeouts
            ),
            format!("Sweeps: {} ({} evicted)", self.sweep_count, self.evictions),
        ]
        .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let metrics = CacheMetrics::new();
        metrics.record_memory_hit();
        metrics.record_memory_hit();
        metrics.record_build_started();
        metrics.record_sweep(3);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.memory_hits, 2);
        assert_eq!(snapshot.builds_started, 1);
        assert_eq!(snapshot.sweep_count, 1);
        assert_eq!(snapshot.evictions, 3);
    }

    #[test]
    fn test_summary() {
        let summary = MetricsSnapshot {
            disk_hits: 4,
            ..MetricsSnapshot::default()
        }
        .summary();
        assert!(summary.contains("Disk hits: 4"));
        assert!(summary.contains("Sweeps: 0 (0 evicted)"));
    }
}
