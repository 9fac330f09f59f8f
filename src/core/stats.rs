//! Processing counters shared by all cashiers

use std::sync::atomic::{AtomicU64, Ordering};

/// Completed and failed operation counts
#[derive(Debug, Default)]
pub struct ProcessingStats {
    completed: AtomicU64,
    failed: AtomicU64,
}

/// Point-in-time copy of [`ProcessingStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub completed: u64,
    pub failed: u64,
}

impl StatsSnapshot {
    /// Operations taken off the queue and finished, successfully or not
    pub fn processed(&self) -> u64 {
        self.completed + self.failed
    }
}

impl ProcessingStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&self) {
        self.completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            completed: self.completed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let stats = ProcessingStats::new();

        stats.record_success();
        stats.record_success();
        stats.record_failure();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot, StatsSnapshot { completed: 2, failed: 1 });
        assert_eq!(snapshot.processed(), 3);
    }
}
