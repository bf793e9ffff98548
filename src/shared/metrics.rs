use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

pub const UNSET_TS: u64 = 0;

/// Counters for queue drain passes. Shared process-wide through `AppState`,
/// read by the status facade and the `sync_report` harness.
#[derive(Debug)]
pub struct DrainMetrics {
    passes: AtomicU64,
    replayed: AtomicU64,
    failed: AtomicU64,
    consecutive_failed_passes: AtomicU64,
    last_pass_ms: AtomicU64,
    last_replayed: AtomicU64,
    last_failed: AtomicU64,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DrainMetricsSnapshot {
    pub passes: u64,
    pub replayed: u64,
    pub failed: u64,
    pub consecutive_failed_passes: u64,
    pub last_pass_ms: Option<u64>,
    pub last_replayed: u64,
    pub last_failed: u64,
}

impl DrainMetrics {
    pub const fn new() -> Self {
        Self {
            passes: AtomicU64::new(0),
            replayed: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            consecutive_failed_passes: AtomicU64::new(0),
            last_pass_ms: AtomicU64::new(UNSET_TS),
            last_replayed: AtomicU64::new(0),
            last_failed: AtomicU64::new(0),
        }
    }

    /// Record one completed drain pass. A pass counts as failed when at least
    /// one item was attempted and none succeeded.
    pub fn record_pass(&self, replayed: u64, failed: u64) {
        self.passes.fetch_add(1, Ordering::Relaxed);
        self.replayed.fetch_add(replayed, Ordering::Relaxed);
        self.failed.fetch_add(failed, Ordering::Relaxed);
        if failed > 0 && replayed == 0 {
            self.consecutive_failed_passes.fetch_add(1, Ordering::Relaxed);
        } else {
            self.consecutive_failed_passes.store(0, Ordering::Relaxed);
        }
        self.last_pass_ms.store(current_unix_ms(), Ordering::Relaxed);
        self.last_replayed.store(replayed, Ordering::Relaxed);
        self.last_failed.store(failed, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> DrainMetricsSnapshot {
        DrainMetricsSnapshot {
            passes: self.passes.load(Ordering::Relaxed),
            replayed: self.replayed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            consecutive_failed_passes: self.consecutive_failed_passes.load(Ordering::Relaxed),
            last_pass_ms: timestamp_to_option(self.last_pass_ms.load(Ordering::Relaxed)),
            last_replayed: self.last_replayed.load(Ordering::Relaxed),
            last_failed: self.last_failed.load(Ordering::Relaxed),
        }
    }

    pub fn reset(&self) {
        self.passes.store(0, Ordering::Relaxed);
        self.replayed.store(0, Ordering::Relaxed);
        self.failed.store(0, Ordering::Relaxed);
        self.consecutive_failed_passes.store(0, Ordering::Relaxed);
        self.last_pass_ms.store(UNSET_TS, Ordering::Relaxed);
        self.last_replayed.store(0, Ordering::Relaxed);
        self.last_failed.store(0, Ordering::Relaxed);
    }
}

impl Default for DrainMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
pub fn current_unix_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_millis() as u64)
        .unwrap_or(UNSET_TS)
}

#[inline]
pub fn timestamp_to_option(value: u64) -> Option<u64> {
    if value == UNSET_TS { None } else { Some(value) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_pass_accumulates_totals() {
        let metrics = DrainMetrics::new();
        metrics.record_pass(3, 1);
        metrics.record_pass(0, 2);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.passes, 2);
        assert_eq!(snapshot.replayed, 3);
        assert_eq!(snapshot.failed, 3);
        assert_eq!(snapshot.last_replayed, 0);
        assert_eq!(snapshot.last_failed, 2);
        assert!(snapshot.last_pass_ms.is_some());
    }

    #[test]
    fn consecutive_failures_reset_on_progress() {
        let metrics = DrainMetrics::new();
        metrics.record_pass(0, 1);
        metrics.record_pass(0, 1);
        assert_eq!(metrics.snapshot().consecutive_failed_passes, 2);

        metrics.record_pass(1, 1);
        assert_eq!(metrics.snapshot().consecutive_failed_passes, 0);
    }
}
