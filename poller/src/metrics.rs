//! Counters for poll activity.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use ratepoll_common::ResultSet;

use crate::watcher::ReloadOutcome;

/// Poller metrics.
pub struct PollMetrics {
    /// Ticks completed.
    pub ticks_total: AtomicU64,
    /// Pairs that produced a rate.
    pub rates_fetched: AtomicU64,
    /// Pairs recorded as `null`.
    pub rates_failed: AtomicU64,
    /// Configuration reloads swapped in.
    pub reloads_applied: AtomicU64,
    /// Configuration reloads rejected as invalid.
    pub reloads_rejected: AtomicU64,
    /// Result sets that could not be written.
    pub write_failures: AtomicU64,
}

impl PollMetrics {
    /// Create new metrics instance.
    pub fn new() -> Self {
        Self {
            ticks_total: AtomicU64::new(0),
            rates_fetched: AtomicU64::new(0),
            rates_failed: AtomicU64::new(0),
            reloads_applied: AtomicU64::new(0),
            reloads_rejected: AtomicU64::new(0),
            write_failures: AtomicU64::new(0),
        }
    }

    /// Record a finished tick and its per-pair outcomes.
    pub fn tick_completed(&self, set: &ResultSet) {
        self.ticks_total.fetch_add(1, Ordering::Relaxed);
        self.rates_fetched
            .fetch_add(set.success_count() as u64, Ordering::Relaxed);
        self.rates_failed
            .fetch_add(set.failure_count() as u64, Ordering::Relaxed);
    }

    /// Record the outcome of a reload check.
    pub fn reload_checked(&self, outcome: ReloadOutcome) {
        match outcome {
            ReloadOutcome::Unchanged => {}
            ReloadOutcome::Reloaded => {
                self.reloads_applied.fetch_add(1, Ordering::Relaxed);
            }
            ReloadOutcome::Rejected => {
                self.reloads_rejected.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Record a failed write.
    pub fn write_failed(&self) {
        self.write_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current metrics snapshot.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            ticks_total: self.ticks_total.load(Ordering::Relaxed),
            rates_fetched: self.rates_fetched.load(Ordering::Relaxed),
            rates_failed: self.rates_failed.load(Ordering::Relaxed),
            reloads_applied: self.reloads_applied.load(Ordering::Relaxed),
            reloads_rejected: self.reloads_rejected.load(Ordering::Relaxed),
            write_failures: self.write_failures.load(Ordering::Relaxed),
        }
    }

    /// Export metrics in Prometheus format.
    pub fn to_prometheus(&self) -> String {
        let snapshot = self.snapshot();
        format!(
            r#"# HELP ratepoll_ticks_total Total poll ticks completed
# TYPE ratepoll_ticks_total counter
ratepoll_ticks_total {}

# HELP ratepoll_rates_fetched Total rates fetched successfully
# TYPE ratepoll_rates_fetched counter
ratepoll_rates_fetched {}

# HELP ratepoll_rates_failed Total rates recorded as null
# TYPE ratepoll_rates_failed counter
ratepoll_rates_failed {}

# HELP ratepoll_reloads_applied Total configuration reloads applied
# TYPE ratepoll_reloads_applied counter
ratepoll_reloads_applied {}

# HELP ratepoll_reloads_rejected Total invalid configuration reloads
# TYPE ratepoll_reloads_rejected counter
ratepoll_reloads_rejected {}

# HELP ratepoll_write_failures Total result writes that failed
# TYPE ratepoll_write_failures counter
ratepoll_write_failures {}
"#,
            snapshot.ticks_total,
            snapshot.rates_fetched,
            snapshot.rates_failed,
            snapshot.reloads_applied,
            snapshot.reloads_rejected,
            snapshot.write_failures,
        )
    }
}

impl Default for PollMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of metrics at a point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub ticks_total: u64,
    pub rates_fetched: u64,
    pub rates_failed: u64,
    pub reloads_applied: u64,
    pub reloads_rejected: u64,
    pub write_failures: u64,
}

/// Shared metrics instance.
pub type SharedMetrics = Arc<PollMetrics>;
