//! Processor counters.
//!
//! Plain atomics, shared by every request on one processor. `storage_reads`
//! counts read round trips made while a request is validated; tests use it to
//! check that validation cost does not grow with the number of lines.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;

use stockroom_core::ProcessingState;

#[derive(Debug, Default)]
pub struct ProcessorMetrics {
    /// Requests that entered RECEIVED
    pub requests_received: AtomicU64,
    /// Requests that reached COMMITTED
    pub committed: AtomicU64,
    /// Requests that ended in VALIDATION_FAILED
    pub rejected: AtomicU64,
    /// Requests that ended in ALLOCATION_FAILED
    pub allocation_failures: AtomicU64,
    /// Requests that ended in WRITE_FAILED
    pub write_failures: AtomicU64,
    /// Requests abandoned at the deadline
    pub timeouts: AtomicU64,
    /// Read round trips issued while validating
    pub storage_reads: AtomicU64,
    /// Transaction numbers regenerated after a collision
    pub number_retries: AtomicU64,
    /// Cumulative receipt-to-commit time of committed requests
    pub commit_time_us: AtomicU64,
}

/// Point-in-time copy of [`ProcessorMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub requests_received: u64,
    pub committed: u64,
    pub rejected: u64,
    pub allocation_failures: u64,
    pub write_failures: u64,
    pub timeouts: u64,
    pub storage_reads: u64,
    pub number_retries: u64,
    pub avg_commit_us: u64,
}

impl ProcessorMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_received(&self) {
        self.requests_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_storage_read(&self) {
        self.storage_reads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_committed(&self, elapsed: Duration, number_retries: u32) {
        self.committed.fetch_add(1, Ordering::Relaxed);
        self.number_retries
            .fetch_add(u64::from(number_retries), Ordering::Relaxed);
        let micros = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
        self.commit_time_us.fetch_add(micros, Ordering::Relaxed);
    }

    /// Counts a request that ended in the given failure state.
    pub fn record_failure(&self, state: ProcessingState) {
        let counter = match state {
            ProcessingState::ValidationFailed => &self.rejected,
            ProcessingState::AllocationFailed => &self.allocation_failures,
            ProcessingState::WriteFailed => &self.write_failures,
            _ => return,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_timeout(&self) {
        self.timeouts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let committed = self.committed.load(Ordering::Relaxed);
        let commit_time = self.commit_time_us.load(Ordering::Relaxed);

        MetricsSnapshot {
            requests_received: self.requests_received.load(Ordering::Relaxed),
            committed,
            rejected: self.rejected.load(Ordering::Relaxed),
            allocation_failures: self.allocation_failures.load(Ordering::Relaxed),
            write_failures: self.write_failures.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
            storage_reads: self.storage_reads.load(Ordering::Relaxed),
            number_retries: self.number_retries.load(Ordering::Relaxed),
            avg_commit_us: if committed > 0 { commit_time / committed } else { 0 },
        }
    }
}
