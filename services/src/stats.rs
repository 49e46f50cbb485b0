use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide submission counters.
///
/// Owned and injected explicitly (share via `Arc`), never ambient globals,
/// so tests can assert on isolated instances. Purely observational: nothing
/// in the submit path reads these back.
#[derive(Debug, Default)]
pub struct SubmissionStats {
    total_attempts: AtomicU64,
    successful_submissions: AtomicU64,
    conflicts: AtomicU64,
    retries_succeeded: AtomicU64,
    retries_failed: AtomicU64,
}

/// Point-in-time view of the counters with derived rates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSnapshot {
    pub total_attempts: u64,
    pub successful_submissions: u64,
    pub conflicts: u64,
    pub retries_succeeded: u64,
    pub retries_failed: u64,
    pub conflict_rate: f64,
    pub retry_success_rate: f64,
}

impl SubmissionStats {
    /// One submit call entered the protocol.
    pub fn record_attempt(&self) {
        self.total_attempts.fetch_add(1, Ordering::SeqCst);
    }

    /// One conditional update lost its version race.
    pub fn record_conflict(&self) {
        self.conflicts.fetch_add(1, Ordering::SeqCst);
    }

    /// A submission committed; `retried` marks whether it needed at least
    /// one conflict retry to get there.
    pub fn record_success(&self, retried: bool) {
        self.successful_submissions.fetch_add(1, Ordering::SeqCst);
        if retried {
            self.retries_succeeded.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// A submit call ran out of retry budget.
    pub fn record_retries_exhausted(&self) {
        self.retries_failed.fetch_add(1, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let total_attempts = self.total_attempts.load(Ordering::SeqCst);
        let successful_submissions = self.successful_submissions.load(Ordering::SeqCst);
        let conflicts = self.conflicts.load(Ordering::SeqCst);
        let retries_succeeded = self.retries_succeeded.load(Ordering::SeqCst);
        let retries_failed = self.retries_failed.load(Ordering::SeqCst);

        StatsSnapshot {
            total_attempts,
            successful_submissions,
            conflicts,
            retries_succeeded,
            retries_failed,
            conflict_rate: ratio(conflicts, total_attempts),
            retry_success_rate: ratio(retries_succeeded, conflicts),
        }
    }

    /// Zero every counter. Explicit operator action only.
    pub fn reset(&self) {
        self.total_attempts.store(0, Ordering::SeqCst);
        self.successful_submissions.store(0, Ordering::SeqCst);
        self.conflicts.store(0, Ordering::SeqCst);
        self.retries_succeeded.store(0, Ordering::SeqCst);
        self.retries_failed.store(0, Ordering::SeqCst);
    }
}

fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}
