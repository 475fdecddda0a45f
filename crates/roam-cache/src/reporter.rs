//! Rate-limited backend error reporting.
//!
//! When the backend goes down every request path produces an error; logging
//! each one floods the logs for the duration of the outage. The reporter logs
//! the first `threshold` errors individually, emits a single escalation
//! warning when the threshold is crossed, and afterwards only logs every
//! `sample_interval`-th error.

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{error, warn};

use crate::error::CacheError;

/// What the reporter did with one recorded error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Report {
    /// Logged individually (below the threshold).
    Individual,
    /// The one-time "backend appears down" escalation.
    Escalated,
    /// Logged as a sample of an ongoing outage.
    Sampled,
    /// Counted but not logged.
    Suppressed,
}

/// Per-client error reporter.
///
/// The counter belongs to one client instance so that independent clients in
/// the same process keep independent error budgets.
#[derive(Debug)]
pub struct ErrorReporter {
    errors: AtomicU64,
    threshold: u64,
    sample_interval: u64,
}

impl ErrorReporter {
    pub fn new(threshold: u64, sample_interval: u64) -> Self {
        Self {
            errors: AtomicU64::new(0),
            threshold,
            sample_interval: sample_interval.max(1),
        }
    }

    /// Record one backend error, logging it according to the policy.
    pub fn record(&self, op: &'static str, err: &CacheError) -> Report {
        let seen = self.errors.fetch_add(1, Ordering::Relaxed);
        if seen < self.threshold {
            warn!(op, error = %err, "cache backend operation failed");
            Report::Individual
        } else if seen == self.threshold {
            error!(
                op,
                errors = seen + 1,
                "cache backend appears down; further errors will be sampled"
            );
            Report::Escalated
        } else if seen % self.sample_interval == 0 {
            warn!(
                op,
                error = %err,
                errors = seen + 1,
                "cache backend still failing (sampled)"
            );
            Report::Sampled
        } else {
            Report::Suppressed
        }
    }

    /// Total errors recorded over this reporter's lifetime.
    pub fn total(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend_err() -> CacheError {
        CacheError::Backend("connection refused".to_string())
    }

    #[test]
    fn first_threshold_errors_log_individually() {
        let reporter = ErrorReporter::new(100, 100_000);
        let err = backend_err();

        let mut individual = 0;
        let mut escalated = 0;
        let mut sampled = 0;
        for _ in 0..250 {
            match reporter.record("GET", &err) {
                Report::Individual => individual += 1,
                Report::Escalated => escalated += 1,
                Report::Sampled => sampled += 1,
                Report::Suppressed => {}
            }
        }

        assert_eq!(individual, 100);
        assert_eq!(escalated, 1);
        assert_eq!(sampled, 0);
        assert_eq!(reporter.total(), 250);
    }

    #[test]
    fn escalation_fires_exactly_once() {
        let reporter = ErrorReporter::new(2, 10);
        let err = backend_err();
        let reports: Vec<Report> = (0..6).map(|_| reporter.record("SET", &err)).collect();
        assert_eq!(
            reports,
            vec![
                Report::Individual,
                Report::Individual,
                Report::Escalated,
                Report::Suppressed,
                Report::Suppressed,
                Report::Suppressed,
            ]
        );
    }

    #[test]
    fn outage_errors_are_sampled_at_the_interval() {
        let reporter = ErrorReporter::new(1, 4);
        let err = backend_err();
        let mut sampled = 0;
        for _ in 0..20 {
            if reporter.record("DEL", &err) == Report::Sampled {
                sampled += 1;
            }
        }
        // Counter values 4, 8, 12, 16 land on the interval (0 was individual,
        // 1 escalated, 19 recorded values total starting at 0).
        assert_eq!(sampled, 4);
    }

    #[test]
    fn independent_reporters_do_not_share_budgets() {
        let a = ErrorReporter::new(1, 100);
        let b = ErrorReporter::new(1, 100);
        let err = backend_err();
        assert_eq!(a.record("GET", &err), Report::Individual);
        assert_eq!(a.record("GET", &err), Report::Escalated);
        assert_eq!(b.record("GET", &err), Report::Individual);
    }
}
