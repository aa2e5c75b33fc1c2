//! Remaining-time estimates from progress reports.

use std::time::Duration;
use tracing::trace;

/// Elapsed and estimated remaining time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Estimate {
    /// Time since the job started.
    pub elapsed: Duration,
    /// Projected time to completion.
    pub remaining: Duration,
}

/// Projects remaining time as `elapsed * (1 - p) / p`.
///
/// Only a strictly larger progress fraction in `(0, 1]` produces a new
/// estimate; repeated, smaller, zero or non-finite values keep the last one.
#[derive(Debug, Clone, Default)]
pub struct ProgressEstimator {
    last_progress: Option<f64>,
    last: Option<Estimate>,
}

impl ProgressEstimator {
    /// Creates an estimator with no observations.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a progress report taken `elapsed` after the job started.
    pub fn observe(&mut self, progress: f64, elapsed: Duration) -> Option<Estimate> {
        if !progress.is_finite() || progress <= 0.0 {
            trace!(progress, "Ignoring unusable progress");
            return self.last;
        }
        let progress = progress.min(1.0);
        if self.last_progress.is_some_and(|last| progress <= last) {
            trace!(progress, "Progress did not advance");
            return self.last;
        }

        let remaining_secs = elapsed.as_secs_f64() * (1.0 - progress) / progress;
        let remaining = Duration::try_from_secs_f64(remaining_secs).unwrap_or(Duration::MAX);
        let estimate = Estimate { elapsed, remaining };
        self.last_progress = Some(progress);
        self.last = Some(estimate);
        Some(estimate)
    }

    /// Forgets all observations.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quarter_done_projects_three_times_elapsed() {
        let mut estimator = ProgressEstimator::new();
        let estimate = estimator.observe(0.25, Duration::from_secs(10)).unwrap();
        assert_eq!(estimate.remaining, Duration::from_secs(30));
    }

    #[test]
    fn test_finished_job_has_nothing_remaining() {
        let mut estimator = ProgressEstimator::new();
        let estimate = estimator.observe(1.0, Duration::from_secs(42)).unwrap();
        assert_eq!(estimate.remaining, Duration::ZERO);
    }

    #[test]
    fn test_non_advancing_progress_keeps_last_estimate() {
        let mut estimator = ProgressEstimator::new();
        let first = estimator.observe(0.5, Duration::from_secs(10));
        assert_eq!(estimator.observe(0.5, Duration::from_secs(20)), first);
        assert_eq!(estimator.observe(0.3, Duration::from_secs(30)), first);
        assert_eq!(estimator.observe(f64::NAN, Duration::from_secs(40)), first);
    }

    #[test]
    fn test_zero_progress_gives_no_estimate() {
        let mut estimator = ProgressEstimator::new();
        assert_eq!(estimator.observe(0.0, Duration::from_secs(5)), None);
        assert_eq!(estimator.observe(-0.1, Duration::from_secs(5)), None);
    }

    #[test]
    fn test_steady_progress_never_raises_remaining() {
        let mut estimator = ProgressEstimator::new();
        let mut previous = Duration::MAX;
        for step in 1..=20u32 {
            let progress = f64::from(step) / 20.0;
            let elapsed = Duration::from_secs(u64::from(step) * 3);
            let estimate = estimator.observe(progress, elapsed).unwrap();
            assert!(estimate.remaining <= previous);
            previous = estimate.remaining;
        }
        assert_eq!(previous, Duration::ZERO);
    }
}
