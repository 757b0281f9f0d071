//! Summary of per-runner statistics

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::runner::RunnerStats;

/// Iteration totals across all virtual users of a run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunnerSummary {
    /// Virtual users that reported back
    pub total_runners: usize,

    /// Passes where every request succeeded
    pub successful_iterations: u64,

    /// Passes with at least one failed request
    pub failed_iterations: u64,

    /// Passes cut short by cancellation
    pub interrupted_iterations: u64,

    /// Passes that panicked
    pub crashed_iterations: u64,

    /// Requests issued or attempted
    pub requests: u64,

    /// Requests recorded as failed
    pub failed_requests: u64,

    /// Longest time any virtual user was running
    pub longest_runner: Duration,
}

impl RunnerSummary {
    /// Passes started, whatever their outcome
    pub fn total_iterations(&self) -> u64 {
        self.successful_iterations
            + self.failed_iterations
            + self.interrupted_iterations
            + self.crashed_iterations
    }

    /// Passes that did not succeed, crashed ones included
    pub fn unsuccessful_iterations(&self) -> u64 {
        self.failed_iterations + self.crashed_iterations
    }

    /// Successful share of the passes that ran to an end (0.0 - 1.0)
    pub fn iteration_success_rate(&self) -> f64 {
        let finished = self.successful_iterations + self.unsuccessful_iterations();
        if finished > 0 {
            self.successful_iterations as f64 / finished as f64
        } else {
            0.0
        }
    }
}

/// Aggregate statistics from multiple virtual users
pub fn aggregate_runner_stats(stats: &[RunnerStats]) -> RunnerSummary {
    if stats.is_empty() {
        return RunnerSummary::default();
    }

    let longest_runner = stats
        .iter()
        .filter_map(|s| s.elapsed())
        .max()
        .unwrap_or(Duration::ZERO);

    RunnerSummary {
        total_runners: stats.len(),
        successful_iterations: stats.iter().map(|s| s.successful_iterations).sum(),
        failed_iterations: stats.iter().map(|s| s.failed_iterations).sum(),
        interrupted_iterations: stats.iter().map(|s| s.interrupted_iterations).sum(),
        crashed_iterations: stats.iter().map(|s| s.crashed_iterations).sum(),
        requests: stats.iter().map(|s| s.requests).sum(),
        failed_requests: stats.iter().map(|s| s.failed_requests).sum(),
        longest_runner,
    }
}
