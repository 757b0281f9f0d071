//! Virtual user statistics tracking

use std::time::{Duration, Instant};

/// How one scenario pass ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassOutcome {
    /// Every step ran and every request succeeded
    Succeeded,
    /// Every step ran but at least one request failed
    Failed,
    /// Cancellation was observed between steps
    Interrupted,
    /// The pass panicked
    Crashed,
}

/// Statistics tracked by each virtual user
#[derive(Debug, Default, Clone)]
pub struct RunnerStats {
    /// Virtual user id
    pub runner_id: usize,

    /// Passes where every request succeeded
    pub successful_iterations: u64,

    /// Passes that ran all steps with at least one failed request
    pub failed_iterations: u64,

    /// Passes cut short by cancellation
    pub interrupted_iterations: u64,

    /// Passes that panicked
    pub crashed_iterations: u64,

    /// Requests issued or attempted
    pub requests: u64,

    /// Requests recorded as failed
    pub failed_requests: u64,

    /// Start time
    pub started_at: Option<Instant>,

    /// End time
    pub ended_at: Option<Instant>,
}

impl RunnerStats {
    /// Create empty stats for a virtual user
    pub fn new(runner_id: usize) -> Self {
        Self {
            runner_id,
            ..Default::default()
        }
    }

    /// Start tracking (records start time)
    pub fn start(&mut self) {
        self.started_at = Some(Instant::now());
    }

    /// Stop tracking (records end time)
    pub fn stop(&mut self) {
        self.ended_at = Some(Instant::now());
    }

    /// Count a finished pass
    pub fn record_pass(&mut self, outcome: PassOutcome) {
        match outcome {
            PassOutcome::Succeeded => self.successful_iterations += 1,
            PassOutcome::Failed => self.failed_iterations += 1,
            PassOutcome::Interrupted => self.interrupted_iterations += 1,
            PassOutcome::Crashed => self.crashed_iterations += 1,
        }
    }

    /// Add the requests issued during one pass
    pub fn record_requests(&mut self, requests: u64, failed: u64) {
        self.requests += requests;
        self.failed_requests += failed;
    }

    /// Passes started, whatever their outcome
    pub fn iterations(&self) -> u64 {
        self.successful_iterations
            + self.failed_iterations
            + self.interrupted_iterations
            + self.crashed_iterations
    }

    /// Get elapsed time since start
    pub fn elapsed(&self) -> Option<Duration> {
        self.started_at.map(|start| {
            self.ended_at
                .map(|end| end.duration_since(start))
                .unwrap_or_else(|| start.elapsed())
        })
    }
}
