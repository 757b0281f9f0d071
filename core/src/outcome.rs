//! Final result of a run

use crate::config::RunConfig;
use crate::metrics::AggregateStats;
use crate::scheduler::RunnerSummary;
use serde::{Deserialize, Serialize};

/// Why the run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The configured duration expired
    DurationElapsed,
    /// Every virtual user finished its iteration cap
    IterationsCompleted,
    /// `stop` was called or the cancellation token fired
    Cancelled,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopReason::DurationElapsed => write!(f, "duration elapsed"),
            StopReason::IterationsCompleted => write!(f, "iterations completed"),
            StopReason::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Everything known about a finished run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Scenario name
    pub scenario: String,
    /// Configuration the run used
    pub config: RunConfig,
    /// Wall-clock start
    pub started_at: chrono::DateTime<chrono::Utc>,
    /// Wall-clock end
    pub ended_at: chrono::DateTime<chrono::Utc>,
    /// Why the run ended
    pub stop_reason: StopReason,
    /// Final request statistics
    pub stats: AggregateStats,
    /// Iteration totals across virtual users
    pub runners: RunnerSummary,
    /// Virtual users aborted after the grace period
    pub forced_stops: usize,
    /// Virtual user tasks that died instead of returning
    pub crashed_runners: usize,
}

impl RunReport {
    /// Wall-clock duration of the run
    pub fn duration(&self) -> chrono::Duration {
        self.ended_at - self.started_at
    }

    /// No request failed and every virtual user stopped cleanly
    pub fn is_clean(&self) -> bool {
        self.stats.failure_count == 0 && self.forced_stops == 0 && self.crashed_runners == 0
    }
}
