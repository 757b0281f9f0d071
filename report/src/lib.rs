//! Report generation for run results
//!
//! This crate renders a [`RunReport`](taskbench_core::RunReport) as:
//!
//! - A plain-text summary for the terminal
//! - JSON (value or pretty-printed file)
//! - Structured `tracing` events

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod json;
pub mod summary;
pub mod text;

pub use json::JsonReport;
pub use summary::log_summary;
pub use text::TextReport;

#[cfg(test)]
pub(crate) mod fixtures {
    use std::collections::BTreeMap;
    use std::time::Duration;

    use taskbench_core::{
        AggregateStats, ErrorKind, LatencyPercentiles, RunConfig, RunReport, RunnerSummary,
        StepStats, StopReason,
    };

    pub(crate) fn sample_report() -> RunReport {
        let latency = LatencyPercentiles {
            min: 1.0,
            p50: 12.5,
            p75: 15.0,
            p90: 20.0,
            p95: 25.0,
            p99: 40.0,
            max: 55.0,
            mean: 13.2,
            stddev: 4.1,
        };

        let mut steps = BTreeMap::new();
        steps.insert(
            "add task".to_string(),
            StepStats {
                count: 60,
                success_count: 58,
                failure_count: 2,
                latency,
            },
        );
        steps.insert(
            "get task".to_string(),
            StepStats {
                count: 40,
                success_count: 40,
                failure_count: 0,
                latency,
            },
        );

        let stats = AggregateStats {
            total_count: 100,
            success_count: 98,
            failure_count: 2,
            error_rate: 0.02,
            latency,
            status_codes: BTreeMap::from([(200, 98), (503, 2)]),
            errors: BTreeMap::from([(ErrorKind::HttpStatus, 2)]),
            steps,
            elapsed: Duration::from_secs(10),
            requests_per_second: 10.0,
        };

        let started_at = chrono::Utc::now();

        RunReport {
            scenario: "simple add task and query".to_string(),
            config: RunConfig::new(5, Duration::from_secs(10)),
            started_at,
            ended_at: started_at + chrono::Duration::seconds(10),
            stop_reason: StopReason::DurationElapsed,
            stats,
            runners: RunnerSummary {
                total_runners: 5,
                successful_iterations: 38,
                failed_iterations: 2,
                interrupted_iterations: 1,
                crashed_iterations: 0,
                requests: 100,
                failed_requests: 2,
                longest_runner: Duration::from_secs(10),
            },
            forced_stops: 0,
            crashed_runners: 0,
        }
    }
}
