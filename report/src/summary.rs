//! Structured log summary

use taskbench_core::RunReport;

/// Emit the headline numbers of `report` as tracing events
pub fn log_summary(report: &RunReport) {
    let stats = &report.stats;

    tracing::info!(
        scenario = %report.scenario,
        stop_reason = %report.stop_reason,
        requests = stats.total_count,
        failures = stats.failure_count,
        error_rate = stats.error_rate,
        rps = stats.requests_per_second,
        p50_ms = stats.latency.p50,
        p95_ms = stats.latency.p95,
        p99_ms = stats.latency.p99,
        iterations = report.runners.total_iterations(),
        "Run summary"
    );

    for (kind, count) in &stats.errors {
        tracing::info!(kind = %kind, count, "Failures by kind");
    }

    if report.forced_stops > 0 || report.crashed_runners > 0 {
        tracing::warn!(
            forced_stops = report.forced_stops,
            crashed_runners = report.crashed_runners,
            "Some virtual users did not stop cleanly"
        );
    }
}
