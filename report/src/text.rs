//! Plain-text summary

use std::fmt::Write;

use taskbench_core::{ErrorKind, LatencyPercentiles, RunReport};

/// Renders a run report for the terminal
pub struct TextReport;

impl TextReport {
    /// Render `report` as a multi-line summary
    pub fn render(report: &RunReport) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail
        let _ = Self::write(&mut out, report);
        out
    }

    fn write(out: &mut String, report: &RunReport) -> std::fmt::Result {
        let stats = &report.stats;
        let duration_secs = report.duration().num_milliseconds() as f64 / 1000.0;

        writeln!(out, "scenario: {}", report.scenario)?;
        writeln!(
            out,
            "virtual users: {}, duration: {:.1}s, stopped: {}",
            report.config.virtual_users, duration_secs, report.stop_reason
        )?;
        writeln!(out)?;

        writeln!(
            out,
            "requests: {} total, {} ok, {} failed ({:.2}% errors), {:.1} req/s",
            stats.total_count,
            stats.success_count,
            stats.failure_count,
            stats.error_rate * 100.0,
            stats.requests_per_second
        )?;
        writeln!(out, "latency: {}", format_latency(&stats.latency))?;

        if !stats.status_codes.is_empty() {
            let codes: Vec<String> = stats
                .status_codes
                .iter()
                .map(|(code, count)| match code {
                    0 => format!("no response={count}"),
                    code => format!("{code}={count}"),
                })
                .collect();
            writeln!(out, "status codes: {}", codes.join(", "))?;
        }

        if !stats.errors.is_empty() {
            let count_where = |pred: fn(&ErrorKind) -> bool| -> u64 {
                stats
                    .errors
                    .iter()
                    .filter(|(kind, _)| pred(*kind))
                    .map(|(_, count)| *count)
                    .sum()
            };
            let transport = count_where(ErrorKind::is_transport);
            let soft = count_where(ErrorKind::is_soft);
            writeln!(
                out,
                "failures: {} without a response, {} rejected responses, {} other",
                transport,
                soft,
                stats.failure_count.saturating_sub(transport + soft)
            )?;
            for (kind, count) in &stats.errors {
                writeln!(out, "  {kind}: {count}")?;
            }
        }

        if !stats.steps.is_empty() {
            writeln!(out)?;
            writeln!(out, "steps:")?;
            for (name, step) in &stats.steps {
                writeln!(
                    out,
                    "  {name}: {} requests, {} failed, {}",
                    step.count,
                    step.failure_count,
                    format_latency(&step.latency)
                )?;
            }
        }

        let runners = &report.runners;
        writeln!(out)?;
        writeln!(
            out,
            "iterations: {} ok, {} failed, {} interrupted, {} crashed ({:.2}% ok)",
            runners.successful_iterations,
            runners.failed_iterations,
            runners.interrupted_iterations,
            runners.crashed_iterations,
            runners.iteration_success_rate() * 100.0
        )?;

        if report.forced_stops > 0 || report.crashed_runners > 0 {
            writeln!(
                out,
                "warning: {} virtual users aborted after the grace period, {} died",
                report.forced_stops, report.crashed_runners
            )?;
        }

        Ok(())
    }
}

fn format_latency(latency: &LatencyPercentiles) -> String {
    format!(
        "min {:.2}ms, p50 {:.2}ms, p90 {:.2}ms, p95 {:.2}ms, p99 {:.2}ms, max {:.2}ms",
        latency.min, latency.p50, latency.p90, latency.p95, latency.p99, latency.max
    )
}
