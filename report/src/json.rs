//! JSON export

use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::{json, Value};
use taskbench_core::RunReport;

/// Renders a run report as JSON
pub struct JsonReport;

impl JsonReport {
    /// Full report plus a derived `summary` block
    pub fn to_value(report: &RunReport) -> Result<Value> {
        let mut value = serde_json::to_value(report).context("Failed to serialize run report")?;

        let summary = json!({
            "total_requests": report.stats.total_count,
            "successful_requests": report.stats.success_count,
            "failed_requests": report.stats.failure_count,
            "success_rate_percent": report.stats.success_rate() * 100.0,
            "requests_per_second": report.stats.requests_per_second,
            "p95_ms": report.stats.latency.p95,
            "iterations": report.runners.total_iterations(),
            "duration_ms": report.duration().num_milliseconds(),
            "clean": report.is_clean(),
        });

        if let Value::Object(map) = &mut value {
            map.insert("summary".to_string(), summary);
        }

        Ok(value)
    }

    /// Write the pretty-printed report to `path`
    pub fn write(report: &RunReport, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let value = Self::to_value(report)?;

        let mut file = File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        file.write_all(serde_json::to_string_pretty(&value)?.as_bytes())?;
        file.write_all(b"\n")?;

        tracing::info!(path = %path.display(), "Wrote JSON report");
        Ok(())
    }
}
