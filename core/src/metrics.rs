//! Per-request results, latency percentiles and aggregate statistics

use crate::error::ErrorKind;
use crate::template::HttpMethod;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Why a request failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestFailure {
    /// Failure classification
    pub kind: ErrorKind,
    /// Human readable detail
    pub message: String,
}

impl RequestFailure {
    /// Create a failure
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Outcome of one issued (or attempted) request
///
/// Created by a runner right after the request completes and handed to the
/// [`ResultCollector`](crate::ResultCollector), which owns it from then on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestResult {
    /// Virtual user that issued the request
    pub runner_id: usize,
    /// Scenario pass index within that virtual user
    pub iteration: u64,
    /// Step name
    pub step: String,
    /// HTTP method
    pub method: HttpMethod,
    /// Rendered URL, or the raw template when rendering failed
    pub url: String,
    /// When the request started
    pub timestamp_start: chrono::DateTime<chrono::Utc>,
    /// Time from send to full response body
    pub latency: Duration,
    /// HTTP status, 0 when no response was received
    pub status_code: u16,
    /// Whether the request satisfied the step
    pub success: bool,
    /// Failure detail when `success` is false
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RequestFailure>,
    /// Variables captured from the response
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub captured: BTreeMap<String, String>,
}

impl RequestResult {
    /// Failure kind, if any
    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(|e| e.kind)
    }
}

/// Latency percentiles (all values in milliseconds)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct LatencyPercentiles {
    /// Minimum value
    pub min: f64,
    /// 50th percentile (median)
    pub p50: f64,
    /// 75th percentile
    pub p75: f64,
    /// 90th percentile
    pub p90: f64,
    /// 95th percentile
    pub p95: f64,
    /// 99th percentile
    pub p99: f64,
    /// Maximum value
    pub max: f64,
    /// Mean value
    pub mean: f64,
    /// Standard deviation
    pub stddev: f64,
}

/// In-memory histogram for efficient percentile calculation
/// Uses HdrHistogram for memory-efficient storage of large datasets
#[derive(Clone)]
pub struct LatencyHistogram {
    histogram: hdrhistogram::Histogram<u64>,
}

impl LatencyHistogram {
    /// Create a new histogram
    /// Configured for microsecond precision with max 1 hour latency
    pub fn new() -> Self {
        // Histogram with microsecond precision, max 1 hour (3,600,000,000 microseconds)
        let histogram = hdrhistogram::Histogram::new_with_bounds(1, 3_600_000_000, 3)
            .expect("Failed to create histogram");
        Self { histogram }
    }

    /// Record a duration; values outside the bounds are clamped
    pub fn record(&mut self, duration: Duration) {
        let micros = u64::try_from(duration.as_micros()).unwrap_or(u64::MAX);
        self.histogram.saturating_record(micros.max(1));
    }

    /// Fold another histogram into this one
    pub fn merge(&mut self, other: &LatencyHistogram) {
        // Same bounds on both sides, so addition cannot fail
        let _ = self.histogram.add(&other.histogram);
    }

    /// Get the number of recorded values
    pub fn len(&self) -> u64 {
        self.histogram.len()
    }

    /// Check if the histogram is empty
    pub fn is_empty(&self) -> bool {
        self.histogram.is_empty()
    }

    /// Calculate percentiles from the histogram
    pub fn percentiles(&self) -> LatencyPercentiles {
        if self.histogram.is_empty() {
            return LatencyPercentiles::default();
        }

        LatencyPercentiles {
            min: self.histogram.min() as f64 / 1000.0,
            p50: self.histogram.value_at_quantile(0.50) as f64 / 1000.0,
            p75: self.histogram.value_at_quantile(0.75) as f64 / 1000.0,
            p90: self.histogram.value_at_quantile(0.90) as f64 / 1000.0,
            p95: self.histogram.value_at_quantile(0.95) as f64 / 1000.0,
            p99: self.histogram.value_at_quantile(0.99) as f64 / 1000.0,
            max: self.histogram.max() as f64 / 1000.0,
            mean: self.histogram.mean() / 1000.0,
            stddev: self.histogram.stdev() / 1000.0,
        }
    }
}

impl Default for LatencyHistogram {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for LatencyHistogram {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LatencyHistogram")
            .field("len", &self.histogram.len())
            .finish()
    }
}

/// Per-step breakdown
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepStats {
    /// Requests issued by this step
    pub count: u64,
    /// Successful requests
    pub success_count: u64,
    /// Failed requests
    pub failure_count: u64,
    /// Latency percentiles for this step
    pub latency: LatencyPercentiles,
}

/// Immutable view of all results recorded so far
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateStats {
    /// Requests recorded
    pub total_count: u64,
    /// Successful requests
    pub success_count: u64,
    /// Failed requests
    pub failure_count: u64,
    /// Failed / total (0.0 - 1.0)
    pub error_rate: f64,
    /// Latency percentiles over every request
    pub latency: LatencyPercentiles,
    /// Responses by HTTP status; requests without a response count under 0
    pub status_codes: BTreeMap<u16, u64>,
    /// Failures by kind
    pub errors: BTreeMap<ErrorKind, u64>,
    /// Breakdown by step name
    pub steps: BTreeMap<String, StepStats>,
    /// Time since the collector was created
    pub elapsed: Duration,
    /// Requests per second over `elapsed`
    pub requests_per_second: f64,
}

impl AggregateStats {
    /// Successful / total (0.0 - 1.0)
    pub fn success_rate(&self) -> f64 {
        if self.total_count == 0 {
            0.0
        } else {
            self.success_count as f64 / self.total_count as f64
        }
    }
}
