//! Thread-safe result aggregation
//!
//! Results are routed to one of several mutex-guarded shards by runner id,
//! so runners only contend with the few other runners mapped to the same
//! shard. Each critical section is a handful of counter increments and one
//! histogram record. [`ResultCollector::snapshot`] merges every shard into
//! an [`AggregateStats`].

use crate::error::ErrorKind;
use crate::metrics::{AggregateStats, LatencyHistogram, RequestResult, StepStats};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::time::Instant;

#[derive(Debug, Default)]
struct StepShard {
    count: u64,
    success_count: u64,
    latency: LatencyHistogram,
}

#[derive(Debug, Default)]
struct Shard {
    total_count: u64,
    success_count: u64,
    latency: LatencyHistogram,
    status_codes: BTreeMap<u16, u64>,
    errors: BTreeMap<ErrorKind, u64>,
    steps: BTreeMap<String, StepShard>,
    retained: Vec<RequestResult>,
}

impl Shard {
    fn apply(&mut self, result: RequestResult, retain: bool) {
        self.total_count += 1;
        if result.success {
            self.success_count += 1;
        }
        self.latency.record(result.latency);
        *self.status_codes.entry(result.status_code).or_default() += 1;
        if let Some(kind) = result.error_kind() {
            *self.errors.entry(kind).or_default() += 1;
        }

        let step = self.steps.entry(result.step.clone()).or_default();
        step.count += 1;
        if result.success {
            step.success_count += 1;
        }
        step.latency.record(result.latency);

        if retain {
            self.retained.push(result);
        }
    }
}

/// Aggregates [`RequestResult`]s from every runner
#[derive(Debug)]
pub struct ResultCollector {
    shards: Box<[Mutex<Shard>]>,
    retain_results: bool,
    started_at: Instant,
}

impl ResultCollector {
    /// Create a collector with `shards` lock shards (at least one)
    pub fn new(shards: usize) -> Self {
        let shards = (0..shards.max(1))
            .map(|_| Mutex::new(Shard::default()))
            .collect::<Vec<_>>()
            .into_boxed_slice();

        Self {
            shards,
            retain_results: false,
            started_at: Instant::now(),
        }
    }

    /// Keep every raw result in memory for [`results`](Self::results)
    pub fn with_retained_results(mut self) -> Self {
        self.retain_results = true;
        self
    }

    /// Number of lock shards
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Record one result; takes ownership
    pub fn record(&self, result: RequestResult) {
        let index = result.runner_id % self.shards.len();
        self.shards[index].lock().apply(result, self.retain_results);
    }

    /// Merge all shards into an immutable copy of the statistics
    pub fn snapshot(&self) -> AggregateStats {
        let mut total_count = 0;
        let mut success_count = 0;
        let mut latency = LatencyHistogram::new();
        let mut status_codes: BTreeMap<u16, u64> = BTreeMap::new();
        let mut errors: BTreeMap<ErrorKind, u64> = BTreeMap::new();
        let mut steps: BTreeMap<String, StepShard> = BTreeMap::new();

        for shard in self.shards.iter() {
            let shard = shard.lock();
            total_count += shard.total_count;
            success_count += shard.success_count;
            latency.merge(&shard.latency);
            for (code, count) in &shard.status_codes {
                *status_codes.entry(*code).or_default() += count;
            }
            for (kind, count) in &shard.errors {
                *errors.entry(*kind).or_default() += count;
            }
            for (name, step) in &shard.steps {
                let merged = steps.entry(name.clone()).or_default();
                merged.count += step.count;
                merged.success_count += step.success_count;
                merged.latency.merge(&step.latency);
            }
        }

        let failure_count = total_count - success_count;
        let error_rate = if total_count > 0 {
            failure_count as f64 / total_count as f64
        } else {
            0.0
        };

        let elapsed = self.started_at.elapsed();
        let secs = elapsed.as_secs_f64();
        let requests_per_second = if secs > 0.0 {
            total_count as f64 / secs
        } else {
            0.0
        };

        let steps = steps
            .into_iter()
            .map(|(name, step)| {
                let stats = StepStats {
                    count: step.count,
                    success_count: step.success_count,
                    failure_count: step.count - step.success_count,
                    latency: step.latency.percentiles(),
                };
                (name, stats)
            })
            .collect();

        AggregateStats {
            total_count,
            success_count,
            failure_count,
            error_rate,
            latency: latency.percentiles(),
            status_codes,
            errors,
            steps,
            elapsed,
            requests_per_second,
        }
    }

    /// Every retained result, grouped by shard in recording order
    ///
    /// Empty unless the collector was created with
    /// [`with_retained_results`](Self::with_retained_results).
    pub fn results(&self) -> Vec<RequestResult> {
        self.shards
            .iter()
            .flat_map(|shard| shard.lock().retained.clone())
            .collect()
    }
}

impl Default for ResultCollector {
    fn default() -> Self {
        Self::new(16)
    }
}
