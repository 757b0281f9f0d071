//! Scheduler execution logic

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::collector::ResultCollector;
use crate::config::RunConfig;
use crate::error::{BenchError, BenchResult};
use crate::metrics::{AggregateStats, RequestResult};
use crate::outcome::{RunReport, StopReason};
use crate::runner::{RequestRateLimiter, RunnerStats, VirtualUserBuilder};
use crate::scenario::Scenario;
use crate::traits::ClientFactory;

use super::aggregator::aggregate_runner_stats;
use super::ramp::{stages_duration, target_at};

/// Scheduler manages the run lifecycle
///
/// Responsible for validating the run, spawning and retiring virtual users,
/// enforcing the grace period on shutdown and producing the final report.
pub struct Scheduler {
    pub(crate) client_factory: Arc<dyn ClientFactory>,
    pub(crate) collector_shards: usize,
    pub(crate) retain_results: bool,
    pub(crate) ramp_tick: Duration,
}

struct RunnerSlot {
    id: usize,
    cancel: CancellationToken,
    handle: JoinHandle<RunnerStats>,
}

#[derive(Default)]
struct RunnerPool {
    next_id: usize,
    active: Vec<RunnerSlot>,
    retired: Vec<RunnerSlot>,
}

/// State shared by the handle and the supervisor task
struct RunShared {
    config: RunConfig,
    scenario: Arc<Scenario>,
    collector: Arc<ResultCollector>,
    rate_limiter: Arc<RequestRateLimiter>,
    client_factory: Arc<dyn ClientFactory>,
    root: CancellationToken,
    pool: Mutex<RunnerPool>,
    started: Instant,
    started_at: chrono::DateTime<chrono::Utc>,
}

impl RunShared {
    fn spawn_runner(&self) -> BenchResult<()> {
        let mut pool = self.pool.lock();
        let id = pool.next_id;

        let client = self.client_factory.create(id).map_err(|e| {
            BenchError::runtime(format!("failed to create client for runner {id}: {e}"))
        })?;

        let user = VirtualUserBuilder::new(id)
            .scenario(Arc::clone(&self.scenario))
            .client(client)
            .collector(Arc::clone(&self.collector))
            .rate_limiter(Arc::clone(&self.rate_limiter))
            .run_config(&self.config)
            .build()?;

        let cancel = self.root.child_token();
        let handle = tokio::spawn(user.run(cancel.clone()));

        pool.next_id += 1;
        pool.active.push(RunnerSlot { id, cancel, handle });
        Ok(())
    }

    /// Cancel the newest active runner; it keeps running until it notices
    fn retire_newest(&self) {
        let mut pool = self.pool.lock();
        if let Some(slot) = pool.active.pop() {
            tracing::debug!(runner_id = slot.id, "Retiring virtual user");
            slot.cancel.cancel();
            pool.retired.push(slot);
        }
    }

    fn scale_to(&self, target: usize) {
        let current = self.pool.lock().active.len();
        if target > current {
            for _ in current..target {
                if let Err(e) = self.spawn_runner() {
                    tracing::error!(error = %e, "Failed to spawn virtual user during ramp");
                    break;
                }
            }
        } else {
            for _ in target..current {
                self.retire_newest();
            }
        }
    }

    fn all_active_finished(&self) -> bool {
        self.pool
            .lock()
            .active
            .iter()
            .all(|slot| slot.handle.is_finished())
    }
}

impl Scheduler {
    /// Validate the run and launch the virtual users
    ///
    /// Must be called from within a Tokio runtime. Without ramp stages
    /// exactly `config.virtual_users` runners are running when this returns.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if the config or scenario fails validation, `Runtime`
    /// if a client cannot be created. No runner is left behind on error.
    pub fn start(&self, config: RunConfig, scenario: Scenario) -> BenchResult<RunningTest> {
        config.validate()?;
        scenario.validate()?;

        for (step, placeholder) in scenario.unresolved_placeholders() {
            tracing::warn!(
                step = %step,
                placeholder = %placeholder,
                "Placeholder is never bound; requests of this step will fail"
            );
        }

        if stages_duration(&config.stages) > config.duration {
            tracing::warn!(
                stages_secs = stages_duration(&config.stages).as_secs_f64(),
                duration_secs = config.duration.as_secs_f64(),
                "Ramp stages outlast the run; later stages will not be reached"
            );
        }

        let shards = self.collector_shards.min(config.virtual_users).max(1);
        let mut collector = ResultCollector::new(shards);
        if self.retain_results {
            collector = collector.with_retained_results();
        }

        let initial = if config.is_ramping() {
            target_at(&config.stages, Duration::ZERO)
        } else {
            config.virtual_users
        };

        tracing::info!(
            scenario = %scenario.name,
            virtual_users = config.virtual_users,
            duration_secs = config.duration.as_secs_f64(),
            pacing = config.pacing.name(),
            stages = config.stages.len(),
            max_iterations = ?config.max_iterations,
            rate_limit = ?config.rate_limit,
            client = self.client_factory.name(),
            "Starting run"
        );

        let shared = Arc::new(RunShared {
            rate_limiter: Arc::new(RequestRateLimiter::new(config.rate_limit)),
            scenario: Arc::new(scenario),
            collector: Arc::new(collector),
            client_factory: Arc::clone(&self.client_factory),
            root: CancellationToken::new(),
            pool: Mutex::new(RunnerPool::default()),
            started: Instant::now(),
            started_at: chrono::Utc::now(),
            config,
        });

        for _ in 0..initial {
            if let Err(e) = shared.spawn_runner() {
                shared.root.cancel();
                return Err(e);
            }
        }

        let supervisor = tokio::spawn(supervise(Arc::clone(&shared), self.ramp_tick));

        Ok(RunningTest {
            shared,
            supervisor: Some(supervisor),
        })
    }

    /// Run until the duration expires (or all iterations finish), then stop
    pub async fn run(&self, config: RunConfig, scenario: Scenario) -> BenchResult<RunReport> {
        let test = self.start(config, scenario)?;
        Ok(test.wait().await)
    }

    /// Run with Ctrl+C signal handling
    ///
    /// Ctrl+C triggers the same graceful stop as duration expiry.
    pub async fn run_with_signal_handling(
        &self,
        config: RunConfig,
        scenario: Scenario,
    ) -> BenchResult<RunReport> {
        let test = self.start(config, scenario)?;
        let cancel = test.cancel_token();

        let signal_handle = tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
                    cancel.cancel();
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to listen for Ctrl+C");
                }
            }
        });

        let report = test.wait().await;
        signal_handle.abort();

        Ok(report)
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("client_factory", &self.client_factory.name())
            .field("collector_shards", &self.collector_shards)
            .field("retain_results", &self.retain_results)
            .field("ramp_tick", &self.ramp_tick)
            .finish()
    }
}

/// Ends on cancellation, duration expiry or, for a constant pool with an
/// iteration cap, once every runner has returned
async fn supervise(shared: Arc<RunShared>, tick: Duration) -> StopReason {
    let deadline = tokio::time::Instant::from_std(shared.started + shared.config.duration);
    let wait_for_iterations = shared.config.max_iterations.is_some() && !shared.config.is_ramping();

    let mut ticker = tokio::time::interval(tick);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = shared.root.cancelled() => {
                tracing::info!("Cancellation requested");
                return StopReason::Cancelled;
            }
            _ = tokio::time::sleep_until(deadline) => {
                tracing::info!("Duration elapsed, stopping virtual users");
                return StopReason::DurationElapsed;
            }
            _ = ticker.tick() => {}
        }

        if shared.config.is_ramping() {
            let target = target_at(&shared.config.stages, shared.started.elapsed());
            shared.scale_to(target);
        } else if wait_for_iterations && shared.all_active_finished() {
            tracing::info!("All virtual users completed their iterations");
            return StopReason::IterationsCompleted;
        }
    }
}

/// Handle to a started run
///
/// Dropping the handle cancels every virtual user without waiting for them.
pub struct RunningTest {
    shared: Arc<RunShared>,
    supervisor: Option<JoinHandle<StopReason>>,
}

impl RunningTest {
    /// Statistics recorded so far
    pub fn snapshot(&self) -> AggregateStats {
        self.shared.collector.snapshot()
    }

    /// The collector receiving every result of this run
    pub fn collector(&self) -> Arc<ResultCollector> {
        Arc::clone(&self.shared.collector)
    }

    /// Raw results, if the scheduler retains them
    pub fn results(&self) -> Vec<RequestResult> {
        self.shared.collector.results()
    }

    /// Runners that are neither retired nor finished
    pub fn active_runners(&self) -> usize {
        self.shared
            .pool
            .lock()
            .active
            .iter()
            .filter(|slot| !slot.handle.is_finished())
            .count()
    }

    /// Runners spawned since the start, retired ones included
    pub fn launched_runners(&self) -> usize {
        self.shared.pool.lock().next_id
    }

    /// Root token; cancelling it stops the run like [`stop`](Self::stop)
    pub fn cancel_token(&self) -> CancellationToken {
        self.shared.root.clone()
    }

    /// Wait for the run to end on its own, then shut it down
    pub async fn wait(mut self) -> RunReport {
        let reason = match self.supervisor.take() {
            Some(handle) => handle.await.unwrap_or(StopReason::Cancelled),
            None => StopReason::Cancelled,
        };
        self.shutdown(reason).await
    }

    /// Cancel every runner and wait for them up to the grace period
    ///
    /// Runners still busy when the grace period ends are aborted and counted
    /// in [`RunReport::forced_stops`].
    pub async fn stop(mut self) -> RunReport {
        let reason = match self.supervisor.take() {
            Some(handle) if handle.is_finished() => {
                handle.await.unwrap_or(StopReason::Cancelled)
            }
            Some(handle) => {
                self.shared.root.cancel();
                let _ = handle.await;
                StopReason::Cancelled
            }
            None => StopReason::Cancelled,
        };
        self.shutdown(reason).await
    }

    async fn shutdown(&mut self, reason: StopReason) -> RunReport {
        let shared = &self.shared;
        shared.root.cancel();

        let slots: Vec<RunnerSlot> = {
            let mut pool = shared.pool.lock();
            let mut slots = std::mem::take(&mut pool.retired);
            slots.append(&mut pool.active);
            slots
        };

        let grace = shared.config.grace_period;
        let deadline = tokio::time::Instant::now() + grace;
        let mut runner_stats = Vec::with_capacity(slots.len());
        let mut forced_stops = 0;
        let mut crashed_runners = 0;

        for mut slot in slots {
            match tokio::time::timeout_at(deadline, &mut slot.handle).await {
                Ok(Ok(stats)) => runner_stats.push(stats),
                Ok(Err(e)) => {
                    crashed_runners += 1;
                    tracing::error!(runner_id = slot.id, error = %e, "Virtual user task died");
                }
                Err(_) => {
                    slot.handle.abort();
                    forced_stops += 1;
                    tracing::warn!(
                        runner_id = slot.id,
                        grace_ms = grace.as_millis() as u64,
                        "Virtual user did not stop within grace period, aborting"
                    );
                }
            }
        }

        let stats = shared.collector.snapshot();
        let runners = aggregate_runner_stats(&runner_stats);

        tracing::info!(
            reason = %reason,
            elapsed_secs = shared.started.elapsed().as_secs_f64(),
            requests = stats.total_count,
            failures = stats.failure_count,
            error_rate = stats.error_rate,
            rps = stats.requests_per_second,
            forced_stops,
            crashed_runners,
            "Run completed"
        );

        RunReport {
            scenario: shared.scenario.name.clone(),
            config: shared.config.clone(),
            started_at: shared.started_at,
            ended_at: chrono::Utc::now(),
            stop_reason: reason,
            stats,
            runners,
            forced_stops,
            crashed_runners,
        }
    }
}

impl Drop for RunningTest {
    fn drop(&mut self) {
        self.shared.root.cancel();
    }
}

impl std::fmt::Debug for RunningTest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunningTest")
            .field("scenario", &self.shared.scenario.name)
            .field("launched_runners", &self.launched_runners())
            .field("active_runners", &self.active_runners())
            .finish()
    }
}
