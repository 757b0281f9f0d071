//! Virtual user execution loop

use crate::collector::ResultCollector;
use crate::error::ErrorKind;
use crate::metrics::{RequestFailure, RequestResult};
use crate::pacing::Pacing;
use crate::response::HttpResponse;
use crate::scenario::{Scenario, ScenarioStep, ITERATION_BINDING, VU_BINDING};
use crate::template::{Bindings, HttpMethod};
use crate::traits::{HttpClient, TransportError};

use super::rate_limiter::RequestRateLimiter;
use super::stats::{PassOutcome, RunnerStats};

use futures::FutureExt;
use std::any::Any;
use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// One simulated user: render -> execute -> check -> capture -> record, per step
///
/// Virtual users are tokio tasks managed by the Scheduler. They share the
/// scenario, the collector and the rate limiter via Arc, and own their HTTP
/// client.
pub struct VirtualUser {
    pub(super) id: usize,
    pub(super) scenario: Arc<Scenario>,
    pub(super) client: Arc<dyn HttpClient>,
    pub(super) collector: Arc<ResultCollector>,
    pub(super) rate_limiter: Arc<RequestRateLimiter>,
    pub(super) pacing: Pacing,
    pub(super) request_timeout: Duration,
    pub(super) max_iterations: Option<u64>,
}

/// Where a pass currently is; survives a panic of the pass future
#[derive(Debug, Default)]
struct PassProgress {
    requests: u64,
    failed_requests: u64,
    in_flight: Option<InFlight>,
}

#[derive(Debug)]
struct InFlight {
    step: String,
    method: HttpMethod,
    url: String,
    timestamp_start: chrono::DateTime<chrono::Utc>,
    started: Instant,
}

enum StepOutcome {
    Succeeded,
    Failed,
    Interrupted,
}

impl VirtualUser {
    /// Get the virtual user id
    pub fn id(&self) -> usize {
        self.id
    }

    /// Run scenario passes until `cancel` fires or the iteration cap is hit
    ///
    /// Cancellation is checked at the top of every pass, between steps and
    /// during the pacing sleep. A request already in flight is allowed to
    /// finish. Failures never end the loop; a panicking pass is recorded as
    /// a crashed iteration and the next pass starts normally.
    pub async fn run(self, cancel: CancellationToken) -> RunnerStats {
        let mut stats = RunnerStats::new(self.id);
        stats.start();

        tracing::debug!(runner_id = self.id, "Virtual user started");

        let mut iteration: u64 = 0;
        loop {
            if cancel.is_cancelled() {
                tracing::debug!(runner_id = self.id, iteration, "Virtual user cancelled");
                break;
            }

            if self.max_iterations.is_some_and(|max| iteration >= max) {
                tracing::debug!(
                    runner_id = self.id,
                    iterations = iteration,
                    "Virtual user reached iteration cap"
                );
                break;
            }

            let mut progress = PassProgress::default();
            let result = AssertUnwindSafe(self.run_pass(iteration, &mut progress, &cancel))
                .catch_unwind()
                .await;

            let outcome = match result {
                Ok(outcome) => outcome,
                Err(payload) => {
                    self.record_crash(iteration, &mut progress, payload);
                    PassOutcome::Crashed
                }
            };

            stats.record_requests(progress.requests, progress.failed_requests);
            stats.record_pass(outcome);

            if outcome == PassOutcome::Interrupted {
                break;
            }
            iteration += 1;

            let delay = self.pacing.next_delay();
            if delay.is_zero() {
                // Keep instantly-ready clients from starving other tasks
                tokio::task::yield_now().await;
            } else {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        tracing::debug!(runner_id = self.id, iteration, "Cancelled during pacing");
                        break;
                    }
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        }

        stats.stop();
        tracing::debug!(
            runner_id = self.id,
            iterations = stats.iterations(),
            requests = stats.requests,
            failed_requests = stats.failed_requests,
            elapsed_ms = ?stats.elapsed().map(|d| d.as_millis()),
            "Virtual user finished"
        );

        stats
    }

    /// One full traversal of the scenario with fresh bindings
    async fn run_pass(
        &self,
        iteration: u64,
        progress: &mut PassProgress,
        cancel: &CancellationToken,
    ) -> PassOutcome {
        let mut bindings = self.scenario.variables.clone();
        bindings.insert(VU_BINDING.to_string(), self.id.to_string());
        bindings.insert(ITERATION_BINDING.to_string(), iteration.to_string());

        let mut failed = false;
        for (index, step) in self.scenario.steps.iter().enumerate() {
            if index > 0 && cancel.is_cancelled() {
                return PassOutcome::Interrupted;
            }

            match self
                .execute_step(iteration, step, &mut bindings, progress, cancel)
                .await
            {
                StepOutcome::Succeeded => {}
                StepOutcome::Failed => failed = true,
                StepOutcome::Interrupted => return PassOutcome::Interrupted,
            }
        }

        if failed {
            PassOutcome::Failed
        } else {
            PassOutcome::Succeeded
        }
    }

    async fn execute_step(
        &self,
        iteration: u64,
        step: &ScenarioStep,
        bindings: &mut Bindings,
        progress: &mut PassProgress,
        cancel: &CancellationToken,
    ) -> StepOutcome {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return StepOutcome::Interrupted,
            _ = self.rate_limiter.wait() => {}
        }

        let timestamp_start = chrono::Utc::now();
        let method = step.request.method();

        let rendered = match step.request.render(bindings) {
            Ok(rendered) => rendered,
            Err(e) => {
                self.emit(
                    progress,
                    RequestResult {
                        runner_id: self.id,
                        iteration,
                        step: step.name.clone(),
                        method,
                        url: step.request.url_template().to_string(),
                        timestamp_start,
                        latency: Duration::ZERO,
                        status_code: 0,
                        success: false,
                        error: Some(RequestFailure::new(ErrorKind::MissingBinding, e.to_string())),
                        captured: BTreeMap::new(),
                    },
                );
                return StepOutcome::Failed;
            }
        };

        let started = Instant::now();
        progress.in_flight = Some(InFlight {
            step: step.name.clone(),
            method,
            url: rendered.url.clone(),
            timestamp_start,
            started,
        });

        let response =
            match tokio::time::timeout(self.request_timeout, self.client.execute(&rendered)).await
            {
                Ok(response) => response,
                Err(_) => Err(TransportError::Timeout(self.request_timeout)),
            };
        let latency = started.elapsed();
        progress.in_flight = None;

        let (status_code, error, captured) = match response {
            Ok(response) => {
                let (error, captured) = evaluate(step, &response);
                (response.status, error, captured)
            }
            Err(e) => (
                0,
                Some(RequestFailure::new(e.to_error_kind(), e.to_string())),
                BTreeMap::new(),
            ),
        };

        for (name, value) in &captured {
            bindings.insert(name.clone(), value.clone());
        }

        let success = error.is_none();
        if let Some(failure) = &error {
            tracing::debug!(
                runner_id = self.id,
                iteration,
                step = %step.name,
                status = status_code,
                kind = %failure.kind,
                error = %failure.message,
                "Request failed"
            );
        }

        self.emit(
            progress,
            RequestResult {
                runner_id: self.id,
                iteration,
                step: step.name.clone(),
                method,
                url: rendered.url,
                timestamp_start,
                latency,
                status_code,
                success,
                error,
                captured,
            },
        );

        if success {
            StepOutcome::Succeeded
        } else {
            StepOutcome::Failed
        }
    }

    fn emit(&self, progress: &mut PassProgress, result: RequestResult) {
        progress.requests += 1;
        if !result.success {
            progress.failed_requests += 1;
        }
        self.collector.record(result);
    }

    fn record_crash(
        &self,
        iteration: u64,
        progress: &mut PassProgress,
        payload: Box<dyn Any + Send>,
    ) {
        let message = panic_message(payload.as_ref());
        tracing::error!(
            runner_id = self.id,
            iteration,
            panic = %message,
            "Iteration crashed"
        );

        let failure = RequestFailure::new(
            ErrorKind::Crashed,
            format!("iteration panicked: {message}"),
        );
        let result = match progress.in_flight.take() {
            Some(in_flight) => RequestResult {
                runner_id: self.id,
                iteration,
                step: in_flight.step,
                method: in_flight.method,
                url: in_flight.url,
                timestamp_start: in_flight.timestamp_start,
                latency: in_flight.started.elapsed(),
                status_code: 0,
                success: false,
                error: Some(failure),
                captured: BTreeMap::new(),
            },
            // Panicked outside a request; attribute it to the scenario
            None => RequestResult {
                runner_id: self.id,
                iteration,
                step: self.scenario.name.clone(),
                method: self
                    .scenario
                    .steps
                    .first()
                    .map(|s| s.request.method())
                    .unwrap_or(HttpMethod::Get),
                url: String::new(),
                timestamp_start: chrono::Utc::now(),
                latency: Duration::ZERO,
                status_code: 0,
                success: false,
                error: Some(failure),
                captured: BTreeMap::new(),
            },
        };
        self.emit(progress, result);
    }
}

/// Expectations first, then the status, then extractions
///
/// Extractions run even after a failure so later steps can still render
/// when the value is present.
fn evaluate(
    step: &ScenarioStep,
    response: &HttpResponse,
) -> (Option<RequestFailure>, BTreeMap<String, String>) {
    let mut failure = step
        .expectations
        .iter()
        .find_map(|check| check.check(response).err())
        .map(|message| RequestFailure::new(ErrorKind::Expectation, message));

    if failure.is_none() && !response.is_success_status() {
        failure = Some(RequestFailure::new(
            ErrorKind::HttpStatus,
            format!("unexpected status {}", response.status),
        ));
    }

    let mut captured = BTreeMap::new();
    for extraction in &step.extractions {
        match extraction.apply(response) {
            Ok(value) => {
                captured.insert(extraction.variable.clone(), value);
            }
            Err(message) => {
                if failure.is_none() {
                    failure = Some(RequestFailure::new(ErrorKind::Extraction, message));
                }
            }
        }
    }

    (failure, captured)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

impl std::fmt::Debug for VirtualUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VirtualUser")
            .field("id", &self.id)
            .field("scenario", &self.scenario.name)
            .field("client", &self.client.name())
            .field("rate_limiter", &self.rate_limiter)
            .field("pacing", &self.pacing)
            .field("max_iterations", &self.max_iterations)
            .finish()
    }
}
