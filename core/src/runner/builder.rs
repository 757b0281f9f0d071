//! Builder pattern for VirtualUser construction

use crate::collector::ResultCollector;
use crate::config::RunConfig;
use crate::error::{BenchError, BenchResult};
use crate::pacing::Pacing;
use crate::scenario::Scenario;
use crate::traits::HttpClient;

use super::executor::VirtualUser;
use super::rate_limiter::RequestRateLimiter;

use std::sync::Arc;
use std::time::Duration;

/// Builder for creating VirtualUser instances
///
/// # Example
/// ```ignore
/// let user = VirtualUserBuilder::new(0)
///     .scenario(scenario)
///     .client(client)
///     .collector(collector)
///     .run_config(&config)
///     .build()?;
/// ```
pub struct VirtualUserBuilder {
    id: usize,
    scenario: Option<Arc<Scenario>>,
    client: Option<Arc<dyn HttpClient>>,
    collector: Option<Arc<ResultCollector>>,
    rate_limiter: Option<Arc<RequestRateLimiter>>,
    pacing: Pacing,
    request_timeout: Duration,
    max_iterations: Option<u64>,
}

impl VirtualUserBuilder {
    /// Create a new builder with the given virtual user id
    pub fn new(id: usize) -> Self {
        let defaults = RunConfig::default();
        Self {
            id,
            scenario: None,
            client: None,
            collector: None,
            rate_limiter: None,
            pacing: defaults.pacing,
            request_timeout: defaults.request_timeout,
            max_iterations: None,
        }
    }

    /// Set the scenario
    pub fn scenario(mut self, scenario: Arc<Scenario>) -> Self {
        self.scenario = Some(scenario);
        self
    }

    /// Set the HTTP client owned by this virtual user
    pub fn client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// Set the result collector
    pub fn collector(mut self, collector: Arc<ResultCollector>) -> Self {
        self.collector = Some(collector);
        self
    }

    /// Set the rate limiter shared with the other virtual users
    pub fn rate_limiter(mut self, limiter: Arc<RequestRateLimiter>) -> Self {
        self.rate_limiter = Some(limiter);
        self
    }

    /// Set the pacing between passes
    pub fn pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    /// Set the per-request timeout
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Cap the number of passes
    pub fn max_iterations(mut self, iterations: Option<u64>) -> Self {
        self.max_iterations = iterations;
        self
    }

    /// Take pacing, request timeout and iteration cap from a run config
    pub fn run_config(self, config: &RunConfig) -> Self {
        self.pacing(config.pacing.clone())
            .request_timeout(config.request_timeout)
            .max_iterations(config.max_iterations)
    }

    /// Build the VirtualUser
    ///
    /// # Errors
    /// Returns an error if the scenario, client or collector is missing.
    pub fn build(self) -> BenchResult<VirtualUser> {
        let scenario = self
            .scenario
            .ok_or_else(|| BenchError::missing_config("scenario"))?;
        let client = self
            .client
            .ok_or_else(|| BenchError::missing_config("client"))?;
        let collector = self
            .collector
            .ok_or_else(|| BenchError::missing_config("collector"))?;
        let rate_limiter = self
            .rate_limiter
            .unwrap_or_else(|| Arc::new(RequestRateLimiter::unlimited()));

        Ok(VirtualUser {
            id: self.id,
            scenario,
            client,
            collector,
            rate_limiter,
            pacing: self.pacing,
            request_timeout: self.request_timeout,
            max_iterations: self.max_iterations,
        })
    }
}
