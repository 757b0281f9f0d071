//! Builder pattern for Scheduler construction

use std::sync::Arc;
use std::time::Duration;

use crate::error::{BenchError, BenchResult};
use crate::traits::ClientFactory;

use super::executor::Scheduler;

const DEFAULT_COLLECTOR_SHARDS: usize = 16;
const DEFAULT_RAMP_TICK: Duration = Duration::from_millis(100);

/// Builder for creating a Scheduler
///
/// # Example
///
/// ```ignore
/// let scheduler = SchedulerBuilder::new()
///     .client_factory(Arc::new(ReqwestClientFactory::new(ClientConfig::default())?))
///     .collector_shards(32)
///     .build()?;
/// ```
pub struct SchedulerBuilder {
    client_factory: Option<Arc<dyn ClientFactory>>,
    collector_shards: usize,
    retain_results: bool,
    ramp_tick: Duration,
}

impl SchedulerBuilder {
    /// Create a new scheduler builder with default settings
    pub fn new() -> Self {
        Self {
            client_factory: None,
            collector_shards: DEFAULT_COLLECTOR_SHARDS,
            retain_results: false,
            ramp_tick: DEFAULT_RAMP_TICK,
        }
    }

    /// Set the factory creating one HTTP client per virtual user
    pub fn client_factory(mut self, factory: Arc<dyn ClientFactory>) -> Self {
        self.client_factory = Some(factory);
        self
    }

    /// Upper bound on collector lock shards (capped at the virtual user count)
    pub fn collector_shards(mut self, shards: usize) -> Self {
        self.collector_shards = shards;
        self
    }

    /// Keep every raw request result in memory
    pub fn retain_results(mut self, retain: bool) -> Self {
        self.retain_results = retain;
        self
    }

    /// How often the supervisor checks duration, ramp targets and completion
    pub fn ramp_tick(mut self, tick: Duration) -> Self {
        self.ramp_tick = tick;
        self
    }

    /// Build the scheduler
    ///
    /// # Errors
    ///
    /// Returns an error if no client factory is set or the tick is zero.
    pub fn build(self) -> BenchResult<Scheduler> {
        let client_factory = self
            .client_factory
            .ok_or_else(|| BenchError::missing_config("client_factory"))?;

        if self.ramp_tick.is_zero() {
            return Err(BenchError::invalid_config("ramp tick must be positive"));
        }

        Ok(Scheduler {
            client_factory,
            collector_shards: self.collector_shards.max(1),
            retain_results: self.retain_results,
            ramp_tick: self.ramp_tick,
        })
    }
}

impl Default for SchedulerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
