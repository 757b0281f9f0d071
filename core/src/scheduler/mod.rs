//! Scheduler for run lifecycle management
//!
//! The Scheduler coordinates a complete load run:
//! - Validating the run config and scenario
//! - Spawning one virtual user task per simulated client
//! - Following ramp stages by spawning or retiring virtual users
//! - Stopping everything at duration expiry, with a grace period
//! - Producing the final [`RunReport`](crate::RunReport)
//!
//! # Example
//!
//! ```ignore
//! use taskbench_core::{RunConfig, SchedulerBuilder};
//!
//! let scheduler = SchedulerBuilder::new()
//!     .client_factory(factory)
//!     .build()?;
//!
//! let report = scheduler
//!     .run_with_signal_handling(RunConfig::new(100, Duration::from_secs(30)), scenario)
//!     .await?;
//! ```

mod aggregator;
mod builder;
mod executor;
mod ramp;

pub use aggregator::{aggregate_runner_stats, RunnerSummary};
pub use builder::SchedulerBuilder;
pub use executor::{RunningTest, Scheduler};
pub use ramp::{stages_duration, target_at};
