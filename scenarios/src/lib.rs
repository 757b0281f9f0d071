//! Scenario catalog for the task-management API
//!
//! This crate builds [`Scenario`](taskbench_core::Scenario)s for the task
//! service endpoints:
//!
//! - `add_and_get`: create a task, then fetch it by the returned id
//! - `add_only`: create a task
//! - `list_all`: list every task

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod catalog;
pub mod payload;

pub use catalog::{build_scenario, ScenarioError, ScenarioKind, TaskApiTarget};
pub use payload::TaskPayload;
