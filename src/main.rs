//! taskbench - load generator for the task-management API
//!
//! Runs the add-and-get workload with 100 virtual users for 30 seconds
//! against `http://localhost:8000` and prints the summary. Ctrl+C stops the
//! run early and still prints what was recorded.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use taskbench_client::{ClientConfig, ReqwestClientFactory};
use taskbench_core::{RunConfig, SchedulerBuilder};
use taskbench_report::{log_summary, TextReport};
use taskbench_scenarios::{build_scenario, ScenarioKind, TaskApiTarget};

const VIRTUAL_USERS: usize = 100;
const DURATION: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("taskbench starting...");

    let target = TaskApiTarget::new("http://localhost:8000");
    let scenario = build_scenario(ScenarioKind::AddAndGet, &target)
        .context("Failed to build scenario")?;

    let factory = ReqwestClientFactory::new(ClientConfig::default())
        .context("Invalid HTTP client configuration")?;
    let scheduler = SchedulerBuilder::new()
        .client_factory(Arc::new(factory))
        .build()?;

    let config = RunConfig::new(VIRTUAL_USERS, DURATION);
    let report = scheduler.run_with_signal_handling(config, scenario).await?;

    log_summary(&report);
    println!("{}", TextReport::render(&report));

    Ok(())
}
