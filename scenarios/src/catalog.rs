//! Task API scenarios

use serde::{Deserialize, Serialize};
use taskbench_core::{Expectation, Extraction, RequestTemplate, Scenario, ScenarioStep};
use thiserror::Error;

use crate::payload::TaskPayload;

const TASK_PATH: &str = "/api/v1/task";
const TASKS_PATH: &str = "/api/v1/tasks";

/// Scenario building errors
#[derive(Debug, Error)]
pub enum ScenarioError {
    /// Base URL is empty or not http(s)
    #[error("invalid base URL `{0}`: expected http:// or https://")]
    InvalidBaseUrl(String),

    /// The payload could not be serialized
    #[error("failed to serialize task payload: {0}")]
    Payload(#[from] serde_json::Error),
}

// ============================================================================
// Scenario kind
// ============================================================================

/// Which task API workload to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioKind {
    /// Create a task, then fetch it by id
    AddAndGet,
    /// Create a task
    AddOnly,
    /// List every task
    ListAll,
}

impl ScenarioKind {
    /// Identifier used in configuration
    pub fn id(&self) -> &'static str {
        match self {
            ScenarioKind::AddAndGet => "add_and_get",
            ScenarioKind::AddOnly => "add_only",
            ScenarioKind::ListAll => "list_all",
        }
    }

    /// Scenario name shown in reports
    pub fn display_name(&self) -> &'static str {
        match self {
            ScenarioKind::AddAndGet => "simple add task and query",
            ScenarioKind::AddOnly => "add task",
            ScenarioKind::ListAll => "list all tasks",
        }
    }

    /// Every known kind
    pub fn all() -> &'static [ScenarioKind] {
        &[
            ScenarioKind::AddAndGet,
            ScenarioKind::AddOnly,
            ScenarioKind::ListAll,
        ]
    }
}

impl std::fmt::Display for ScenarioKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

impl std::str::FromStr for ScenarioKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "add_and_get" | "add-and-get" | "addandget" => Ok(ScenarioKind::AddAndGet),
            "add_only" | "add-only" | "add" => Ok(ScenarioKind::AddOnly),
            "list_all" | "list-all" | "list" => Ok(ScenarioKind::ListAll),
            _ => Err(format!("Unknown scenario: {}", s)),
        }
    }
}

// ============================================================================
// Target
// ============================================================================

/// Where the task service lives and what to send it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskApiTarget {
    /// Base URL for creating and fetching tasks
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Base URL for listing tasks (may be a different instance)
    #[serde(default = "default_list_base_url")]
    pub list_base_url: String,

    /// Body of every created task
    #[serde(default)]
    pub payload: TaskPayload,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_list_base_url() -> String {
    "http://localhost:8081".to_string()
}

impl Default for TaskApiTarget {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            list_base_url: default_list_base_url(),
            payload: TaskPayload::default(),
        }
    }
}

impl TaskApiTarget {
    /// Target with one base URL for every endpoint
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            list_base_url: base_url.clone(),
            base_url,
            payload: TaskPayload::default(),
        }
    }

    /// Set the listing base URL
    pub fn with_list_base_url(mut self, url: impl Into<String>) -> Self {
        self.list_base_url = url.into();
        self
    }

    /// Set the task payload
    pub fn with_payload(mut self, payload: TaskPayload) -> Self {
        self.payload = payload;
        self
    }

    /// Validate both base URLs
    pub fn validate(&self) -> Result<(), ScenarioError> {
        for url in [&self.base_url, &self.list_base_url] {
            check_base_url(url)?;
        }
        Ok(())
    }
}

fn check_base_url(url: &str) -> Result<(), ScenarioError> {
    let rest = url
        .strip_prefix("http://")
        .or_else(|| url.strip_prefix("https://"))
        .ok_or_else(|| ScenarioError::InvalidBaseUrl(url.to_string()))?;
    if rest.trim_end_matches('/').is_empty() {
        return Err(ScenarioError::InvalidBaseUrl(url.to_string()));
    }
    Ok(())
}

// ============================================================================
// Builders
// ============================================================================

/// Build the scenario for `kind` against `target`
///
/// Base URLs are bound as the `base_url` and `list_base_url` variables, so
/// the same scenario can be re-pointed by changing the variables.
pub fn build_scenario(
    kind: ScenarioKind,
    target: &TaskApiTarget,
) -> Result<Scenario, ScenarioError> {
    target.validate()?;

    let scenario = Scenario::new(kind.display_name())
        .variable("base_url", target.base_url.trim_end_matches('/'))
        .variable("list_base_url", target.list_base_url.trim_end_matches('/'));

    let scenario = match kind {
        ScenarioKind::AddAndGet => scenario
            .step(add_task_step(&target.payload)?.extract(Extraction::json("id", "id")))
            .step(ScenarioStep::new(
                "get task",
                RequestTemplate::get(format!("{{{{base_url}}}}{TASK_PATH}/{{{{id}}}}"))
                    .header("Content-Type", "application/json"),
            )),
        ScenarioKind::AddOnly => scenario.step(add_task_step(&target.payload)?),
        ScenarioKind::ListAll => scenario.step(
            ScenarioStep::new(
                "list tasks",
                RequestTemplate::get(format!("{{{{list_base_url}}}}{TASKS_PATH}")),
            )
            .expect(Expectation::status(200)),
        ),
    };

    Ok(scenario)
}

fn add_task_step(payload: &TaskPayload) -> Result<ScenarioStep, ScenarioError> {
    let request = RequestTemplate::post(format!("{{{{base_url}}}}{TASK_PATH}")).json_body(payload)?;

    Ok(ScenarioStep::new("add task", request)
        .expect(Expectation::status(200))
        .expect(Expectation::json_field("id")))
}
