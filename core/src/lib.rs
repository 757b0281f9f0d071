//! taskbench-core: load-generation engine for HTTP APIs
//!
//! This crate provides everything needed to drive a scripted HTTP workload
//! from many concurrent virtual users:
//!
//! - Request templates with `{{name}}` placeholders
//! - Scenarios: ordered steps with captures and response checks
//! - Virtual user runners with pacing and cooperative cancellation
//! - The scheduler owning the run lifecycle (ramping, grace period)
//! - A lock-sharded result collector and aggregate statistics
//!
//! The HTTP transport itself is abstracted behind [`HttpClient`] and
//! [`ClientFactory`]; see the `taskbench-client` crate for the reqwest one.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod collector;
pub mod config;
pub mod error;
pub mod metrics;
pub mod outcome;
pub mod pacing;
pub mod response;
pub mod runner;
pub mod scenario;
pub mod scheduler;
pub mod template;
pub mod traits;

#[cfg(test)]
mod test_support;

pub use collector::*;
pub use config::*;
pub use error::*;
pub use metrics::*;
pub use outcome::*;
pub use pacing::*;
pub use response::*;
pub use runner::{PassOutcome, RequestRateLimiter, RunnerStats, VirtualUser, VirtualUserBuilder};
pub use scenario::*;
pub use scheduler::{RunnerSummary, RunningTest, Scheduler, SchedulerBuilder};
pub use template::*;
pub use traits::*;

#[cfg(test)]
mod integration_tests {
    use super::*;
    use std::time::Duration;

    // =========================================================================
    // JSON format tests
    // =========================================================================

    #[test]
    fn test_error_kind_snake_case_serialization() {
        assert_eq!(
            serde_json::to_string(&ErrorKind::MissingBinding).unwrap(),
            "\"missing_binding\""
        );
        assert_eq!(
            serde_json::to_string(&ErrorKind::HttpStatus).unwrap(),
            "\"http_status\""
        );
    }

    #[test]
    fn test_stop_reason_serialization() {
        assert_eq!(
            serde_json::to_string(&StopReason::DurationElapsed).unwrap(),
            "\"duration_elapsed\""
        );
        assert_eq!(StopReason::IterationsCompleted.to_string(), "iterations completed");
    }

    #[test]
    fn test_scenario_from_json() {
        let json = r#"{
            "name": "add and get",
            "variables": {"base_url": "http://localhost:8000"},
            "steps": [
                {
                    "name": "add task",
                    "request": {
                        "method": "POST",
                        "url_template": "{{base_url}}/api/v1/task",
                        "body_template": "{\"title\":\"t\"}"
                    },
                    "extractions": [
                        {"variable": "id", "source": {"from": "json_pointer", "pointer": "id"}}
                    ],
                    "expectations": [
                        {"kind": "status", "code": 200},
                        {"kind": "json_field", "pointer": "id"}
                    ]
                },
                {
                    "name": "get task",
                    "request": {"method": "GET", "url_template": "{{base_url}}/api/v1/task/{{id}}"}
                }
            ]
        }"#;

        let scenario: Scenario = serde_json::from_str(json).unwrap();

        assert_eq!(scenario.steps.len(), 2);
        assert_eq!(scenario.steps[0].request.method(), HttpMethod::Post);
        assert_eq!(scenario.steps[0].extractions[0], Extraction::json("id", "id"));
        assert_eq!(scenario.steps[0].expectations[0], Expectation::status(200));
        assert_eq!(scenario.steps[0].expectations[1], Expectation::json_field("/id"));

        let created = HttpResponse::new(200, r#"{"id": 42}"#);
        assert!(scenario.steps[0].expectations[1].check(&created).is_ok());
        assert_eq!(
            scenario.steps[0].extractions[0].apply(&created),
            Ok("42".to_string())
        );
        assert!(scenario.validate().is_ok());
        assert!(scenario.unresolved_placeholders().is_empty());
    }

    #[test]
    fn test_error_counts_serialize_as_object() {
        let mut stats = AggregateStats::default();
        stats.errors.insert(ErrorKind::Timeout, 3);
        stats.status_codes.insert(200, 10);

        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["errors"]["timeout"], 3);
        assert_eq!(json["status_codes"]["200"], 10);

        let back: AggregateStats = serde_json::from_value(json).unwrap();
        assert_eq!(back.errors[&ErrorKind::Timeout], 3);
    }

    // =========================================================================
    // Cross-module behavior
    // =========================================================================

    #[test]
    fn test_render_then_record() {
        let template = RequestTemplate::get("{{base_url}}/api/v1/task/{{id}}");
        let mut bindings = Bindings::new();
        bindings.insert("base_url".into(), "http://localhost:8000".into());

        let err = template.render(&bindings).unwrap_err();
        assert_eq!(err, TemplateError::MissingBinding { name: "id".into() });

        let collector = ResultCollector::new(2);
        collector.record(RequestResult {
            runner_id: 0,
            iteration: 0,
            step: "get task".into(),
            method: template.method(),
            url: template.url_template().to_string(),
            timestamp_start: chrono::Utc::now(),
            latency: Duration::ZERO,
            status_code: 0,
            success: false,
            error: Some(RequestFailure::new(ErrorKind::MissingBinding, err.to_string())),
            captured: Default::default(),
        });

        let stats = collector.snapshot();
        assert_eq!(stats.failure_count, 1);
        assert_eq!(stats.errors[&ErrorKind::MissingBinding], 1);
        assert_eq!(stats.status_codes[&0], 1);
    }

    #[test]
    fn test_config_error_converts_to_invalid_config() {
        let err: BenchError = RunConfig::new(0, Duration::from_secs(1))
            .validate()
            .unwrap_err()
            .into();
        assert!(err.is_invalid_config());
    }
}
