//! Run configuration types

use crate::pacing::Pacing;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A ramp stage: move linearly to `target` virtual users over `duration`
///
/// A zero `duration` jumps to `target` immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    /// How long the ramp towards `target` lasts
    #[serde(with = "humantime_serde")]
    pub duration: Duration,
    /// Number of active virtual users at the end of the stage
    pub target: usize,
}

impl Stage {
    /// Create a new stage
    pub fn new(duration: Duration, target: usize) -> Self {
        Self { duration, target }
    }
}

/// Run configuration
///
/// Defines how many virtual users execute the scenario, for how long, and
/// how each of them paces its iterations. Read-only once the run starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Number of concurrent virtual users (peak pool size when ramping)
    pub virtual_users: usize,

    /// Total run duration
    #[serde(with = "humantime_serde")]
    pub duration: Duration,

    /// Delay between two scenario passes of the same virtual user
    #[serde(default)]
    pub pacing: Pacing,

    /// Optional ramp stages; empty means a constant `virtual_users`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stages: Vec<Stage>,

    /// Stop each virtual user after this many scenario passes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_iterations: Option<u64>,

    /// Per-request timeout
    #[serde(default = "default_request_timeout", with = "humantime_serde")]
    pub request_timeout: Duration,

    /// How long `stop` waits for runners before aborting them
    #[serde(default = "default_grace_period", with = "humantime_serde")]
    pub grace_period: Duration,

    /// Optional global rate limit (requests per second, all runners)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<f64>,
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(60)
}

fn default_grace_period() -> Duration {
    Duration::from_secs(30)
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            virtual_users: 1,
            duration: Duration::from_secs(30),
            pacing: Pacing::default(),
            stages: Vec::new(),
            max_iterations: None,
            request_timeout: default_request_timeout(),
            grace_period: default_grace_period(),
            rate_limit: None,
        }
    }
}

impl RunConfig {
    /// Create a constant-load config
    pub fn new(virtual_users: usize, duration: Duration) -> Self {
        Self {
            virtual_users,
            duration,
            ..Default::default()
        }
    }

    /// Set the pacing between iterations
    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    /// Set ramp stages
    pub fn with_stages(mut self, stages: Vec<Stage>) -> Self {
        self.stages = stages;
        self
    }

    /// Cap the number of scenario passes per virtual user
    pub fn with_max_iterations(mut self, iterations: u64) -> Self {
        self.max_iterations = Some(iterations);
        self
    }

    /// Set the per-request timeout
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the shutdown grace period
    pub fn with_grace_period(mut self, grace: Duration) -> Self {
        self.grace_period = grace;
        self
    }

    /// Set the global rate limit
    pub fn with_rate_limit(mut self, rps: f64) -> Self {
        self.rate_limit = Some(rps);
        self
    }

    /// Whether the virtual user count follows ramp stages
    pub fn is_ramping(&self) -> bool {
        !self.stages.is_empty()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.virtual_users == 0 {
            return Err(ConfigError::InvalidVirtualUsers);
        }

        if self.duration.is_zero() {
            return Err(ConfigError::InvalidDuration);
        }

        for (index, stage) in self.stages.iter().enumerate() {
            if stage.target > self.virtual_users {
                return Err(ConfigError::InvalidStage {
                    index,
                    reason: format!(
                        "target {} exceeds virtual users {}",
                        stage.target, self.virtual_users
                    ),
                });
            }
        }

        if self.max_iterations == Some(0) {
            return Err(ConfigError::InvalidIterations);
        }

        if self.request_timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout(
                "request timeout must be positive".into(),
            ));
        }

        if let Some(rps) = self.rate_limit {
            if !(rps > 0.0 && rps.is_finite()) {
                return Err(ConfigError::InvalidRateLimit(rps));
            }
        }

        self.pacing.validate().map_err(ConfigError::InvalidPacing)?;

        Ok(())
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// Zero virtual users
    #[error("virtual users must be at least 1")]
    InvalidVirtualUsers,

    /// Zero duration
    #[error("duration must be greater than zero")]
    InvalidDuration,

    /// A ramp stage is out of range
    #[error("invalid stage {index}: {reason}")]
    InvalidStage {
        /// Position of the stage
        index: usize,
        /// What is wrong with it
        reason: String,
    },

    /// `max_iterations` set to zero
    #[error("max iterations must be at least 1")]
    InvalidIterations,

    /// Invalid timeout
    #[error("invalid timeout: {0}")]
    InvalidTimeout(String),

    /// Non-positive rate limit
    #[error("rate limit must be positive, got {0}")]
    InvalidRateLimit(f64),

    /// Invalid pacing parameters
    #[error("invalid pacing: {0}")]
    InvalidPacing(String),

    /// Scenario without steps or otherwise unusable
    #[error("invalid scenario: {0}")]
    InvalidScenario(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RunConfig::default();
        assert_eq!(config.virtual_users, 1);
        assert_eq!(config.duration, Duration::from_secs(30));
        assert_eq!(config.pacing, Pacing::None);
        assert!(config.stages.is_empty());
        assert!(config.rate_limit.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder_pattern() {
        let config = RunConfig::new(100, Duration::from_secs(30))
            .with_pacing(Pacing::fixed(Duration::from_millis(500)))
            .with_max_iterations(3)
            .with_grace_period(Duration::from_secs(5))
            .with_rate_limit(200.0);

        assert_eq!(config.virtual_users, 100);
        assert_eq!(config.max_iterations, Some(3));
        assert_eq!(config.grace_period, Duration::from_secs(5));
        assert_eq!(config.rate_limit, Some(200.0));
        assert!(!config.is_ramping());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_virtual_users_rejected() {
        let config = RunConfig::new(0, Duration::from_secs(1));
        assert_eq!(config.validate(), Err(ConfigError::InvalidVirtualUsers));
    }

    #[test]
    fn test_zero_duration_rejected() {
        let config = RunConfig::new(1, Duration::ZERO);
        assert_eq!(config.validate(), Err(ConfigError::InvalidDuration));
    }

    #[test]
    fn test_stage_above_pool_rejected() {
        let config = RunConfig::new(5, Duration::from_secs(10)).with_stages(vec![
            Stage::new(Duration::from_secs(2), 5),
            Stage::new(Duration::from_secs(2), 6),
        ]);

        match config.validate() {
            Err(ConfigError::InvalidStage { index, .. }) => assert_eq!(index, 1),
            other => panic!("expected InvalidStage, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_iterations_rejected() {
        let config = RunConfig::new(1, Duration::from_secs(1)).with_max_iterations(0);
        assert_eq!(config.validate(), Err(ConfigError::InvalidIterations));
    }

    #[test]
    fn test_negative_rate_limit_rejected() {
        let config = RunConfig::new(1, Duration::from_secs(1)).with_rate_limit(-10.0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidRateLimit(_))
        ));
    }

    #[test]
    fn test_invalid_pacing_rejected() {
        let config = RunConfig::new(1, Duration::from_secs(1)).with_pacing(Pacing::Uniform {
            min: Duration::from_millis(200),
            max: Duration::from_millis(100),
        });
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidPacing(_))
        ));
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let json = r#"{"virtual_users": 10, "duration": "5s"}"#;
        let config: RunConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.virtual_users, 10);
        assert_eq!(config.duration, Duration::from_secs(5));
        assert_eq!(config.request_timeout, Duration::from_secs(60));
        assert_eq!(config.grace_period, Duration::from_secs(30));
        assert_eq!(config.pacing, Pacing::None);
    }

    #[test]
    fn test_config_durations_human_readable() {
        let config = RunConfig::new(2, Duration::from_secs(90))
            .with_stages(vec![Stage::new(Duration::from_millis(1500), 2)])
            .with_grace_period(Duration::from_secs(5));

        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(value["duration"], "1m 30s");
        assert_eq!(value["request_timeout"], "1m");
        assert_eq!(value["grace_period"], "5s");
        assert_eq!(value["stages"][0]["duration"], "1s 500ms");

        let parsed: RunConfig = serde_json::from_value(value).unwrap();
        assert_eq!(parsed.duration, Duration::from_secs(90));
        assert_eq!(parsed.stages, config.stages);
    }
}
