//! HTTP client configuration

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration validation error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClientConfigError {
    /// A timeout value is out of acceptable range.
    #[error("invalid timeout: {0:?}")]
    InvalidTimeout(Duration),

    /// A default header has an empty name.
    #[error("header name must not be empty")]
    EmptyHeaderName,
}

/// Settings shared by every client the factory creates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Transport-level timeout for the whole exchange
    #[serde(default = "default_timeout")]
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,

    /// Connection timeout
    #[serde(default = "default_connect_timeout")]
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,

    /// Idle connections kept per host
    #[serde(default = "default_pool_max_idle_per_host")]
    pub pool_max_idle_per_host: usize,

    /// `User-Agent` header
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Headers added to every request unless the request sets them
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub default_headers: BTreeMap<String, String>,
}

fn default_timeout() -> Duration {
    Duration::from_secs(60)
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_pool_max_idle_per_host() -> usize {
    8
}

fn default_user_agent() -> String {
    format!("taskbench/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            connect_timeout: default_connect_timeout(),
            pool_max_idle_per_host: default_pool_max_idle_per_host(),
            user_agent: default_user_agent(),
            default_headers: BTreeMap::new(),
        }
    }
}

impl ClientConfig {
    /// Set the transport timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the connection timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the idle pool size per host.
    pub fn with_pool_max_idle_per_host(mut self, max: usize) -> Self {
        self.pool_max_idle_per_host = max;
        self
    }

    /// Set the user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Add a default header.
    pub fn with_default_header(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.default_headers.insert(name.into(), value.into());
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ClientConfigError> {
        // 1ms to 1h for the exchange, 1ms to 5m for connect
        if self.timeout.is_zero() || self.timeout > Duration::from_secs(3600) {
            return Err(ClientConfigError::InvalidTimeout(self.timeout));
        }
        if self.connect_timeout.is_zero() || self.connect_timeout > Duration::from_secs(300) {
            return Err(ClientConfigError::InvalidTimeout(self.connect_timeout));
        }

        if self.default_headers.keys().any(|name| name.trim().is_empty()) {
            return Err(ClientConfigError::EmptyHeaderName);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ClientConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert!(config.user_agent.starts_with("taskbench/"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = ClientConfig::default()
            .with_timeout(Duration::from_secs(5))
            .with_pool_max_idle_per_host(2)
            .with_default_header("Accept", "application/json");

        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.pool_max_idle_per_host, 2);
        assert_eq!(
            config.default_headers.get("Accept").map(String::as_str),
            Some("application/json")
        );
    }

    #[test]
    fn test_config_validate() {
        assert_eq!(
            ClientConfig::default()
                .with_timeout(Duration::ZERO)
                .validate(),
            Err(ClientConfigError::InvalidTimeout(Duration::ZERO))
        );
        assert!(ClientConfig::default()
            .with_connect_timeout(Duration::from_secs(600))
            .validate()
            .is_err());
        assert_eq!(
            ClientConfig::default()
                .with_default_header(" ", "x")
                .validate(),
            Err(ClientConfigError::EmptyHeaderName)
        );
    }

    #[test]
    fn test_config_humantime_serialization() {
        let json = r#"{"timeout": "5s", "connect_timeout": "500ms"}"#;
        let config: ClientConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.connect_timeout, Duration::from_millis(500));
        assert_eq!(config.pool_max_idle_per_host, 8);

        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"timeout\":\"5s\""));
    }
}
