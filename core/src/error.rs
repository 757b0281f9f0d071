//! Error types for taskbench-core
//!
//! Two layers of errors exist:
//!
//! - [`BenchError`] is fatal and only produced before any runner starts
//!   (invalid configuration, incomplete builders).
//! - [`ErrorKind`] classifies per-request failures. These never propagate;
//!   the runner folds them into a [`RequestResult`](crate::RequestResult).

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ConfigError;

/// Classification of a failed request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Connection refused, reset, DNS failure and other network errors
    Transport,
    /// The request did not complete within the request timeout
    Timeout,
    /// A template placeholder had no bound value
    MissingBinding,
    /// The response status was 400 or above
    HttpStatus,
    /// An expectation check on the response failed
    Expectation,
    /// A value could not be captured from the response
    Extraction,
    /// The iteration panicked
    Crashed,
}

impl ErrorKind {
    /// Stable identifier used in reports
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Transport => "transport",
            ErrorKind::Timeout => "timeout",
            ErrorKind::MissingBinding => "missing_binding",
            ErrorKind::HttpStatus => "http_status",
            ErrorKind::Expectation => "expectation",
            ErrorKind::Extraction => "extraction",
            ErrorKind::Crashed => "crashed",
        }
    }

    /// Whether the request never produced a response
    pub fn is_transport(&self) -> bool {
        matches!(self, ErrorKind::Transport | ErrorKind::Timeout)
    }

    /// Soft failures got a response that did not satisfy the step
    pub fn is_soft(&self) -> bool {
        matches!(
            self,
            ErrorKind::HttpStatus | ErrorKind::Expectation | ErrorKind::Extraction
        )
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category of a fatal [`BenchError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BenchErrorKind {
    /// The run configuration or scenario failed validation
    InvalidConfig,
    /// A builder was missing a required part
    MissingConfig,
    /// The run could not be started (e.g. client creation failed)
    Runtime,
}

impl std::fmt::Display for BenchErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BenchErrorKind::InvalidConfig => write!(f, "invalid config"),
            BenchErrorKind::MissingConfig => write!(f, "missing config"),
            BenchErrorKind::Runtime => write!(f, "runtime error"),
        }
    }
}

/// Fatal error that prevents a run from starting
#[derive(Debug, Clone, Error)]
#[error("{kind}: {message}")]
pub struct BenchError {
    /// Error category
    pub kind: BenchErrorKind,
    /// Human readable detail
    pub message: String,
}

impl BenchError {
    /// Create an error of the given kind
    pub fn new(kind: BenchErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Configuration failed validation
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::new(BenchErrorKind::InvalidConfig, message)
    }

    /// A builder field was never set
    pub fn missing_config(field: &str) -> Self {
        Self::new(
            BenchErrorKind::MissingConfig,
            format!("required field `{field}` was not set"),
        )
    }

    /// The run failed to start
    pub fn runtime(message: impl Into<String>) -> Self {
        Self::new(BenchErrorKind::Runtime, message)
    }

    /// Check whether this is an `InvalidConfig` error
    pub fn is_invalid_config(&self) -> bool {
        self.kind == BenchErrorKind::InvalidConfig
    }
}

impl From<ConfigError> for BenchError {
    fn from(err: ConfigError) -> Self {
        BenchError::invalid_config(err.to_string())
    }
}

/// Result type alias
pub type BenchResult<T> = std::result::Result<T, BenchError>;
