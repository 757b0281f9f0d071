//! Core traits for HTTP clients
//!
//! These traits are defined in core to avoid circular dependencies.
//! The reqwest implementation lives in the client crate.

use crate::response::HttpResponse;
use crate::template::RenderedRequest;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// HTTP Client Trait
// ============================================================================

/// Issues rendered requests on behalf of one virtual user
///
/// Implementations own their connection pool. The runner never shares a
/// client with another runner.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Client identifier (e.g., "reqwest")
    fn name(&self) -> &str;

    /// Send the request and read the full response body
    ///
    /// Any status code is a successful transport; only network-level
    /// problems are errors.
    async fn execute(&self, request: &RenderedRequest) -> Result<HttpResponse, TransportError>;
}

/// Creates one [`HttpClient`] per virtual user
pub trait ClientFactory: Send + Sync {
    /// Factory identifier
    fn name(&self) -> &str;

    /// Create the client used by runner `runner_id`
    fn create(&self, runner_id: usize) -> Result<Arc<dyn HttpClient>, TransportError>;
}

/// Transport-level errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransportError {
    /// Connection could not be established
    #[error("Connection failed: {0}")]
    Connect(String),

    /// Request timeout
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Request could not be sent or the exchange broke off
    #[error("Request failed: {0}")]
    Request(String),

    /// Response body could not be read
    #[error("Failed to read body: {0}")]
    Body(String),

    /// Client configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl TransportError {
    /// Convert to ErrorKind for metrics/error classification
    pub fn to_error_kind(&self) -> crate::ErrorKind {
        match self {
            TransportError::Timeout(_) => crate::ErrorKind::Timeout,
            TransportError::Connect(_)
            | TransportError::Request(_)
            | TransportError::Body(_)
            | TransportError::Config(_) => crate::ErrorKind::Transport,
        }
    }
}
