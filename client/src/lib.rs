//! HTTP transport for taskbench virtual users
//!
//! This crate provides the reqwest implementation of the
//! [`HttpClient`](taskbench_core::HttpClient) and
//! [`ClientFactory`](taskbench_core::ClientFactory) traits.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod reqwest_client;

pub use config::{ClientConfig, ClientConfigError};
pub use reqwest_client::{ReqwestClient, ReqwestClientFactory};
