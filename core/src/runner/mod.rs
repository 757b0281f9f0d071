//! Virtual users executing a scenario in a loop
//!
//! A [`VirtualUser`] simulates one client of the target API. Each pass over
//! the scenario:
//!
//! 1. Starts from the scenario's static variables plus `__vu` / `__iter`
//! 2. For each step, waits on the shared rate limiter and renders the request
//! 3. Issues it through the user's own [`HttpClient`](crate::HttpClient)
//! 4. Applies expectations and extractions, binding captured values
//! 5. Hands a [`RequestResult`](crate::RequestResult) to the collector
//!
//! then sleeps for the pacing delay and starts over until cancelled.
//!
//! # Example
//!
//! ```ignore
//! use taskbench_core::runner::VirtualUserBuilder;
//! use tokio_util::sync::CancellationToken;
//!
//! let user = VirtualUserBuilder::new(0)
//!     .scenario(scenario)
//!     .client(client)
//!     .collector(collector)
//!     .run_config(&config)
//!     .build()?;
//!
//! let stats = user.run(CancellationToken::new()).await;
//! println!("Iterations: {}", stats.iterations());
//! ```

mod builder;
mod executor;
mod rate_limiter;
mod stats;

pub use builder::VirtualUserBuilder;
pub use executor::VirtualUser;
pub use rate_limiter::RequestRateLimiter;
pub use stats::{PassOutcome, RunnerStats};
