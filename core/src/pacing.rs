//! Pacing between scenario iterations
//!
//! Pacing controls how long a virtual user sleeps after completing a full
//! pass over its scenario:
//! - **None**: start the next pass immediately
//! - **Fixed**: constant delay
//! - **Uniform**: delay sampled uniformly from `[min, max)`
//! - **Normal**: delay sampled from a normal distribution, clamped at zero

use rand_distr::{Distribution, Normal, Uniform};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Inter-iteration delay strategy
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Pacing {
    /// No delay
    #[default]
    None,
    /// Fixed delay
    Fixed {
        /// Delay after every pass
        #[serde(with = "humantime_serde")]
        interval: Duration,
    },
    /// Uniformly distributed delay
    Uniform {
        /// Lower bound (inclusive)
        #[serde(with = "humantime_serde")]
        min: Duration,
        /// Upper bound (exclusive)
        #[serde(with = "humantime_serde")]
        max: Duration,
    },
    /// Normally distributed delay
    Normal {
        /// Mean delay
        #[serde(with = "humantime_serde")]
        mean: Duration,
        /// Standard deviation
        #[serde(with = "humantime_serde")]
        std_dev: Duration,
    },
}

impl Pacing {
    /// Fixed delay between passes
    pub fn fixed(interval: Duration) -> Self {
        Pacing::Fixed { interval }
    }

    /// Uniformly sampled delay between passes
    pub fn uniform(min: Duration, max: Duration) -> Self {
        Pacing::Uniform { min, max }
    }

    /// Normally sampled delay between passes
    pub fn normal(mean: Duration, std_dev: Duration) -> Self {
        Pacing::Normal { mean, std_dev }
    }

    /// Strategy name
    pub fn name(&self) -> &'static str {
        match self {
            Pacing::None => "none",
            Pacing::Fixed { .. } => "fixed",
            Pacing::Uniform { .. } => "uniform",
            Pacing::Normal { .. } => "normal",
        }
    }

    /// Check parameters
    pub fn validate(&self) -> Result<(), String> {
        match self {
            Pacing::Uniform { min, max } if min > max => Err(format!(
                "uniform pacing min {min:?} is greater than max {max:?}"
            )),
            _ => Ok(()),
        }
    }

    /// Delay before the next pass
    pub fn next_delay(&self) -> Duration {
        match self {
            Pacing::None => Duration::ZERO,
            Pacing::Fixed { interval } => *interval,
            Pacing::Uniform { min, max } => {
                if min >= max {
                    return *min;
                }
                let distribution = Uniform::new(min.as_secs_f64(), max.as_secs_f64());
                Duration::from_secs_f64(distribution.sample(&mut rand::thread_rng()))
            }
            Pacing::Normal { mean, std_dev } => {
                match Normal::new(mean.as_secs_f64(), std_dev.as_secs_f64()) {
                    Ok(distribution) => {
                        let secs = distribution.sample(&mut rand::thread_rng()).max(0.0);
                        Duration::from_secs_f64(secs)
                    }
                    Err(_) => *mean,
                }
            }
        }
    }
}
