//! Global request rate cap

use governor::{clock::DefaultClock, state::InMemoryState, state::NotKeyed, Quota, RateLimiter};
use std::num::NonZeroU32;
use std::time::Duration;

/// Token bucket shared by every virtual user of a run
///
/// Wrap one instance in an `Arc` and hand it to all runners; the cap then
/// applies to the run as a whole.
pub struct RequestRateLimiter {
    limiter: Option<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
    rate_limit: Option<f64>,
}

impl RequestRateLimiter {
    /// Create a new rate limiter
    ///
    /// `None` or a non-positive rate disables limiting. Fractional rates are
    /// honored by spacing permits `1 / rps` seconds apart.
    ///
    /// # Examples
    /// ```
    /// use taskbench_core::runner::RequestRateLimiter;
    ///
    /// // One request every two seconds
    /// let limiter = RequestRateLimiter::new(Some(0.5));
    /// assert!(limiter.is_enabled());
    ///
    /// let unlimited = RequestRateLimiter::new(None);
    /// assert!(!unlimited.is_enabled());
    /// ```
    pub fn new(rate_limit: Option<f64>) -> Self {
        let limiter = rate_limit
            .and_then(quota_for)
            .map(RateLimiter::direct);

        Self {
            limiter,
            rate_limit,
        }
    }

    /// Create an unlimited rate limiter (no rate limiting)
    pub fn unlimited() -> Self {
        Self::new(None)
    }

    /// Wait until a request is allowed
    ///
    /// Returns immediately if no rate limit is configured.
    pub async fn wait(&self) {
        if let Some(ref limiter) = self.limiter {
            limiter.until_ready().await;
        }
    }

    /// Check if rate limiting is enabled
    pub fn is_enabled(&self) -> bool {
        self.limiter.is_some()
    }

    /// Get the configured rate limit (requests per second)
    pub fn rate_limit(&self) -> Option<f64> {
        self.rate_limit
    }
}

fn quota_for(rps: f64) -> Option<Quota> {
    if !(rps > 0.0 && rps.is_finite()) {
        return None;
    }

    // Sub-nanosecond periods round to zero; fall back to a per-second quota
    Quota::with_period(Duration::from_secs_f64(1.0 / rps))
        .or_else(|| NonZeroU32::new(rps.ceil().min(u32::MAX as f64) as u32).map(Quota::per_second))
}

impl Default for RequestRateLimiter {
    fn default() -> Self {
        Self::new(None)
    }
}

impl std::fmt::Debug for RequestRateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestRateLimiter")
            .field("rate_limit", &self.rate_limit)
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_rate_limiter_disabled() {
        let limiter = RequestRateLimiter::new(None);
        assert!(!limiter.is_enabled());
        assert!(limiter.rate_limit().is_none());
    }

    #[test]
    fn test_rate_limiter_rejects_invalid_rates() {
        assert!(!RequestRateLimiter::new(Some(0.0)).is_enabled());
        assert!(!RequestRateLimiter::new(Some(-10.0)).is_enabled());
        assert!(!RequestRateLimiter::new(Some(f64::NAN)).is_enabled());
    }

    #[tokio::test]
    async fn test_fractional_rate_enabled() {
        let limiter = RequestRateLimiter::new(Some(0.5));
        assert!(limiter.is_enabled());
        limiter.wait().await;
        // Next permit is two seconds away
        let second = tokio::time::timeout(Duration::from_millis(100), limiter.wait()).await;
        assert!(second.is_err());
    }

    #[tokio::test]
    async fn test_rate_limiter_spaces_requests() {
        let limiter = RequestRateLimiter::new(Some(50.0));
        let start = Instant::now();
        for _ in 0..3 {
            limiter.wait().await;
        }
        // First permit is immediate, two more at 20ms spacing
        assert!(start.elapsed() >= Duration::from_millis(35));
    }

    #[tokio::test]
    async fn test_rate_limiter_wait_disabled() {
        let limiter = RequestRateLimiter::unlimited();
        // Should return immediately
        limiter.wait().await;
    }

    #[test]
    fn test_rate_limiter_debug() {
        let limiter = RequestRateLimiter::new(Some(100.0));
        let debug = format!("{:?}", limiter);
        assert!(debug.contains("RequestRateLimiter"));
        assert!(debug.contains("100.0"));
        assert!(debug.contains("true"));
    }
}
