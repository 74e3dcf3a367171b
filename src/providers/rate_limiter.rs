//! Rate limiter trait for booking creation.
//!
//! The source deployment kept request counters in process-global mutable
//! maps. Here the limiter is an injected abstraction: single-instance
//! deployments use the in-memory sliding window in
//! [`crate::stores::MemoryRateLimiter`]; a multi-instance deployment would
//! back the same trait with a shared store.

use crate::error::Result;
use std::future::Future;
use std::time::Duration;

/// Sliding-window rate limiter.
///
/// # Example
///
/// ```no_run
/// use trailbook::providers::RateLimiter;
/// use std::time::Duration;
///
/// # async fn example(limiter: impl RateLimiter) -> trailbook::Result<()> {
/// // Allow at most 10 booking attempts per minute per client IP.
/// limiter
///     .check_and_record("203.0.113.7", 10, Duration::from_secs(60))
///     .await?;
/// # Ok(())
/// # }
/// ```
pub trait RateLimiter: Send + Sync + 'static {
    /// Check the key against the limit and record the attempt atomically.
    ///
    /// # Arguments
    ///
    /// * `key` - Rate limit key (e.g. client IP)
    /// * `max_attempts` - Maximum attempts allowed in the window
    /// * `window` - Window duration
    ///
    /// # Errors
    ///
    /// * `BookingError::TooManyAttempts` when the limit is exceeded
    /// * `BookingError::Database` when the backing store fails
    fn check_and_record(
        &self,
        key: &str,
        max_attempts: u32,
        window: Duration,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Reset the counter for a key (admin override, tests).
    fn reset(&self, key: &str) -> impl Future<Output = Result<()>> + Send;

    /// Current attempt count for a key, for monitoring.
    fn attempts(&self, key: &str) -> impl Future<Output = Result<u32>> + Send;
}
