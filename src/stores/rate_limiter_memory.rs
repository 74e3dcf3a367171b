//! In-memory sliding-window rate limiter.

use crate::error::{BookingError, Result};
use crate::providers::RateLimiter;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// In-memory sliding-window rate limiter.
///
/// Keeps a vector of attempt timestamps per key behind a mutex and prunes
/// entries outside the window on every check. Suitable for the
/// single-instance deployment this service targets; a multi-instance
/// deployment should back [`RateLimiter`] with a shared store instead.
#[derive(Debug, Clone, Default)]
pub struct MemoryRateLimiter {
    /// Map of key -> attempt timestamps (ms since epoch).
    attempts: Arc<Mutex<HashMap<String, Vec<u64>>>>,
}

impl MemoryRateLimiter {
    /// Create a new in-memory rate limiter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn now_ms() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO)
            .as_millis() as u64
    }
}

impl RateLimiter for MemoryRateLimiter {
    async fn check_and_record(
        &self,
        key: &str,
        max_attempts: u32,
        window: Duration,
    ) -> Result<()> {
        let mut guard = self
            .attempts
            .lock()
            .map_err(|_| BookingError::Database("rate limiter mutex poisoned".into()))?;

        let now_ms = Self::now_ms();
        let window_ms = window.as_millis() as u64;
        let window_start = now_ms.saturating_sub(window_ms);

        // Prune every key and evict the ones that empty out, so one-off
        // client IPs do not accumulate in the map forever.
        guard.retain(|_, timestamps| {
            timestamps.retain(|&ts| ts >= window_start);
            !timestamps.is_empty()
        });

        let timestamps = guard.entry(key.to_string()).or_default();

        if timestamps.len() >= max_attempts as usize {
            tracing::warn!(
                key = %key,
                attempts = timestamps.len(),
                max_attempts,
                "booking rate limit exceeded"
            );
            return Err(BookingError::TooManyAttempts {
                retry_after: window,
            });
        }

        timestamps.push(now_ms);
        Ok(())
    }

    async fn reset(&self, key: &str) -> Result<()> {
        let mut guard = self
            .attempts
            .lock()
            .map_err(|_| BookingError::Database("rate limiter mutex poisoned".into()))?;
        guard.remove(key);
        Ok(())
    }

    async fn attempts(&self, key: &str) -> Result<u32> {
        let guard = self
            .attempts
            .lock()
            .map_err(|_| BookingError::Database("rate limiter mutex poisoned".into()))?;
        Ok(guard.get(key).map_or(0, |timestamps| timestamps.len() as u32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_allows_within_limit() {
        let limiter = MemoryRateLimiter::new();

        for i in 1..=5 {
            let result = limiter
                .check_and_record("10.0.0.1", 5, Duration::from_secs(60))
                .await;
            assert!(result.is_ok(), "attempt {i} should succeed");
        }
    }

    #[tokio::test]
    async fn test_blocks_over_limit() {
        let limiter = MemoryRateLimiter::new();

        for _ in 0..5 {
            limiter
                .check_and_record("10.0.0.1", 5, Duration::from_secs(60))
                .await
                .unwrap();
        }

        let result = limiter
            .check_and_record("10.0.0.1", 5, Duration::from_secs(60))
            .await;
        assert!(matches!(
            result,
            Err(BookingError::TooManyAttempts { .. })
        ));
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let limiter = MemoryRateLimiter::new();

        for _ in 0..3 {
            limiter
                .check_and_record("10.0.0.1", 3, Duration::from_secs(60))
                .await
                .unwrap();
        }

        assert!(limiter
            .check_and_record("10.0.0.2", 3, Duration::from_secs(60))
            .await
            .is_ok());
        assert_eq!(limiter.attempts("10.0.0.1").await.unwrap(), 3);
        assert_eq!(limiter.attempts("10.0.0.2").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_reset_clears_key() {
        let limiter = MemoryRateLimiter::new();

        for _ in 0..3 {
            limiter
                .check_and_record("10.0.0.1", 3, Duration::from_secs(60))
                .await
                .unwrap();
        }
        assert!(limiter
            .check_and_record("10.0.0.1", 3, Duration::from_secs(60))
            .await
            .is_err());

        limiter.reset("10.0.0.1").await.unwrap();
        assert!(limiter
            .check_and_record("10.0.0.1", 3, Duration::from_secs(60))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_window_slides() {
        let limiter = MemoryRateLimiter::new();

        for _ in 0..2 {
            limiter
                .check_and_record("10.0.0.1", 2, Duration::from_millis(100))
                .await
                .unwrap();
        }
        assert!(limiter
            .check_and_record("10.0.0.1", 2, Duration::from_millis(100))
            .await
            .is_err());

        tokio::time::sleep(Duration::from_millis(150)).await;

        assert!(limiter
            .check_and_record("10.0.0.1", 2, Duration::from_millis(100))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_expired_keys_are_evicted() {
        let limiter = MemoryRateLimiter::new();

        limiter
            .check_and_record("10.0.0.1", 5, Duration::from_millis(50))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(80)).await;

        // A later check for any key sweeps out keys whose window emptied.
        limiter
            .check_and_record("10.0.0.2", 5, Duration::from_millis(50))
            .await
            .unwrap();

        let guard = limiter.attempts.lock().unwrap();
        assert!(!guard.contains_key("10.0.0.1"));
        assert!(guard.contains_key("10.0.0.2"));
    }
}
