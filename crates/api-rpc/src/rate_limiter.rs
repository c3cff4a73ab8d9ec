//! Rate Limiter (Token Bucket)
//!
//! Guards the RPC edge against polling storms; admission tokens are cheap but
//! the store round trips behind them are not.

use std::time::Instant;
use tokio::sync::Mutex;

/// Token-bucket limiter shared by the RPC handlers.
pub struct RateLimiter {
    state: Mutex<Bucket>,
    max_tokens: f64,
    refill_per_sec: f64,
}

struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

impl RateLimiter {
    /// # Arguments
    /// * `max_tokens` - Maximum burst size
    /// * `refill_rate` - Tokens added per second
    pub fn new(max_tokens: u32, refill_rate: u32) -> Self {
        Self {
            state: Mutex::new(Bucket {
                tokens: max_tokens as f64,
                last_refill: Instant::now(),
            }),
            max_tokens: max_tokens as f64,
            refill_per_sec: refill_rate as f64,
        }
    }

    /// Check if a request is allowed (consumes 1 token).
    pub async fn check(&self) -> bool {
        let mut bucket = self.state.lock().await;

        let now = Instant::now();
        let elapsed = now.duration_since(bucket.last_refill).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * self.refill_per_sec).min(self.max_tokens);
        bucket.last_refill = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Remaining tokens (for monitoring)
    #[allow(dead_code)]
    pub async fn remaining(&self) -> f64 {
        self.state.lock().await.tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{sleep, Duration};

    #[tokio::test]
    async fn test_rate_limiter_allows_within_limit() {
        let limiter = RateLimiter::new(10, 10);

        for _ in 0..10 {
            assert!(limiter.check().await);
        }

        // 11th should be denied
        assert!(!limiter.check().await);
    }

    #[tokio::test]
    async fn test_rate_limiter_refills() {
        let limiter = RateLimiter::new(5, 10); // 10 tokens/sec

        for _ in 0..5 {
            assert!(limiter.check().await);
        }
        assert!(!limiter.check().await);

        sleep(Duration::from_secs(1)).await;

        assert!(limiter.check().await);
    }

    #[tokio::test]
    async fn test_rate_limiter_caps_burst() {
        let limiter = RateLimiter::new(3, 1000);

        sleep(Duration::from_millis(100)).await;

        // Refill never exceeds the burst cap
        let mut allowed = 0;
        for _ in 0..10 {
            if limiter.check().await {
                allowed += 1;
            }
        }
        assert_eq!(allowed, 3);
    }
}
