//! Rate Limiter (Token Bucket)
//!
//! Caps request throughput on the RPC surface so a misbehaving client
//! cannot starve the ledger of connections.

use std::sync::Mutex;
use std::time::Instant;

/// Token bucket: `max_tokens` burst, refilled at `refill_rate` per second.
pub struct RateLimiter {
    state: Mutex<BucketState>,
    max_tokens: f64,
    refill_rate: f64,
}

struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

impl RateLimiter {
    /// Allow 100 requests/sec with burst of 200: `RateLimiter::new(200, 100)`
    pub fn new(max_burst: u32, rate_per_sec: u32) -> Self {
        Self {
            state: Mutex::new(BucketState {
                tokens: max_burst as f64,
                last_refill: Instant::now(),
            }),
            max_tokens: max_burst as f64,
            refill_rate: rate_per_sec as f64,
        }
    }

    /// Check if a request is allowed (consumes 1 token).
    pub fn check(&self) -> bool {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());

        let now = Instant::now();
        let elapsed = now.duration_since(state.last_refill).as_secs_f64();
        state.tokens = (state.tokens + elapsed * self.refill_rate).min(self.max_tokens);
        state.last_refill = now;

        if state.tokens >= 1.0 {
            state.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Remaining tokens (for monitoring).
    pub fn remaining(&self) -> f64 {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{sleep, Duration};

    #[test]
    fn test_rate_limiter_allows_within_limit() {
        let limiter = RateLimiter::new(10, 10);

        // Should allow 10 requests
        for _ in 0..10 {
            assert!(limiter.check());
        }

        // 11th should be denied
        assert!(!limiter.check());
    }

    #[tokio::test]
    async fn test_rate_limiter_refills() {
        let limiter = RateLimiter::new(5, 10); // 10 tokens/sec

        for _ in 0..5 {
            assert!(limiter.check());
        }
        assert!(!limiter.check());

        // Wait for refill
        sleep(Duration::from_millis(1100)).await;
        assert!(limiter.check());
    }

    #[tokio::test]
    async fn test_rate_limiter_concurrent() {
        use std::sync::Arc;

        let limiter = Arc::new(RateLimiter::new(100, 50));

        // 10 concurrent tasks, each trying 20 requests
        let mut handles = vec![];
        for _ in 0..10 {
            let limiter = Arc::clone(&limiter);
            handles.push(tokio::spawn(async move {
                let mut allowed = 0;
                for _ in 0..20 {
                    if limiter.check() {
                        allowed += 1;
                    }
                }
                allowed
            }));
        }

        let mut total_allowed = 0;
        for handle in handles {
            total_allowed += handle.await.unwrap();
        }

        // 200 requests against a burst of 100 (plus a sliver of refill)
        assert!(
            (90..=110).contains(&total_allowed),
            "expected ~100 allowed, got {}",
            total_allowed
        );
    }
}
