//! Rate limiting for provider calls using a token bucket algorithm.
//!
//! Rate limiting prevents overwhelming external embedding/rerank providers and helps manage
//! costs for pay-per-call APIs. The gateway itself never retries a [`crate::EmbeddingError::RateLimited`]
//! error internally - it surfaces it so the caller (the Orchestrator) can decide whether to
//! back off and retry.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

/// Configuration for rate limiting.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RateLimitConfig {
    /// Maximum requests per second (sustained rate).
    pub requests_per_second: f64,
    /// Maximum burst size (allow temporary spikes).
    pub burst_size: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: 10.0,
            burst_size: 5,
        }
    }
}

impl RateLimitConfig {
    pub fn with_requests_per_second(mut self, rps: f64) -> Self {
        self.requests_per_second = rps;
        self
    }

    pub fn with_burst_size(mut self, burst: u32) -> Self {
        self.burst_size = burst;
        self
    }
}

/// Token bucket rate limiter.
pub struct TokenBucket {
    config: RateLimitConfig,
    tokens: Mutex<f64>,
    last_update: Mutex<Instant>,
    total_requests: AtomicU64,
    throttled_requests: AtomicU64,
}

impl TokenBucket {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            tokens: Mutex::new(config.burst_size as f64),
            last_update: Mutex::new(Instant::now()),
            total_requests: AtomicU64::new(0),
            throttled_requests: AtomicU64::new(0),
        }
    }

    /// Try to acquire a token (non-blocking).
    pub fn try_acquire(&self) -> bool {
        self.total_requests.fetch_add(1, Ordering::Relaxed);

        let mut tokens = self.tokens.lock().unwrap();
        let mut last_update = self.last_update.lock().unwrap();

        let now = Instant::now();
        let elapsed = now.duration_since(*last_update);
        let tokens_to_add = elapsed.as_secs_f64() * self.config.requests_per_second;
        *tokens = (*tokens + tokens_to_add).min(self.config.burst_size as f64);
        *last_update = now;

        if *tokens >= 1.0 {
            *tokens -= 1.0;
            true
        } else {
            self.throttled_requests.fetch_add(1, Ordering::Relaxed);
            false
        }
    }

    /// Acquire a token. Non-blocking: callers that fail to acquire surface
    /// [`crate::EmbeddingError::RateLimited`] rather than sleeping, since the gateway never retries
    /// rate-limit rejections itself.
    pub fn acquire(&self) -> bool {
        self.try_acquire()
    }

    pub fn stats(&self) -> RateLimitStats {
        RateLimitStats {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            throttled_requests: self.throttled_requests.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RateLimitStats {
    pub total_requests: u64,
    pub throttled_requests: u64,
}

impl RateLimitStats {
    pub fn throttle_rate(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.throttled_requests as f64 / self.total_requests as f64
        }
    }
}

/// Manager for multiple rate limiters (one per provider).
pub struct RateLimitManager {
    limiters: Mutex<std::collections::HashMap<String, Arc<TokenBucket>>>,
    default_config: RateLimitConfig,
}

impl RateLimitManager {
    pub fn new(default_config: RateLimitConfig) -> Self {
        Self {
            limiters: Mutex::new(std::collections::HashMap::new()),
            default_config,
        }
    }

    pub fn get_or_create(&self, provider: &str) -> Arc<TokenBucket> {
        let mut limiters = self.limiters.lock().unwrap();
        limiters
            .entry(provider.to_string())
            .or_insert_with(|| Arc::new(TokenBucket::new(self.default_config)))
            .clone()
    }

    pub fn get_or_create_with_config(
        &self,
        provider: &str,
        config: RateLimitConfig,
    ) -> Arc<TokenBucket> {
        let mut limiters = self.limiters.lock().unwrap();
        limiters
            .entry(provider.to_string())
            .or_insert_with(|| Arc::new(TokenBucket::new(config)))
            .clone()
    }

    pub fn reset_all(&self) {
        self.limiters.lock().unwrap().clear();
    }
}

impl Default for RateLimitManager {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn token_bucket_allows_burst() {
        let config = RateLimitConfig::default().with_burst_size(5);
        let bucket = TokenBucket::new(config);

        for _ in 0..5 {
            assert!(bucket.try_acquire());
        }
        assert!(!bucket.try_acquire());
    }

    #[test]
    fn token_bucket_refills_over_time() {
        let config = RateLimitConfig::default()
            .with_requests_per_second(100.0)
            .with_burst_size(1);
        let bucket = TokenBucket::new(config);

        assert!(bucket.try_acquire());
        assert!(!bucket.try_acquire());
        thread::sleep(Duration::from_millis(20));
        assert!(bucket.try_acquire());
    }

    #[test]
    fn rate_limit_manager_tracks_multiple_providers_independently() {
        let manager = RateLimitManager::default();
        let limiter1 = manager.get_or_create("provider1");
        let limiter2 = manager.get_or_create("provider2");

        for _ in 0..3 {
            assert!(limiter1.try_acquire());
        }
        for _ in 0..5 {
            assert!(limiter2.try_acquire());
        }
    }

    #[test]
    fn stats_calculates_throttle_rate() {
        let config = RateLimitConfig::default().with_burst_size(2);
        let bucket = TokenBucket::new(config);

        assert!(bucket.try_acquire());
        assert!(bucket.try_acquire());
        assert!(!bucket.try_acquire());

        let stats = bucket.stats();
        assert_eq!(stats.total_requests, 3);
        assert_eq!(stats.throttled_requests, 1);
        assert!((stats.throttle_rate() - 0.333).abs() < 0.01);
    }
}
