//! Per-client rate limiter

use dashmap::DashMap;
use serde::Serialize;

use super::token_bucket::TokenBucket;
use crate::config::RateLimitConfig;

/// Result of a rate limit check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateLimitResult {
    /// Request is allowed
    Allowed {
        remaining: u32,
        limit: u32,
        reset_at: i64,
    },
    /// Request is denied due to rate limiting
    Denied {
        retry_after: u64,
        limit: u32,
        reset_at: i64,
    },
}

impl RateLimitResult {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitResult::Allowed { .. })
    }
}

/// Rate limiter keeping one token bucket per client key.
///
/// Clients are identified by the caller (the HTTP layer uses the peer IP).
pub struct RateLimiter {
    buckets: DashMap<String, TokenBucket>,
    config: RateLimitConfig,
}

impl RateLimiter {
    /// Create a new rate limiter with the given configuration
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            buckets: DashMap::new(),
            config,
        }
    }

    /// Check if rate limiting is enabled
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Get the configuration
    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Take one token from `key`'s bucket
    pub fn check(&self, key: &str) -> RateLimitResult {
        let limit = self.config.requests;

        if !self.config.enabled {
            return RateLimitResult::Allowed {
                remaining: limit,
                limit,
                reset_at: 0,
            };
        }

        let window_ms = self.config.window.saturating_mul(1000);
        let bucket = self
            .buckets
            .entry(key.to_string())
            .or_insert_with(|| TokenBucket::new(limit, window_ms));

        if bucket.try_consume() {
            RateLimitResult::Allowed {
                remaining: bucket.available(),
                limit,
                reset_at: bucket.reset_at(),
            }
        } else {
            RateLimitResult::Denied {
                retry_after: bucket.retry_after(),
                limit,
                reset_at: bucket.reset_at(),
            }
        }
    }

    /// Clean up stale buckets that haven't been used recently
    pub fn cleanup_stale(&self) -> usize {
        let ttl_ms = (self.config.bucket_ttl_seconds * 1000) as i64;
        let now = TokenBucket::now_millis();
        let before = self.buckets.len();

        self.buckets
            .retain(|_, bucket| now - bucket.last_activity() < ttl_ms);

        let removed = before.saturating_sub(self.buckets.len());
        if removed > 0 {
            tracing::debug!(
                removed = removed,
                buckets = self.buckets.len(),
                "Cleaned up stale rate limit buckets"
            );
        }

        removed
    }

    /// Get statistics about the rate limiter
    pub fn stats(&self) -> RateLimiterStats {
        RateLimiterStats {
            enabled: self.config.enabled,
            buckets: self.buckets.len(),
            limit: self.config.requests,
            window_seconds: self.config.window,
        }
    }
}

/// Statistics about the rate limiter
#[derive(Debug, Clone, Serialize)]
pub struct RateLimiterStats {
    pub enabled: bool,
    pub buckets: usize,
    pub limit: u32,
    pub window_seconds: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(requests: u32) -> RateLimiter {
        RateLimiter::new(RateLimitConfig {
            enabled: true,
            requests,
            ..Default::default()
        })
    }

    #[test]
    fn test_rate_limiter_disabled() {
        let limiter = RateLimiter::new(RateLimitConfig {
            enabled: false,
            ..Default::default()
        });

        // Should always be allowed when disabled
        for _ in 0..100 {
            assert!(limiter.check("127.0.0.1").is_allowed());
        }
        assert_eq!(limiter.stats().buckets, 0);
    }

    #[test]
    fn test_rate_limiter_key_limit() {
        let limiter = limiter(5);

        for expected_remaining in (0..5).rev() {
            match limiter.check("10.0.0.1") {
                RateLimitResult::Allowed { remaining, limit, .. } => {
                    assert_eq!(limit, 5);
                    assert_eq!(remaining, expected_remaining);
                }
                other => panic!("expected allowed, got {:?}", other),
            }
        }

        match limiter.check("10.0.0.1") {
            RateLimitResult::Denied { retry_after, limit, .. } => {
                assert_eq!(limit, 5);
                assert!(retry_after >= 1);
            }
            other => panic!("expected denied, got {:?}", other),
        }
    }

    #[test]
    fn test_rate_limiter_different_keys() {
        let limiter = limiter(3);

        // Each key has its own bucket
        for _ in 0..3 {
            assert!(limiter.check("key-1").is_allowed());
        }
        assert!(!limiter.check("key-1").is_allowed());

        // key-2 should still have its full quota
        for _ in 0..3 {
            assert!(limiter.check("key-2").is_allowed());
        }
        assert!(!limiter.check("key-2").is_allowed());
    }

    #[test]
    fn test_cleanup_stale_buckets() {
        let limiter = RateLimiter::new(RateLimitConfig {
            enabled: true,
            bucket_ttl_seconds: 0, // Immediate expiry for testing
            ..Default::default()
        });

        limiter.check("a");
        limiter.check("b");
        assert_eq!(limiter.stats().buckets, 2);

        // Cleanup should remove them (since TTL is 0)
        assert_eq!(limiter.cleanup_stale(), 2);
        assert_eq!(limiter.stats().buckets, 0);
    }

    #[test]
    fn test_stats() {
        let limiter = limiter(30);
        limiter.check("key1");
        limiter.check("key2");

        let stats = limiter.stats();
        assert!(stats.enabled);
        assert_eq!(stats.buckets, 2);
        assert_eq!(stats.limit, 30);
        assert_eq!(stats.window_seconds, 60);
    }
}
