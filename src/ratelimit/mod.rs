//! Rate limiting module using Token Bucket algorithm.
//!
//! Protects the email endpoints from bursts: each client gets a bucket of
//! `ratelimit.requests` tokens that refills over `ratelimit.window` seconds.

mod limiter;
mod token_bucket;

pub use crate::config::RateLimitConfig;
pub use limiter::{RateLimitResult, RateLimiter, RateLimiterStats};
pub use token_bucket::TokenBucket;
