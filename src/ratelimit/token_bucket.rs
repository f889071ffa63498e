//! Token Bucket algorithm implementation

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::SystemTime;

/// Fixed-point scale: one token is stored as 1000 units
const SCALE: u64 = 1000;

/// Token Bucket for rate limiting.
///
/// Uses atomic operations for lock-free concurrent access.
/// `capacity` tokens refill evenly over `window_ms`; tokens are kept in
/// thousandths so slow refill rates do not lose partial tokens.
#[derive(Debug)]
pub struct TokenBucket {
    /// Current number of tokens, scaled by [`SCALE`]
    tokens: AtomicU64,
    /// Last refill timestamp (Unix milliseconds)
    last_refill: AtomicI64,
    /// Maximum bucket capacity
    capacity: u32,
    /// Time to refill from empty to full
    window_ms: u64,
}

impl TokenBucket {
    /// Create a full bucket
    pub fn new(capacity: u32, window_ms: u64) -> Self {
        Self {
            tokens: AtomicU64::new(capacity as u64 * SCALE),
            last_refill: AtomicI64::new(Self::now_millis()),
            capacity,
            window_ms: window_ms.max(1),
        }
    }

    /// Get current time in milliseconds
    pub fn now_millis() -> i64 {
        SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as i64
    }

    fn max_units(&self) -> u64 {
        self.capacity as u64 * SCALE
    }

    /// Units gained over `elapsed_ms`
    fn refill_units(&self, elapsed_ms: i64) -> u64 {
        let elapsed = elapsed_ms.max(0) as u64;
        elapsed.saturating_mul(self.max_units()) / self.window_ms
    }

    fn units_at(&self, now: i64) -> u64 {
        let last = self.last_refill.load(Ordering::Acquire);
        let current = self.tokens.load(Ordering::Acquire);
        current
            .saturating_add(self.refill_units(now - last))
            .min(self.max_units())
    }

    /// Try to consume one token from the bucket.
    /// Returns true if a token was available, false otherwise.
    pub fn try_consume(&self) -> bool {
        self.try_consume_at(Self::now_millis())
    }

    fn try_consume_at(&self, now: i64) -> bool {
        loop {
            let last = self.last_refill.load(Ordering::Acquire);
            let current = self.tokens.load(Ordering::Acquire);
            let refilled = current
                .saturating_add(self.refill_units(now - last))
                .min(self.max_units());

            if refilled < SCALE {
                return false;
            }

            if self
                .tokens
                .compare_exchange_weak(current, refilled - SCALE, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                self.last_refill.fetch_max(now, Ordering::AcqRel);
                return true;
            }
            // CAS failed, retry
        }
    }

    /// Get the current number of whole tokens available
    pub fn available(&self) -> u32 {
        (self.units_at(Self::now_millis()) / SCALE) as u32
    }

    /// Seconds until the bucket has at least one token
    pub fn retry_after(&self) -> u64 {
        let units = self.units_at(Self::now_millis());
        if units >= SCALE {
            return 0;
        }
        let missing_ms = (SCALE - units) * self.window_ms / self.max_units().max(1);
        missing_ms.div_ceil(1000).max(1)
    }

    /// Unix seconds at which the bucket will be full again
    pub fn reset_at(&self) -> i64 {
        let now = Self::now_millis();
        let missing = self.max_units() - self.units_at(now);
        let missing_ms = (missing * self.window_ms).div_ceil(self.max_units().max(1));
        (now + missing_ms as i64 + 999) / 1000
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Get the last activity time
    pub fn last_activity(&self) -> i64 {
        self.last_refill.load(Ordering::Relaxed)
    }
}
