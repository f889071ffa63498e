//! Background maintenance tasks.

mod cleanup;

pub use cleanup::RateLimitCleanupTask;
