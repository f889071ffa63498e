// Core rendering engine
pub mod locale;
pub mod normalize;
pub mod template;

// Delivery
pub mod mail;
pub mod ratelimit;

// Application layer
pub mod api;
pub mod server;

// Supporting modules
pub mod config;
pub mod error;
pub mod metrics;
pub mod tasks;
pub mod telemetry;
