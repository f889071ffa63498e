//! API layer - HTTP endpoint handlers.

mod email;
mod health;
mod metrics;
pub mod models;
mod routes;

// Re-export all handlers for use in server/app.rs
pub use email::{clear_template_cache, send_email};
pub use health::health;
pub use metrics::prometheus_metrics;
pub use routes::api_routes;
