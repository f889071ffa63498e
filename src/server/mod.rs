//! HTTP server wiring: shared state, router and middleware.

mod app;
pub mod middleware;
mod state;

pub use app::create_app;
pub use state::AppState;
