use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::server::middleware::{api_key_auth, rate_limit_middleware};
use crate::server::AppState;

use super::email::{clear_template_cache, send_email};
use super::health::health;
use super::metrics::prometheus_metrics;

pub fn api_routes(state: AppState) -> Router<AppState> {
    // Rate limiting runs before authentication
    let protected = Router::new()
        .route("/api/email/{template_key}", post(send_email))
        .route("/api/templates/cache/clear", post(clear_template_cache))
        .route_layer(middleware::from_fn_with_state(state.clone(), api_key_auth))
        .route_layer(middleware::from_fn_with_state(state, rate_limit_middleware));

    Router::new()
        // Health & Metrics
        .route("/health", get(health))
        .route("/metrics", get(prometheus_metrics))
        .merge(protected)
}
