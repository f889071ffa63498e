//! Health check endpoint.

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::ratelimit::RateLimiterStats;
use crate::server::AppState;
use crate::template::CompilerStats;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub uptime_seconds: u64,
    pub templates: CompilerStats,
    pub mail: MailHealthResponse,
    pub ratelimit: RateLimiterStats,
}

#[derive(Debug, Serialize)]
pub struct MailHealthResponse {
    pub transport: String,
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        templates: state.renderer.stats(),
        mail: MailHealthResponse {
            transport: state.mailer.name().to_string(),
        },
        ratelimit: state.rate_limiter.stats(),
    })
}
