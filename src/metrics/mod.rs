//! Prometheus metrics for the email service.
//!
//! This module provides metrics for monitoring the service:
//! - Render metrics (renders by template and outcome, render latency)
//! - Template cache metrics (compilations)
//! - Degraded-render signals (translation fallbacks, missing keys, empty helper input)
//! - Delivery metrics (emails sent by template and outcome)
//! - Rate limiting metrics

mod helpers;

pub use helpers::{
    encode_metrics, DeliveryMetrics, RateLimitMetrics, RenderMetrics, TranslationMetrics,
};

use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, register_int_gauge,
    HistogramVec, IntCounter, IntCounterVec, IntGauge,
};

/// Prefix for all metrics
const METRIC_PREFIX: &str = "email";

lazy_static! {
    // ============================================================================
    // Render Metrics
    // ============================================================================

    /// Total renders by template and outcome
    pub static ref RENDERS_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_renders_total", METRIC_PREFIX),
        "Total template renders",
        &["template", "outcome"]
    ).unwrap();

    /// Render latency by template
    pub static ref RENDER_DURATION: HistogramVec = register_histogram_vec!(
        format!("{}_render_duration_seconds", METRIC_PREFIX),
        "Template render duration in seconds",
        &["template"],
        vec![0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25]
    ).unwrap();

    /// Template compilations (cache misses)
    pub static ref TEMPLATE_COMPILATIONS_TOTAL: IntCounter = register_int_counter!(
        format!("{}_template_compilations_total", METRIC_PREFIX),
        "Total template compilations"
    ).unwrap();

    /// Currently cached compiled templates
    pub static ref TEMPLATES_CACHED: IntGauge = register_int_gauge!(
        format!("{}_templates_cached", METRIC_PREFIX),
        "Number of compiled templates currently cached"
    ).unwrap();

    // ============================================================================
    // Degraded Render Signals
    // ============================================================================

    /// Translations served from a fallback locale
    pub static ref TRANSLATION_FALLBACKS_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_translation_fallbacks_total", METRIC_PREFIX),
        "Total translations resolved from a fallback locale",
        &["requested", "resolved"]
    ).unwrap();

    /// Translations missing from every locale
    pub static ref TRANSLATIONS_MISSING_TOTAL: IntCounter = register_int_counter!(
        format!("{}_translations_missing_total", METRIC_PREFIX),
        "Total translation keys not found in any locale"
    ).unwrap();

    /// Helpers invoked with an absent or empty value
    pub static ref HELPER_EMPTY_VALUES_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_helper_empty_values_total", METRIC_PREFIX),
        "Total helper invocations that received an empty value",
        &["helper"]
    ).unwrap();

    // ============================================================================
    // Delivery Metrics
    // ============================================================================

    /// Emails handed to the transport, by template and outcome
    pub static ref EMAILS_SENT_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_sent_total", METRIC_PREFIX),
        "Total emails sent",
        &["template", "outcome"]
    ).unwrap();

    // ============================================================================
    // Rate Limiting Metrics
    // ============================================================================

    /// Requests allowed by rate limiter
    pub static ref RATELIMIT_ALLOWED_TOTAL: IntCounter = register_int_counter!(
        format!("{}_ratelimit_allowed_total", METRIC_PREFIX),
        "Total requests allowed by rate limiter"
    ).unwrap();

    /// Requests denied by rate limiter
    pub static ref RATELIMIT_DENIED_TOTAL: IntCounter = register_int_counter!(
        format!("{}_ratelimit_denied_total", METRIC_PREFIX),
        "Total requests denied by rate limiter"
    ).unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_encode() {
        RenderMetrics::record_success("welcome", 0.002);
        TranslationMetrics::record_missing();

        let output = encode_metrics().unwrap();
        assert!(output.contains("email_renders_total"));
        assert!(output.contains("email_translations_missing_total"));
    }
}
