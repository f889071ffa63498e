//! Metrics helper structs for convenient metric recording

use prometheus::{Encoder, TextEncoder};

use super::{
    EMAILS_SENT_TOTAL, HELPER_EMPTY_VALUES_TOTAL, RATELIMIT_ALLOWED_TOTAL, RATELIMIT_DENIED_TOTAL,
    RENDERS_TOTAL, RENDER_DURATION, TEMPLATES_CACHED, TEMPLATE_COMPILATIONS_TOTAL,
    TRANSLATIONS_MISSING_TOTAL, TRANSLATION_FALLBACKS_TOTAL,
};

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer).unwrap_or_default())
}

/// Helper struct for recording render and template cache metrics
pub struct RenderMetrics;

impl RenderMetrics {
    /// Record a successful render and its duration
    pub fn record_success(template: &str, seconds: f64) {
        RENDERS_TOTAL.with_label_values(&[template, "success"]).inc();
        RENDER_DURATION.with_label_values(&[template]).observe(seconds);
    }

    /// Record a failed render
    pub fn record_failure(template: &str) {
        RENDERS_TOTAL.with_label_values(&[template, "failure"]).inc();
    }

    /// Record a template compilation
    pub fn record_compilation(cached: usize) {
        TEMPLATE_COMPILATIONS_TOTAL.inc();
        TEMPLATES_CACHED.set(cached as i64);
    }

    /// Set the number of cached templates
    pub fn set_cached(cached: usize) {
        TEMPLATES_CACHED.set(cached as i64);
    }

    /// Record a cache clear
    pub fn record_cache_cleared() {
        TEMPLATES_CACHED.set(0);
    }

    /// Record a helper receiving an empty value
    pub fn record_empty_value(helper: &str) {
        HELPER_EMPTY_VALUES_TOTAL.with_label_values(&[helper]).inc();
    }
}

/// Helper struct for recording translation signals
pub struct TranslationMetrics;

impl TranslationMetrics {
    /// Record a translation served from a fallback locale
    pub fn record_fallback(requested: &str, resolved: &str) {
        TRANSLATION_FALLBACKS_TOTAL
            .with_label_values(&[requested, resolved])
            .inc();
    }

    /// Record a translation missing from every locale
    pub fn record_missing() {
        TRANSLATIONS_MISSING_TOTAL.inc();
    }
}

/// Helper struct for recording delivery metrics
pub struct DeliveryMetrics;

impl DeliveryMetrics {
    /// Record a delivered email
    pub fn record_sent(template: &str) {
        EMAILS_SENT_TOTAL.with_label_values(&[template, "sent"]).inc();
    }

    /// Record a failed delivery
    pub fn record_failed(template: &str) {
        EMAILS_SENT_TOTAL.with_label_values(&[template, "failed"]).inc();
    }
}

/// Helper struct for recording rate limit metrics
pub struct RateLimitMetrics;

impl RateLimitMetrics {
    /// Record an allowed HTTP request
    pub fn record_allowed() {
        RATELIMIT_ALLOWED_TOTAL.inc();
    }

    /// Record a denied HTTP request
    pub fn record_denied() {
        RATELIMIT_DENIED_TOTAL.inc();
    }
}
