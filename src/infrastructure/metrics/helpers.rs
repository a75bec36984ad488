//! Metrics helper structs for convenient metric recording

use prometheus::{Encoder, TextEncoder};

use crate::postgres::CircuitState;

use super::{
    STORE_CIRCUIT_BREAKER_STATE, TEMPLATE_LOOKUP_FAILURES_TOTAL, TEMPLATE_RESOLUTIONS_TOTAL,
    TEMPLATE_SAVES_REJECTED_TOTAL, TEMPLATE_SAVES_TOTAL,
};

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer).unwrap_or_default())
}

/// Helper struct for recording template metrics
pub struct TemplateMetrics;

impl TemplateMetrics {
    pub fn record_resolution(category: &str, source: &str) {
        TEMPLATE_RESOLUTIONS_TOTAL
            .with_label_values(&[category, source])
            .inc();
    }

    pub fn record_lookup_failure(backend: &str) {
        TEMPLATE_LOOKUP_FAILURES_TOTAL
            .with_label_values(&[backend])
            .inc();
    }

    pub fn record_save(category: &str) {
        TEMPLATE_SAVES_TOTAL.with_label_values(&[category]).inc();
    }

    pub fn record_save_rejected() {
        TEMPLATE_SAVES_REJECTED_TOTAL.inc();
    }
}

/// Helper struct for store health metrics
pub struct StoreMetrics;

impl StoreMetrics {
    pub fn set_circuit_state(state: CircuitState) {
        STORE_CIRCUIT_BREAKER_STATE.set(state as i64);
    }
}
