//! Prometheus metrics for the template service.
//!
//! - Resolution metrics (by category and text source)
//! - Template store health (lookup failures, circuit breaker state)
//! - Save metrics

mod helpers;

pub use helpers::{encode_metrics, StoreMetrics, TemplateMetrics};

use lazy_static::lazy_static;
use prometheus::{
    register_int_counter, register_int_counter_vec, register_int_gauge, IntCounter,
    IntCounterVec, IntGauge,
};

/// Prefix for all metrics
const METRIC_PREFIX: &str = "condo_mail";

lazy_static! {
    // ============================================================================
    // Resolution Metrics
    // ============================================================================

    /// Messages resolved, by category and where the text came from
    pub static ref TEMPLATE_RESOLUTIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_template_resolutions_total", METRIC_PREFIX),
        "Total messages resolved",
        &["category", "source"]
    ).unwrap();

    /// Template lookups that failed and fell back to the default text
    pub static ref TEMPLATE_LOOKUP_FAILURES_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_template_lookup_failures_total", METRIC_PREFIX),
        "Total template lookups that failed",
        &["backend"]
    ).unwrap();

    // ============================================================================
    // Save Metrics
    // ============================================================================

    pub static ref TEMPLATE_SAVES_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_template_saves_total", METRIC_PREFIX),
        "Total templates saved",
        &["category"]
    ).unwrap();

    /// Saves refused because the stored template is mandatory
    pub static ref TEMPLATE_SAVES_REJECTED_TOTAL: IntCounter = register_int_counter!(
        format!("{}_template_saves_rejected_total", METRIC_PREFIX),
        "Total template saves rejected by the mandatory lock"
    ).unwrap();

    // ============================================================================
    // Store Metrics
    // ============================================================================

    /// PostgreSQL circuit breaker state (0=closed, 1=open, 2=half-open)
    pub static ref STORE_CIRCUIT_BREAKER_STATE: IntGauge = register_int_gauge!(
        format!("{}_store_circuit_breaker_state", METRIC_PREFIX),
        "Template store circuit breaker state (0=closed, 1=open, 2=half-open)"
    ).unwrap();
}
