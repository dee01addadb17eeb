//! Prometheus metrics for the mailer service.
//!
//! - Email intake by source (direct, template, draft)
//! - Delivery outcomes and latency
//! - Status write failures after a delivery attempt
//! - Template rendering failures and version activations
//! - HTTP request counts

mod helpers;

pub use helpers::{encode_metrics, DeliveryMetrics, HttpMetrics, TemplateMetrics};

use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, Histogram, IntCounter,
    IntCounterVec,
};

/// Prefix for all metrics
const METRIC_PREFIX: &str = "mailer";

lazy_static! {
    // ============================================================================
    // Email Metrics
    // ============================================================================

    /// Emails accepted into the lifecycle, by source
    pub static ref EMAILS_ACCEPTED_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_emails_accepted_total", METRIC_PREFIX),
        "Total emails accepted and recorded",
        &["source"]
    ).unwrap();

    pub static ref EMAILS_SENT_TOTAL: IntCounter = register_int_counter!(
        format!("{}_emails_sent_total", METRIC_PREFIX),
        "Total emails accepted by the SMTP server"
    ).unwrap();

    /// Failed deliveries by reason (transport, timeout)
    pub static ref EMAILS_FAILED_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_emails_failed_total", METRIC_PREFIX),
        "Total failed email deliveries",
        &["reason"]
    ).unwrap();

    pub static ref STATUS_UPDATE_FAILURES_TOTAL: IntCounter = register_int_counter!(
        format!("{}_status_update_failures_total", METRIC_PREFIX),
        "Status writes that failed after a delivery attempt"
    ).unwrap();

    /// Transport call latency in seconds, including timeouts
    pub static ref DELIVERY_LATENCY: Histogram = register_histogram!(
        format!("{}_delivery_latency_seconds", METRIC_PREFIX),
        "Email delivery latency in seconds",
        vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]
    ).unwrap();

    // ============================================================================
    // Template Metrics
    // ============================================================================

    pub static ref TEMPLATE_RENDER_FAILURES_TOTAL: IntCounter = register_int_counter!(
        format!("{}_template_render_failures_total", METRIC_PREFIX),
        "Template renders that failed"
    ).unwrap();

    pub static ref TEMPLATE_ACTIVATIONS_TOTAL: IntCounter = register_int_counter!(
        format!("{}_template_activations_total", METRIC_PREFIX),
        "Template versions activated"
    ).unwrap();

    // ============================================================================
    // HTTP Metrics
    // ============================================================================

    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_http_requests_total", METRIC_PREFIX),
        "Total HTTP requests",
        &["endpoint", "status"]
    ).unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_metrics() {
        EMAILS_SENT_TOTAL.inc();

        let output = encode_metrics().unwrap();
        assert!(output.contains("mailer_emails_sent_total"));
    }

    #[test]
    fn test_delivery_metrics() {
        DeliveryMetrics::record_accepted("direct");
        DeliveryMetrics::record_sent(0.2);
        DeliveryMetrics::record_failed("timeout", 1.0);
        DeliveryMetrics::record_status_update_failure();
        assert!(EMAILS_ACCEPTED_TOTAL.with_label_values(&["direct"]).get() >= 1);
        assert!(EMAILS_FAILED_TOTAL.with_label_values(&["timeout"]).get() >= 1);
    }

    #[test]
    fn test_template_metrics() {
        TemplateMetrics::record_render_failure();
        TemplateMetrics::record_activation();
        assert!(TEMPLATE_ACTIVATIONS_TOTAL.get() >= 1);
    }

    #[test]
    fn test_http_metrics() {
        HttpMetrics::record_request("/send", 200);
        assert!(HTTP_REQUESTS_TOTAL.with_label_values(&["/send", "200"]).get() >= 1);
    }
}
