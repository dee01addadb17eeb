use prometheus::{Encoder, TextEncoder};

use super::{
    DELIVERY_LATENCY, EMAILS_ACCEPTED_TOTAL, EMAILS_FAILED_TOTAL, EMAILS_SENT_TOTAL,
    HTTP_REQUESTS_TOTAL, STATUS_UPDATE_FAILURES_TOTAL, TEMPLATE_ACTIVATIONS_TOTAL, TEMPLATE_RENDER_FAILURES_TOTAL,
};

/// Encode all registered metrics in the Prometheus text format
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer).unwrap_or_default())
}

/// Helper for recording email lifecycle metrics
pub struct DeliveryMetrics;

impl DeliveryMetrics {
    /// Record a new email record; `source` is `direct`, `template` or `draft`
    pub fn record_accepted(source: &str) {
        EMAILS_ACCEPTED_TOTAL.with_label_values(&[source]).inc();
    }

    pub fn record_sent(latency_secs: f64) {
        EMAILS_SENT_TOTAL.inc();
        DELIVERY_LATENCY.observe(latency_secs);
    }

    /// `reason` is `transport` or `timeout`
    pub fn record_failed(reason: &str, latency_secs: f64) {
        EMAILS_FAILED_TOTAL.with_label_values(&[reason]).inc();
        DELIVERY_LATENCY.observe(latency_secs);
    }

    pub fn record_status_update_failure() {
        STATUS_UPDATE_FAILURES_TOTAL.inc();
    }
}

/// Helper for recording template metrics
pub struct TemplateMetrics;

impl TemplateMetrics {
    pub fn record_render_failure() {
        TEMPLATE_RENDER_FAILURES_TOTAL.inc();
    }

    pub fn record_activation() {
        TEMPLATE_ACTIVATIONS_TOTAL.inc();
    }
}

/// Helper for recording HTTP metrics
pub struct HttpMetrics;

impl HttpMetrics {
    /// `endpoint` is the matched route pattern, not the raw path
    pub fn record_request(endpoint: &str, status: u16) {
        HTTP_REQUESTS_TOTAL
            .with_label_values(&[endpoint, &status.to_string()])
            .inc();
    }
}
