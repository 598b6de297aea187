//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the mediaconv server:
//! - HTTP request metrics (latency, counts)
//! - Conversion outcomes and durations per workflow
//! - Workflow busy state (collected dynamically)

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, IntGaugeVec, Opts,
    Registry, TextEncoder,
};
use tracing::warn;

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "mediaconv_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
        ]),
        &["method", "path", "status"],
    )
    .expect("valid metric definition")
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("mediaconv_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .expect("valid metric definition")
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "mediaconv_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .expect("valid metric definition")
});

// =============================================================================
// Conversion Metrics
// =============================================================================

/// Conversion attempts by workflow and outcome.
pub static CONVERSIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "mediaconv_conversions_total",
            "Conversion attempts by workflow and outcome",
        ),
        &["workflow", "outcome"],
    )
    .expect("valid metric definition")
});

/// Conversion duration in seconds, refusals excluded.
pub static CONVERSION_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "mediaconv_conversion_duration_seconds",
            "Conversion duration in seconds",
        )
        .buckets(vec![0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0, 600.0]),
        &["workflow", "outcome"],
    )
    .expect("valid metric definition")
});

/// Workflows currently converting (collected dynamically).
pub static WORKFLOW_BUSY: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new(
            "mediaconv_workflow_busy",
            "Whether the workflow is converting (1) or idle (0)",
        ),
        &["workflow"],
    )
    .expect("valid metric definition")
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    let collectors: [Box<dyn prometheus::core::Collector>; 6] = [
        Box::new(HTTP_REQUEST_DURATION.clone()),
        Box::new(HTTP_REQUESTS_TOTAL.clone()),
        Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()),
        Box::new(CONVERSIONS_TOTAL.clone()),
        Box::new(CONVERSION_DURATION.clone()),
        Box::new(WORKFLOW_BUSY.clone()),
    ];
    for collector in collectors {
        if let Err(e) = registry.register(collector) {
            warn!("Failed to register metric: {}", e);
        }
    }
}

/// Record one finished conversion attempt.
pub fn record_conversion(workflow: &str, outcome: &str, elapsed_secs: Option<f64>) {
    CONVERSIONS_TOTAL
        .with_label_values(&[workflow, outcome])
        .inc();
    if let Some(secs) = elapsed_secs {
        CONVERSION_DURATION
            .with_label_values(&[workflow, outcome])
            .observe(secs);
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        warn!("Failed to encode metrics: {}", e);
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Collect dynamic metrics from current application state.
///
/// This is called before encoding metrics to update gauges with current values.
pub fn collect_dynamic_metrics(state: &crate::state::AppState) {
    for workflow in state.workflows() {
        WORKFLOW_BUSY
            .with_label_values(&[workflow.recipe().id])
            .set(i64::from(workflow.is_busy()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_metrics_returns_prometheus_format() {
        // Access metrics to ensure they're initialized
        HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/test", "200"])
            .inc();

        let output = encode_metrics();
        assert!(output.contains("mediaconv_http_requests_total"));
        assert!(output.contains("# HELP"));
        assert!(output.contains("# TYPE"));
    }

    #[test]
    fn test_registry_contains_conversion_metrics() {
        // Prometheus only outputs metrics that have been accessed
        record_conversion("video-to-audio", "success", Some(1.5));
        record_conversion("video-to-audio", "busy", None);
        WORKFLOW_BUSY.with_label_values(&["video-to-audio"]).set(0);
        HTTP_REQUESTS_IN_FLIGHT.set(0);

        let output = encode_metrics();
        assert!(output.contains("mediaconv_conversions_total"));
        assert!(output.contains("mediaconv_conversion_duration_seconds"));
        assert!(output.contains("mediaconv_workflow_busy"));
        assert!(output.contains("mediaconv_http_requests_in_flight"));
        assert!(output.contains(r#"outcome="busy""#));
    }
}
