//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the helpdesk server:
//! - HTTP request metrics (latency, counts, auth failures)
//! - Working-set status (collected dynamically)
//! - Core lifecycle counters, registered from `helpdesk_core::metrics`

use once_cell::sync::Lazy;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};
use regex_lite::Regex;
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
            "helpdesk_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("helpdesk_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "helpdesk_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

/// Authentication and authorization failures.
pub static AUTH_FAILURES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "helpdesk_auth_failures_total",
            "Total authentication and authorization failures",
        ),
        &["reason"],
    )
    .unwrap()
});

// =============================================================================
// Working Set (collected dynamically)
// =============================================================================

/// Priority cache reachability (1 = available).
pub static CACHE_AVAILABLE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "helpdesk_cache_available",
        "Whether the priority cache answers (1) or not (0)",
    )
    .unwrap()
});

/// Messages waiting in the queue, including leased ones.
pub static QUEUE_PENDING: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("helpdesk_queue_pending", "Messages not yet acked").unwrap()
});

/// Background processor state (1 = running).
pub static PROCESSOR_RUNNING: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "helpdesk_processor_running",
        "Whether the ticket processor is running (1) or stopped (0)",
    )
    .unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();
    registry
        .register(Box::new(AUTH_FAILURES_TOTAL.clone()))
        .unwrap();

    // Working set
    registry.register(Box::new(CACHE_AVAILABLE.clone())).unwrap();
    registry.register(Box::new(QUEUE_PENDING.clone())).unwrap();
    registry
        .register(Box::new(PROCESSOR_RUNNING.clone()))
        .unwrap();

    // Core
    for collector in helpdesk_core::metrics::all_metrics() {
        registry.register(collector).unwrap();
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
    String::from_utf8(buffer).unwrap_or_default()
}

/// Refresh gauges from current application state before encoding.
pub async fn collect_dynamic_metrics(state: &crate::state::AppState) {
    let status = state.lifecycle().cache_status().await;
    CACHE_AVAILABLE.set(i64::from(status.available));
    if let Some(pending) = status.queue_pending {
        QUEUE_PENDING.set(pending as i64);
    }

    let running = state.processor().is_some_and(|p| p.status().running);
    PROCESSOR_RUNNING.set(i64::from(running));
}

static UUID_SEGMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}")
        .unwrap()
});

static EMAIL_SEGMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"/[^/@]+@[^/]+(/|$)").unwrap());

/// Normalize a path for metric labels (replace ids and emails with placeholders).
pub fn normalize_path(path: &str) -> String {
    let result = UUID_SEGMENT.replace_all(path, "{id}");
    let result = EMAIL_SEGMENT.replace_all(&result, "/{email}$1");
    result.to_string()
}
