//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Ticket intake (creation, publish failures, attachments)
//! - Queue processing (outcomes)
//! - Closure (archive vs retain)
//! - Priority cache scans
//! - Audit delivery

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Intake
// =============================================================================

/// Tickets published to the queue, by priority.
pub static TICKETS_CREATED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("helpdesk_tickets_created_total", "Tickets published to the queue"),
        &["priority"],
    )
    .unwrap()
});

/// Tickets lost because the queue rejected the publish.
pub static TICKET_PUBLISH_FAILURES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "helpdesk_ticket_publish_failures_total",
        "Ticket creations that failed to publish",
    )
    .unwrap()
});

/// Attachment uploads by result.
pub static ATTACHMENT_UPLOADS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("helpdesk_attachment_uploads_total", "Attachment uploads"),
        &["result"], // "ok", "failed", "orphaned"
    )
    .unwrap()
});

// =============================================================================
// Processing
// =============================================================================

/// Queue messages handled by the processor, by outcome.
pub static QUEUE_MESSAGES_PROCESSED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "helpdesk_queue_messages_processed_total",
            "Queue messages handled by the processor",
        ),
        &["outcome"], // "processed", "discarded", "cache_error"
    )
    .unwrap()
});

/// Delivery count of processed messages; values above 1 are redeliveries.
pub static QUEUE_DELIVERY_COUNT: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "helpdesk_queue_delivery_count",
            "Delivery attempts per processed message",
        )
        .buckets(vec![1.0, 2.0, 3.0, 5.0, 10.0]),
        &[],
    )
    .unwrap()
});

// =============================================================================
// Closure
// =============================================================================

/// Ticket closures by outcome.
pub static TICKETS_CLOSED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("helpdesk_tickets_closed_total", "Ticket closures"),
        &["outcome"], // "archived", "retained"
    )
    .unwrap()
});

// =============================================================================
// Priority cache
// =============================================================================

/// Entries skipped during a scan because they could not be resolved.
pub static CACHE_SCAN_SKIPS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "helpdesk_cache_scan_skips_total",
            "Cache entries skipped while listing tickets",
        ),
        &["backend", "reason"], // reason: "missing", "corrupt"
    )
    .unwrap()
});

// =============================================================================
// Audit
// =============================================================================

/// Audit events that never reached the store.
pub static AUDIT_EVENTS_DROPPED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "helpdesk_audit_events_dropped_total",
            "Audit events dropped before being stored",
        ),
        &["reason"], // "channel_full", "writer_gone", "store_error"
    )
    .unwrap()
});

/// Get all core metrics for registration.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(TICKETS_CREATED.clone()),
        Box::new(TICKET_PUBLISH_FAILURES.clone()),
        Box::new(ATTACHMENT_UPLOADS.clone()),
        Box::new(QUEUE_MESSAGES_PROCESSED.clone()),
        Box::new(QUEUE_DELIVERY_COUNT.clone()),
        Box::new(TICKETS_CLOSED.clone()),
        Box::new(CACHE_SCAN_SKIPS.clone()),
        Box::new(AUDIT_EVENTS_DROPPED.clone()),
    ]
}
