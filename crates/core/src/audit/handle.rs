use chrono::{DateTime, Utc};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::warn;

use super::AuditEvent;
use crate::metrics::AUDIT_EVENTS_DROPPED;

/// An event stamped at the moment it was emitted.
#[derive(Debug, Clone)]
pub struct AuditEventEnvelope {
    pub timestamp: DateTime<Utc>,
    pub event: AuditEvent,
}

impl AuditEventEnvelope {
    fn stamped(event: AuditEvent) -> Self {
        Self {
            timestamp: Utc::now(),
            event,
        }
    }
}

/// Sender side of the audit trail. Clone it freely.
///
/// Emitting never fails the caller: a lost event is logged and counted.
#[derive(Clone)]
pub struct AuditHandle {
    tx: mpsc::Sender<AuditEventEnvelope>,
}

impl AuditHandle {
    pub fn new(tx: mpsc::Sender<AuditEventEnvelope>) -> Self {
        Self { tx }
    }

    /// Waits for channel capacity.
    pub async fn emit(&self, event: AuditEvent) {
        if let Err(e) = self.tx.send(AuditEventEnvelope::stamped(event)).await {
            dropped(&e.0.event, "writer_gone");
        }
    }

    /// For call sites that cannot await. Returns false if the event was dropped.
    pub fn try_emit(&self, event: AuditEvent) -> bool {
        match self.tx.try_send(AuditEventEnvelope::stamped(event)) {
            Ok(()) => true,
            Err(TrySendError::Full(envelope)) => {
                dropped(&envelope.event, "channel_full");
                false
            }
            Err(TrySendError::Closed(envelope)) => {
                dropped(&envelope.event, "writer_gone");
                false
            }
        }
    }
}

fn dropped(event: &AuditEvent, reason: &'static str) {
    warn!(
        event_type = event.event_type(),
        ticket_id = event.ticket_id().unwrap_or("-"),
        reason,
        "Audit event dropped"
    );
    AUDIT_EVENTS_DROPPED.with_label_values(&[reason]).inc();
}
