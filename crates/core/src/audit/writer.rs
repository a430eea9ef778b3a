use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{error, info};

use super::{AuditEventEnvelope, AuditHandle, AuditRecord, AuditStore};
use crate::metrics::AUDIT_EVENTS_DROPPED;

/// Events written per store call.
const MAX_BATCH: usize = 64;

/// Drains the audit channel into an [`AuditStore`].
///
/// Events that queued up while the previous write ran go to the store
/// together, so a burst of lifecycle activity costs one transaction.
pub struct AuditWriter {
    rx: mpsc::Receiver<AuditEventEnvelope>,
    store: Arc<dyn AuditStore>,
}

impl AuditWriter {
    pub fn new(rx: mpsc::Receiver<AuditEventEnvelope>, store: Arc<dyn AuditStore>) -> Self {
        Self { rx, store }
    }

    /// Runs until every [`AuditHandle`] is dropped and the channel is empty.
    pub async fn run(mut self) {
        info!("Audit writer started");

        let mut pending = Vec::with_capacity(MAX_BATCH);
        while self.rx.recv_many(&mut pending, MAX_BATCH).await > 0 {
            let records: Vec<AuditRecord> = pending
                .drain(..)
                .map(|envelope| AuditRecord::new(envelope.timestamp, envelope.event))
                .collect();

            if let Err(e) = self.store.insert_batch(&records) {
                error!(count = records.len(), "Failed to write audit events: {}", e);
                AUDIT_EVENTS_DROPPED
                    .with_label_values(&["store_error"])
                    .inc_by(records.len() as u64);
            }
        }

        info!("Audit writer stopped");
    }
}

/// Wire a handle to a writer over a bounded channel.
///
/// Spawn the writer with `tokio::spawn(writer.run())`.
pub fn create_audit_system(
    store: Arc<dyn AuditStore>,
    buffer_size: usize,
) -> (AuditHandle, AuditWriter) {
    let (tx, rx) = mpsc::channel(buffer_size);
    (AuditHandle::new(tx), AuditWriter::new(rx, store))
}
