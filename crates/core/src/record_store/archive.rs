//! Typed access to the ticket archive collection.

use std::sync::Arc;

use super::{get_as, put_as, RecordStore, RecordStoreError, ARCHIVE_COLLECTION};
use crate::ticket::ArchiveRecord;

/// Permanent archive of closed tickets, keyed by ticket id.
///
/// Writes overwrite, so archiving the same ticket twice is harmless.
#[derive(Clone)]
pub struct TicketArchive {
    store: Arc<dyn RecordStore>,
}

impl TicketArchive {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub fn write(&self, record: &ArchiveRecord) -> Result<(), RecordStoreError> {
        put_as(
            self.store.as_ref(),
            ARCHIVE_COLLECTION,
            &record.ticket.id,
            record,
        )
    }

    pub fn get(&self, ticket_id: &str) -> Result<Option<ArchiveRecord>, RecordStoreError> {
        get_as(self.store.as_ref(), ARCHIVE_COLLECTION, ticket_id)
    }

    /// Archived tickets closed by a given technician.
    pub fn closed_by(&self, technician_email: &str) -> Result<Vec<ArchiveRecord>, RecordStoreError> {
        self.store
            .query(
                ARCHIVE_COLLECTION,
                "closed_by",
                &serde_json::Value::String(technician_email.to_string()),
            )?
            .into_iter()
            .map(|doc| {
                serde_json::from_value(doc)
                    .map_err(|e| RecordStoreError::Serialization(e.to_string()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record_store::MemoryRecordStore;
    use crate::ticket::{Ticket, TicketInput, TicketPriority, TicketStatus};
    use chrono::{Duration, Utc};

    fn closed_ticket() -> Ticket {
        let mut ticket = Ticket::new(
            TicketInput::new("Old VPN issue", "", TicketPriority::Medium),
            "u@x.com",
            Utc::now() - Duration::days(10),
        );
        ticket.status = TicketStatus::Closed;
        ticket
    }

    #[test]
    fn test_write_and_get() {
        let archive = TicketArchive::new(Arc::new(MemoryRecordStore::new()));
        let record = ArchiveRecord::new(closed_ticket(), "tech@x.com", Utc::now());
        archive.write(&record).unwrap();

        let loaded = archive.get(&record.ticket.id).unwrap().unwrap();
        assert_eq!(loaded, record);
    }

    #[test]
    fn test_rewrite_is_idempotent() {
        let store = Arc::new(MemoryRecordStore::new());
        let archive = TicketArchive::new(store.clone());
        let record = ArchiveRecord::new(closed_ticket(), "tech@x.com", Utc::now());
        archive.write(&record).unwrap();
        archive.write(&record).unwrap();

        assert_eq!(store.len(ARCHIVE_COLLECTION), 1);
    }

    #[test]
    fn test_closed_by() {
        let archive = TicketArchive::new(Arc::new(MemoryRecordStore::new()));
        archive
            .write(&ArchiveRecord::new(closed_ticket(), "t1@x.com", Utc::now()))
            .unwrap();
        archive
            .write(&ArchiveRecord::new(closed_ticket(), "t2@x.com", Utc::now()))
            .unwrap();

        let records = archive.closed_by("t1@x.com").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].closed_by, "t1@x.com");
    }
}
