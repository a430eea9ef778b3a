use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::ticket::Ticket;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache unavailable: {0}")]
    Unavailable(String),

    #[error("Cache operation timed out after {0} ms")]
    Timeout(u64),

    #[error("Failed to serialize ticket {ticket_id}: {reason}")]
    Serialization { ticket_id: String, reason: String },

    #[error("Corrupt cache entry for ticket {ticket_id}: {reason}")]
    Corrupt { ticket_id: String, reason: String },
}

/// Ordered index of working tickets.
///
/// Implementations keep at most one ordering entry per ticket id and must be
/// safe under concurrent callers.
#[async_trait]
pub trait PriorityCache: Send + Sync {
    /// Store or replace the ticket and its ordering entry.
    async fn upsert(&self, ticket: &Ticket) -> Result<(), CacheError>;

    /// Point lookup. A miss is `Ok(None)`.
    async fn get(&self, id: &str) -> Result<Option<Ticket>, CacheError>;

    /// Tickets in ascending score order that are open or were uploaded
    /// no more than `max_age` before `now`.
    ///
    /// Entries that cannot be resolved are skipped, not fatal.
    async fn list_open_or_recent(
        &self,
        max_age: Duration,
        now: DateTime<Utc>,
    ) -> Result<Vec<Ticket>, CacheError>;

    /// Delete the ticket. Removing an absent id is a no-op.
    async fn remove(&self, id: &str) -> Result<(), CacheError>;

    /// Liveness probe. Never fails.
    async fn is_available(&self) -> bool;

    /// Human-readable state summary. Never fails.
    async fn diagnostic_info(&self) -> String;

    /// Name of this backend, for diagnostics and metrics.
    fn name(&self) -> &'static str;
}
