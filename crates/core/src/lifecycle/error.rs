//! Errors surfaced by the ticket lifecycle.

use thiserror::Error;

use crate::blob::BlobError;
use crate::cache::CacheError;
use crate::queue::QueueError;
use crate::record_store::RecordStoreError;
use crate::ticket::{TicketStatus, ValidationError};
use crate::user::UserError;

/// Coarse classification used by callers to pick a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    InvalidTransition,
    /// A collaborator (queue, cache, record store, blob store) is down.
    DependencyUnavailable,
}

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("ticket not found: {ticket_id}")]
    NotFound { ticket_id: String },

    #[error("ticket {ticket_id} cannot move from {from} to {to}")]
    InvalidTransition {
        ticket_id: String,
        from: TicketStatus,
        to: TicketStatus,
    },

    /// The queue refused the ticket; it was never recorded.
    #[error("failed to publish ticket: {0}")]
    Publish(#[source] QueueError),

    /// The queue could not be read; pending tickets remain queued.
    #[error("queue unavailable: {0}")]
    Queue(#[source] QueueError),

    /// The cache failed; queued data is safe and will be redelivered.
    #[error("priority cache unavailable: {0}")]
    Cache(#[from] CacheError),

    #[error("record store unavailable: {0}")]
    RecordStore(#[from] RecordStoreError),

    #[error("attachment upload failed: {0}")]
    BlobStore(#[from] BlobError),

    #[error("failed to encode ticket {ticket_id}: {reason}")]
    Encode { ticket_id: String, reason: String },
}

impl LifecycleError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            Self::Publish(_)
            | Self::Queue(_)
            | Self::Cache(_)
            | Self::RecordStore(_)
            | Self::BlobStore(_)
            | Self::Encode { .. } => ErrorKind::DependencyUnavailable,
        }
    }
}

impl From<UserError> for LifecycleError {
    fn from(e: UserError) -> Self {
        match e {
            UserError::Validation(v) => Self::Validation(v),
            UserError::RecordStore(s) => Self::RecordStore(s),
        }
    }
}
