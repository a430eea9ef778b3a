use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;

/// Attribute carrying the ticket priority (`high` | `medium` | `low`).
pub const PRIORITY_ATTRIBUTE: &str = "priority";

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Queue unavailable: {0}")]
    Unavailable(String),

    #[error("Queue database error: {0}")]
    Database(String),

    /// The lease was reclaimed by a later delivery; the message will be seen again.
    #[error("Lease expired for message {message_id}")]
    LeaseExpired { message_id: String },
}

/// Proof of delivery, needed to acknowledge a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AckHandle {
    pub message_id: String,
    pub lease_token: String,
}

/// A message handed to one consumer.
///
/// Until acked it becomes visible again once the visibility timeout passes.
#[derive(Debug, Clone)]
pub struct ReceivedMessage {
    pub message_id: String,
    pub payload: Vec<u8>,
    pub attributes: HashMap<String, String>,
    /// 1 on first delivery.
    pub delivery_count: u32,
    pub ack_handle: AckHandle,
}

/// Competing-consumer queue with at-least-once delivery.
#[async_trait]
pub trait MessageQueue: Send + Sync {
    /// Enqueue a payload, returning its message id.
    async fn publish(
        &self,
        payload: Vec<u8>,
        attributes: HashMap<String, String>,
    ) -> Result<String, QueueError>;

    /// Lease the oldest visible message, `None` when nothing is ready.
    async fn pull_one(&self) -> Result<Option<ReceivedMessage>, QueueError>;

    /// Delete a leased message.
    async fn ack(&self, handle: &AckHandle) -> Result<(), QueueError>;

    /// Messages not yet acked, leased or not.
    async fn pending_count(&self) -> Result<usize, QueueError>;

    /// Name of this backend, for diagnostics.
    fn name(&self) -> &'static str;
}
