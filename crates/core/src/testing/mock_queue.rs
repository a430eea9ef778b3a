//! Mock message queue for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::queue::{AckHandle, MemoryMessageQueue, MessageQueue, QueueError, ReceivedMessage};

/// [`MemoryMessageQueue`] with switchable outages and recorded acks.
#[derive(Default)]
pub struct MockMessageQueue {
    inner: MemoryMessageQueue,
    publish_unavailable: Arc<RwLock<bool>>,
    pull_unavailable: Arc<RwLock<bool>>,
    acks: Arc<RwLock<Vec<AckHandle>>>,
}

impl MockMessageQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Short leases let tests observe redelivery.
    pub fn with_visibility_timeout(timeout: Duration) -> Self {
        Self {
            inner: MemoryMessageQueue::new(timeout),
            ..Self::default()
        }
    }

    /// Make every `publish` fail until cleared.
    pub async fn set_publish_unavailable(&self, down: bool) {
        *self.publish_unavailable.write().await = down;
    }

    /// Make every `pull_one` fail until cleared.
    pub async fn set_pull_unavailable(&self, down: bool) {
        *self.pull_unavailable.write().await = down;
    }

    /// Acks that succeeded, in order.
    pub async fn recorded_acks(&self) -> Vec<AckHandle> {
        self.acks.read().await.clone()
    }

    pub async fn in_flight_count(&self) -> usize {
        self.inner.in_flight_count().await
    }
}

#[async_trait]
impl MessageQueue for MockMessageQueue {
    async fn publish(
        &self,
        payload: Vec<u8>,
        attributes: HashMap<String, String>,
    ) -> Result<String, QueueError> {
        if *self.publish_unavailable.read().await {
            return Err(QueueError::Unavailable("mock queue is down".to_string()));
        }
        self.inner.publish(payload, attributes).await
    }

    async fn pull_one(&self) -> Result<Option<ReceivedMessage>, QueueError> {
        if *self.pull_unavailable.read().await {
            return Err(QueueError::Unavailable("mock queue is down".to_string()));
        }
        self.inner.pull_one().await
    }

    async fn ack(&self, handle: &AckHandle) -> Result<(), QueueError> {
        self.inner.ack(handle).await?;
        self.acks.write().await.push(handle.clone());
        Ok(())
    }

    async fn pending_count(&self) -> Result<usize, QueueError> {
        self.inner.pending_count().await
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
