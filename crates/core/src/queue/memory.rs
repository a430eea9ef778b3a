//! Process-local queue with visibility-timeout leases.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use super::types::{AckHandle, MessageQueue, QueueError, ReceivedMessage};

#[derive(Debug, Clone)]
struct StoredMessage {
    id: String,
    payload: Vec<u8>,
    attributes: HashMap<String, String>,
    delivery_count: u32,
}

#[derive(Debug)]
struct Lease {
    token: String,
    expires_at: Instant,
    message: StoredMessage,
}

#[derive(Debug, Default)]
struct QueueState {
    ready: VecDeque<StoredMessage>,
    in_flight: HashMap<String, Lease>,
}

impl QueueState {
    /// Return expired leases to the front of the ready queue, oldest first.
    fn reclaim_expired(&mut self, now: Instant) {
        let mut expired: Vec<String> = self
            .in_flight
            .iter()
            .filter(|(_, lease)| lease.expires_at <= now)
            .map(|(id, _)| id.clone())
            .collect();
        expired.sort();

        for id in expired.into_iter().rev() {
            if let Some(lease) = self.in_flight.remove(&id) {
                debug!(message_id = %id, "Lease expired, message visible again");
                self.ready.push_front(lease.message);
            }
        }
    }
}

/// In-memory [`MessageQueue`]. Messages are lost on restart.
pub struct MemoryMessageQueue {
    state: Mutex<QueueState>,
    visibility_timeout: Duration,
}

impl MemoryMessageQueue {
    pub fn new(visibility_timeout: Duration) -> Self {
        Self {
            state: Mutex::new(QueueState::default()),
            visibility_timeout,
        }
    }

    /// Messages currently leased to a consumer.
    pub async fn in_flight_count(&self) -> usize {
        self.state.lock().await.in_flight.len()
    }
}

impl Default for MemoryMessageQueue {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

#[async_trait]
impl MessageQueue for MemoryMessageQueue {
    async fn publish(
        &self,
        payload: Vec<u8>,
        attributes: HashMap<String, String>,
    ) -> Result<String, QueueError> {
        // Sortable ids keep reclaimed messages in publish order.
        let id = format!(
            "{:020}-{}",
            chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default(),
            Uuid::new_v4().simple()
        );
        self.state.lock().await.ready.push_back(StoredMessage {
            id: id.clone(),
            payload,
            attributes,
            delivery_count: 0,
        });
        Ok(id)
    }

    async fn pull_one(&self) -> Result<Option<ReceivedMessage>, QueueError> {
        let now = Instant::now();
        let mut state = self.state.lock().await;
        state.reclaim_expired(now);

        let Some(mut message) = state.ready.pop_front() else {
            return Ok(None);
        };
        message.delivery_count += 1;

        let token = Uuid::new_v4().to_string();
        let received = ReceivedMessage {
            message_id: message.id.clone(),
            payload: message.payload.clone(),
            attributes: message.attributes.clone(),
            delivery_count: message.delivery_count,
            ack_handle: AckHandle {
                message_id: message.id.clone(),
                lease_token: token.clone(),
            },
        };
        state.in_flight.insert(
            message.id.clone(),
            Lease {
                token,
                expires_at: now + self.visibility_timeout,
                message,
            },
        );
        Ok(Some(received))
    }

    async fn ack(&self, handle: &AckHandle) -> Result<(), QueueError> {
        let mut state = self.state.lock().await;
        match state.in_flight.get(&handle.message_id) {
            Some(lease) if lease.token == handle.lease_token => {
                state.in_flight.remove(&handle.message_id);
                Ok(())
            }
            _ => Err(QueueError::LeaseExpired {
                message_id: handle.message_id.clone(),
            }),
        }
    }

    async fn pending_count(&self) -> Result<usize, QueueError> {
        let state = self.state.lock().await;
        Ok(state.ready.len() + state.in_flight.len())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(priority: &str) -> HashMap<String, String> {
        HashMap::from([("priority".to_string(), priority.to_string())])
    }

    #[tokio::test]
    async fn test_pull_from_empty_queue_is_none() {
        let queue = MemoryMessageQueue::default();
        assert!(queue.pull_one().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_fifo_delivery_and_ack() {
        let queue = MemoryMessageQueue::default();
        let first = queue.publish(b"one".to_vec(), attrs("high")).await.unwrap();
        queue.publish(b"two".to_vec(), attrs("low")).await.unwrap();

        let msg = queue.pull_one().await.unwrap().unwrap();
        assert_eq!(msg.message_id, first);
        assert_eq!(msg.payload, b"one");
        assert_eq!(msg.attributes["priority"], "high");
        assert_eq!(msg.delivery_count, 1);

        queue.ack(&msg.ack_handle).await.unwrap();
        assert_eq!(queue.pending_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_leased_message_is_hidden_from_other_consumers() {
        let queue = MemoryMessageQueue::default();
        queue.publish(b"only".to_vec(), attrs("medium")).await.unwrap();

        let _leased = queue.pull_one().await.unwrap().unwrap();
        assert!(queue.pull_one().await.unwrap().is_none());
        assert_eq!(queue.in_flight_count().await, 1);
    }

    #[tokio::test]
    async fn test_unacked_message_is_redelivered_after_timeout() {
        let queue = MemoryMessageQueue::new(Duration::from_millis(30));
        queue.publish(b"retry".to_vec(), attrs("high")).await.unwrap();

        let first = queue.pull_one().await.unwrap().unwrap();
        tokio::time::sleep(Duration::from_millis(60)).await;

        let second = queue.pull_one().await.unwrap().unwrap();
        assert_eq!(second.message_id, first.message_id);
        assert_eq!(second.delivery_count, 2);
        assert_ne!(second.ack_handle.lease_token, first.ack_handle.lease_token);

        // The stale lease can no longer ack.
        assert!(matches!(
            queue.ack(&first.ack_handle).await,
            Err(QueueError::LeaseExpired { .. })
        ));
        queue.ack(&second.ack_handle).await.unwrap();
        assert_eq!(queue.pending_count().await.unwrap(), 0);
    }
}
