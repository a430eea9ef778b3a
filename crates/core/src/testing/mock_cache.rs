//! Mock priority cache for testing.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::cache::{CacheError, InMemoryPriorityCache, PriorityCache};
use crate::ticket::Ticket;

/// [`InMemoryPriorityCache`] that can be switched off.
#[derive(Default)]
pub struct MockPriorityCache {
    inner: InMemoryPriorityCache,
    unavailable: Arc<RwLock<bool>>,
    /// Fail only `remove`, to simulate a crash between archive and evict.
    remove_unavailable: Arc<RwLock<bool>>,
}

impl MockPriorityCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_unavailable(&self, down: bool) {
        *self.unavailable.write().await = down;
    }

    pub async fn set_remove_unavailable(&self, down: bool) {
        *self.remove_unavailable.write().await = down;
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    async fn check(&self) -> Result<(), CacheError> {
        if *self.unavailable.read().await {
            return Err(CacheError::Unavailable("mock cache is down".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl PriorityCache for MockPriorityCache {
    async fn upsert(&self, ticket: &Ticket) -> Result<(), CacheError> {
        self.check().await?;
        self.inner.upsert(ticket).await
    }

    async fn get(&self, id: &str) -> Result<Option<Ticket>, CacheError> {
        self.check().await?;
        self.inner.get(id).await
    }

    async fn list_open_or_recent(
        &self,
        max_age: Duration,
        now: DateTime<Utc>,
    ) -> Result<Vec<Ticket>, CacheError> {
        self.check().await?;
        self.inner.list_open_or_recent(max_age, now).await
    }

    async fn remove(&self, id: &str) -> Result<(), CacheError> {
        self.check().await?;
        if *self.remove_unavailable.read().await {
            return Err(CacheError::Unavailable("mock cache remove is down".to_string()));
        }
        self.inner.remove(id).await
    }

    async fn is_available(&self) -> bool {
        !*self.unavailable.read().await
    }

    async fn diagnostic_info(&self) -> String {
        if *self.unavailable.read().await {
            "mock cache: unavailable".to_string()
        } else {
            format!("mock cache: {} entries", self.inner.len())
        }
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
