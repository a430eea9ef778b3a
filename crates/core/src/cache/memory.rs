//! Process-local priority cache.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::{BTreeSet, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::warn;

use super::score::score;
use super::traits::{CacheError, PriorityCache};
use crate::metrics::CACHE_SCAN_SKIPS;
use crate::ticket::Ticket;

#[derive(Debug, Default)]
struct CacheState {
    /// Ascending (score, id); one entry per id.
    order: BTreeSet<(i64, String)>,
    scores: HashMap<String, i64>,
    /// Serialized tickets, kept as JSON like the Redis backend.
    values: HashMap<String, String>,
}

impl CacheState {
    fn insert(&mut self, id: &str, score: i64, json: String) {
        if let Some(old) = self.scores.insert(id.to_string(), score) {
            self.order.remove(&(old, id.to_string()));
        }
        self.order.insert((score, id.to_string()));
        self.values.insert(id.to_string(), json);
    }

    fn remove(&mut self, id: &str) {
        if let Some(old) = self.scores.remove(id) {
            self.order.remove(&(old, id.to_string()));
        }
        self.values.remove(id);
    }
}

/// [`PriorityCache`] over a `BTreeSet` behind one `RwLock`.
#[derive(Debug, Default)]
pub struct InMemoryPriorityCache {
    state: RwLock<CacheState>,
}

impl InMemoryPriorityCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of ordering entries.
    pub fn len(&self) -> usize {
        self.read().map(|s| s.order.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, CacheState>, CacheError> {
        self.state
            .read()
            .map_err(|_| CacheError::Unavailable("cache lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, CacheState>, CacheError> {
        self.state
            .write()
            .map_err(|_| CacheError::Unavailable("cache lock poisoned".to_string()))
    }

    fn decode(id: &str, json: &str) -> Result<Ticket, CacheError> {
        serde_json::from_str(json).map_err(|e| CacheError::Corrupt {
            ticket_id: id.to_string(),
            reason: e.to_string(),
        })
    }

    #[cfg(test)]
    fn insert_raw(&self, id: &str, score: i64, raw: &str) {
        self.state
            .write()
            .unwrap()
            .insert(id, score, raw.to_string());
    }
}

#[async_trait]
impl PriorityCache for InMemoryPriorityCache {
    async fn upsert(&self, ticket: &Ticket) -> Result<(), CacheError> {
        let json = serde_json::to_string(ticket).map_err(|e| CacheError::Serialization {
            ticket_id: ticket.id.clone(),
            reason: e.to_string(),
        })?;
        let score = score(ticket.priority, ticket.date_uploaded);
        self.write()?.insert(&ticket.id, score, json);
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Ticket>, CacheError> {
        let state = self.read()?;
        state
            .values
            .get(id)
            .map(|json| Self::decode(id, json))
            .transpose()
    }

    async fn list_open_or_recent(
        &self,
        max_age: Duration,
        now: DateTime<Utc>,
    ) -> Result<Vec<Ticket>, CacheError> {
        let state = self.read()?;
        let mut tickets = Vec::with_capacity(state.order.len());

        for (_, id) in &state.order {
            let Some(json) = state.values.get(id) else {
                warn!(ticket_id = %id, "Ordered entry without a value, skipping");
                CACHE_SCAN_SKIPS.with_label_values(&[self.name(), "missing"]).inc();
                continue;
            };
            match Self::decode(id, json) {
                Ok(ticket) if ticket.is_open_or_recent(max_age, now) => tickets.push(ticket),
                Ok(_) => {}
                Err(e) => {
                    warn!(ticket_id = %id, "Skipping unreadable cache entry: {}", e);
                    CACHE_SCAN_SKIPS.with_label_values(&[self.name(), "corrupt"]).inc();
                }
            }
        }

        Ok(tickets)
    }

    async fn remove(&self, id: &str) -> Result<(), CacheError> {
        self.write()?.remove(id);
        Ok(())
    }

    async fn is_available(&self) -> bool {
        !self.state.is_poisoned()
    }

    async fn diagnostic_info(&self) -> String {
        match self.read() {
            Ok(state) => format!(
                "in-memory cache: {} ordered entries, {} values",
                state.order.len(),
                state.values.len()
            ),
            Err(e) => format!("in-memory cache: {}", e),
        }
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
