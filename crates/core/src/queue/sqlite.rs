//! Durable SQLite-backed queue.
//!
//! A pull claims the oldest visible row inside an IMMEDIATE transaction, so
//! two consumers sharing the database file never lease the same message.

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use uuid::Uuid;

use super::types::{AckHandle, MessageQueue, QueueError, ReceivedMessage};

pub struct SqliteMessageQueue {
    conn: Mutex<Connection>,
    visibility_timeout: Duration,
}

impl SqliteMessageQueue {
    pub fn new(path: &Path, visibility_timeout: Duration) -> Result<Self, QueueError> {
        let conn = Connection::open(path).map_err(|e| QueueError::Database(e.to_string()))?;
        Self::from_connection(conn, visibility_timeout)
    }

    pub fn in_memory(visibility_timeout: Duration) -> Result<Self, QueueError> {
        let conn = Connection::open_in_memory().map_err(|e| QueueError::Database(e.to_string()))?;
        Self::from_connection(conn, visibility_timeout)
    }

    fn from_connection(conn: Connection, visibility_timeout: Duration) -> Result<Self, QueueError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS queue_messages (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                payload BLOB NOT NULL,
                attributes TEXT NOT NULL,
                enqueued_at TEXT NOT NULL,
                delivery_count INTEGER NOT NULL DEFAULT 0,
                lease_token TEXT,
                lease_expires_at INTEGER
            );

            CREATE INDEX IF NOT EXISTS idx_queue_messages_lease ON queue_messages(lease_expires_at);
            "#,
        )
        .map_err(|e| QueueError::Database(e.to_string()))?;

        Ok(Self {
            conn: Mutex::new(conn),
            visibility_timeout,
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, QueueError> {
        self.conn
            .lock()
            .map_err(|_| QueueError::Unavailable("queue connection lock poisoned".to_string()))
    }
}

fn db_err(e: rusqlite::Error) -> QueueError {
    QueueError::Database(e.to_string())
}

#[async_trait]
impl MessageQueue for SqliteMessageQueue {
    async fn publish(
        &self,
        payload: Vec<u8>,
        attributes: HashMap<String, String>,
    ) -> Result<String, QueueError> {
        let id = Uuid::new_v4().to_string();
        let attributes_json = serde_json::to_string(&attributes)
            .map_err(|e| QueueError::Database(format!("attributes: {}", e)))?;

        self.conn()?
            .execute(
                "INSERT INTO queue_messages (id, payload, attributes, enqueued_at) VALUES (?, ?, ?, ?)",
                params![id, payload, attributes_json, Utc::now().to_rfc3339()],
            )
            .map_err(db_err)?;

        Ok(id)
    }

    async fn pull_one(&self) -> Result<Option<ReceivedMessage>, QueueError> {
        let now_ms = Utc::now().timestamp_millis();
        let lease_until = now_ms + self.visibility_timeout.as_millis() as i64;
        let token = Uuid::new_v4().to_string();

        let mut conn = self.conn()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(db_err)?;

        let row = tx
            .query_row(
                "SELECT seq, id, payload, attributes, delivery_count FROM queue_messages
                 WHERE lease_expires_at IS NULL OR lease_expires_at <= ?
                 ORDER BY seq LIMIT 1",
                params![now_ms],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, Vec<u8>>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, u32>(4)?,
                    ))
                },
            )
            .optional()
            .map_err(db_err)?;

        let Some((seq, id, payload, attributes_json, delivery_count)) = row else {
            return Ok(None);
        };

        tx.execute(
            "UPDATE queue_messages
             SET lease_token = ?, lease_expires_at = ?, delivery_count = delivery_count + 1
             WHERE seq = ?",
            params![token, lease_until, seq],
        )
        .map_err(db_err)?;
        tx.commit().map_err(db_err)?;

        // Unreadable attributes never block delivery of the payload.
        let attributes = serde_json::from_str(&attributes_json).unwrap_or_else(|e| {
            tracing::warn!(message_id = %id, "Dropping unreadable message attributes: {}", e);
            HashMap::new()
        });

        Ok(Some(ReceivedMessage {
            message_id: id.clone(),
            payload,
            attributes,
            delivery_count: delivery_count + 1,
            ack_handle: AckHandle {
                message_id: id,
                lease_token: token,
            },
        }))
    }

    async fn ack(&self, handle: &AckHandle) -> Result<(), QueueError> {
        let deleted = self
            .conn()?
            .execute(
                "DELETE FROM queue_messages WHERE id = ? AND lease_token = ?",
                params![handle.message_id, handle.lease_token],
            )
            .map_err(db_err)?;

        if deleted == 0 {
            return Err(QueueError::LeaseExpired {
                message_id: handle.message_id.clone(),
            });
        }
        Ok(())
    }

    async fn pending_count(&self) -> Result<usize, QueueError> {
        let count: i64 = self
            .conn()?
            .query_row("SELECT COUNT(*) FROM queue_messages", [], |row| row.get(0))
            .map_err(db_err)?;
        Ok(count as usize)
    }

    fn name(&self) -> &'static str {
        "sqlite"
    }
}
