use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, params_from_iter, Connection, Row, TransactionBehavior};

use super::{AuditError, AuditFilter, AuditRecord, AuditStore, Page};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS audit_events (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        timestamp TEXT NOT NULL,
        event_type TEXT NOT NULL,
        ticket_id TEXT,
        actor TEXT,
        data TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_audit_events_timestamp ON audit_events(timestamp);
    CREATE INDEX IF NOT EXISTS idx_audit_events_ticket_id ON audit_events(ticket_id);
    CREATE INDEX IF NOT EXISTS idx_audit_events_actor ON audit_events(actor);
"#;

const INSERT: &str = "INSERT INTO audit_events (timestamp, event_type, ticket_id, actor, data) \
                      VALUES (?1, ?2, ?3, ?4, ?5)";

fn db(e: rusqlite::Error) -> AuditError {
    AuditError::Database(e.to_string())
}

/// Fixed-width timestamps so text order matches time order.
fn stamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// `WHERE` clause and its bound values. Every filter value binds as text.
fn where_clause(filter: &AuditFilter) -> (String, Vec<String>) {
    let conditions = [
        ("ticket_id = ?", filter.ticket_id.clone()),
        ("event_type = ?", filter.event_type.clone()),
        ("actor = ?", filter.actor.clone()),
        ("timestamp >= ?", filter.from.as_ref().map(stamp)),
        ("timestamp <= ?", filter.to.as_ref().map(stamp)),
    ];

    let (sql, values): (Vec<&str>, Vec<String>) = conditions
        .into_iter()
        .filter_map(|(sql, value)| value.map(|v| (sql, v)))
        .unzip();

    if sql.is_empty() {
        (String::new(), values)
    } else {
        (format!("WHERE {}", sql.join(" AND ")), values)
    }
}

fn read_record(row: &Row<'_>) -> Result<AuditRecord, AuditError> {
    let timestamp: String = row.get(1).map_err(db)?;
    let data: String = row.get(5).map_err(db)?;
    Ok(AuditRecord {
        id: row.get(0).map_err(db)?,
        timestamp: DateTime::parse_from_rfc3339(&timestamp)
            .map_err(|e| AuditError::Database(format!("bad timestamp {:?}: {}", timestamp, e)))?
            .with_timezone(&Utc),
        event_type: row.get(2).map_err(db)?,
        ticket_id: row.get(3).map_err(db)?,
        actor: row.get(4).map_err(db)?,
        data: serde_json::from_str(&data).map_err(|e| AuditError::Serialization(e.to_string()))?,
    })
}

/// Audit trail in the service's SQLite database.
pub struct SqliteAuditStore {
    conn: Mutex<Connection>,
}

impl SqliteAuditStore {
    pub fn new(path: &Path) -> Result<Self, AuditError> {
        Self::with_connection(Connection::open(path).map_err(db)?)
    }

    pub fn in_memory() -> Result<Self, AuditError> {
        Self::with_connection(Connection::open_in_memory().map_err(db)?)
    }

    fn with_connection(conn: Connection) -> Result<Self, AuditError> {
        conn.execute_batch(SCHEMA).map_err(db)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, AuditError> {
        self.conn.lock().map_err(|_| AuditError::LockPoisoned)
    }
}

impl AuditStore for SqliteAuditStore {
    fn insert_batch(&self, records: &[AuditRecord]) -> Result<Vec<i64>, AuditError> {
        let encoded = records
            .iter()
            .map(|r| serde_json::to_string(&r.data))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| AuditError::Serialization(e.to_string()))?;

        let mut conn = self.conn()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(db)?;
        let mut ids = Vec::with_capacity(records.len());
        {
            let mut stmt = tx.prepare_cached(INSERT).map_err(db)?;
            for (record, data) in records.iter().zip(&encoded) {
                stmt.execute(params![
                    stamp(&record.timestamp),
                    record.event_type,
                    record.ticket_id,
                    record.actor,
                    data,
                ])
                .map_err(db)?;
                ids.push(tx.last_insert_rowid());
            }
        }
        tx.commit().map_err(db)?;
        Ok(ids)
    }

    fn query(&self, filter: &AuditFilter, page: Page) -> Result<Vec<AuditRecord>, AuditError> {
        let (clause, values) = where_clause(filter);
        // Limit and offset are integers from `Page`, never client text.
        let sql = format!(
            "SELECT id, timestamp, event_type, ticket_id, actor, data FROM audit_events {} \
             ORDER BY timestamp DESC, id DESC LIMIT {} OFFSET {}",
            clause, page.limit, page.offset
        );

        let conn = self.conn()?;
        let mut stmt = conn.prepare(&sql).map_err(db)?;
        let mut rows = stmt.query(params_from_iter(values.iter())).map_err(db)?;

        let mut records = Vec::new();
        while let Some(row) = rows.next().map_err(db)? {
            records.push(read_record(row)?);
        }
        Ok(records)
    }

    fn count(&self, filter: &AuditFilter) -> Result<i64, AuditError> {
        let (clause, values) = where_clause(filter);
        let sql = format!("SELECT COUNT(*) FROM audit_events {}", clause);
        self.conn()?
            .query_row(&sql, params_from_iter(values.iter()), |row| row.get(0))
            .map_err(db)
    }
}
