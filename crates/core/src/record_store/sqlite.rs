//! SQLite-backed record store implementation.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use super::store::check_field_name;
use super::{Document, RecordStore, RecordStoreError};

/// SQLite-backed document store.
pub struct SqliteRecordStore {
    conn: Mutex<Connection>,
}

impl SqliteRecordStore {
    /// Create a new SQLite record store, creating the database file and tables if needed.
    pub fn new(path: &Path) -> Result<Self, RecordStoreError> {
        let conn = Connection::open(path).map_err(|e| RecordStoreError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite record store (useful for testing).
    pub fn in_memory() -> Result<Self, RecordStoreError> {
        let conn =
            Connection::open_in_memory().map_err(|e| RecordStoreError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), RecordStoreError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                collection TEXT NOT NULL,
                key TEXT NOT NULL,
                body TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (collection, key)
            );
            "#,
        )
        .map_err(|e| RecordStoreError::Database(e.to_string()))
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, RecordStoreError> {
        self.conn
            .lock()
            .map_err(|_| RecordStoreError::Database("connection lock poisoned".to_string()))
    }

    fn parse_body(body: &str) -> Result<Document, RecordStoreError> {
        serde_json::from_str(body).map_err(|e| RecordStoreError::Serialization(e.to_string()))
    }
}

/// Convert a JSON scalar into the value `json_extract` yields for it.
fn scalar_param(value: &Document) -> Result<Box<dyn rusqlite::ToSql>, RecordStoreError> {
    match value {
        Document::String(s) => Ok(Box::new(s.clone())),
        Document::Bool(b) => Ok(Box::new(i64::from(*b))),
        Document::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Box::new(i))
            } else if let Some(f) = n.as_f64() {
                Ok(Box::new(f))
            } else {
                Err(RecordStoreError::Serialization(format!(
                    "unsupported number: {}",
                    n
                )))
            }
        }
        other => Err(RecordStoreError::Serialization(format!(
            "query value must be a scalar, got {}",
            other
        ))),
    }
}

impl RecordStore for SqliteRecordStore {
    fn get(&self, collection: &str, key: &str) -> Result<Option<Document>, RecordStoreError> {
        let conn = self.conn()?;

        let body: Option<String> = conn
            .query_row(
                "SELECT body FROM documents WHERE collection = ? AND key = ?",
                params![collection, key],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| RecordStoreError::Database(e.to_string()))?;

        body.as_deref().map(Self::parse_body).transpose()
    }

    fn put(&self, collection: &str, key: &str, document: &Document) -> Result<(), RecordStoreError> {
        let body = serde_json::to_string(document)
            .map_err(|e| RecordStoreError::Serialization(e.to_string()))?;
        let conn = self.conn()?;

        conn.execute(
            "INSERT INTO documents (collection, key, body, updated_at) VALUES (?, ?, ?, ?)
             ON CONFLICT(collection, key) DO UPDATE SET body = excluded.body, updated_at = excluded.updated_at",
            params![collection, key, body, Utc::now().to_rfc3339()],
        )
        .map_err(|e| RecordStoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn query(
        &self,
        collection: &str,
        field: &str,
        value: &Document,
    ) -> Result<Vec<Document>, RecordStoreError> {
        check_field_name(field)?;
        let path = format!("$.{}", field);
        let conn = self.conn()?;

        let sql = if value.is_null() {
            "SELECT body FROM documents WHERE collection = ? AND json_extract(body, ?) IS NULL ORDER BY key"
        } else {
            "SELECT body FROM documents WHERE collection = ? AND json_extract(body, ?) = ? ORDER BY key"
        };

        let mut params: Vec<Box<dyn rusqlite::ToSql>> =
            vec![Box::new(collection.to_string()), Box::new(path)];
        if !value.is_null() {
            params.push(scalar_param(value)?);
        }
        let params_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let mut stmt = conn
            .prepare(sql)
            .map_err(|e| RecordStoreError::Database(e.to_string()))?;
        let bodies = stmt
            .query_map(params_refs.as_slice(), |row| row.get::<_, String>(0))
            .map_err(|e| RecordStoreError::Database(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| RecordStoreError::Database(e.to_string()))?;

        bodies.iter().map(|b| Self::parse_body(b)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn create_test_store() -> SqliteRecordStore {
        SqliteRecordStore::in_memory().expect("Failed to create in-memory store")
    }

    #[test]
    fn test_get_missing_returns_none() {
        let store = create_test_store();
        assert!(store.get("users", "nobody@x.com").unwrap().is_none());
    }

    #[test]
    fn test_put_then_get() {
        let store = create_test_store();
        let doc = json!({"email": "a@x.com", "role": "user"});
        store.put("users", "a@x.com", &doc).unwrap();

        assert_eq!(store.get("users", "a@x.com").unwrap(), Some(doc));
    }

    #[test]
    fn test_put_overwrites() {
        let store = create_test_store();
        store
            .put("users", "a@x.com", &json!({"role": "user"}))
            .unwrap();
        store
            .put("users", "a@x.com", &json!({"role": "technician"}))
            .unwrap();

        let doc = store.get("users", "a@x.com").unwrap().unwrap();
        assert_eq!(doc["role"], "technician");
    }

    #[test]
    fn test_collections_are_isolated() {
        let store = create_test_store();
        store.put("users", "k", &json!({"a": 1})).unwrap();
        assert!(store.get("ticket-archives", "k").unwrap().is_none());
    }

    #[test]
    fn test_query_by_string_field() {
        let store = create_test_store();
        store
            .put("users", "b@x.com", &json!({"email": "b@x.com", "role": "technician"}))
            .unwrap();
        store
            .put("users", "a@x.com", &json!({"email": "a@x.com", "role": "technician"}))
            .unwrap();
        store
            .put("users", "c@x.com", &json!({"email": "c@x.com", "role": "user"}))
            .unwrap();

        let techs = store.query("users", "role", &json!("technician")).unwrap();
        let emails: Vec<_> = techs.iter().map(|d| d["email"].as_str().unwrap()).collect();
        assert_eq!(emails, vec!["a@x.com", "b@x.com"]);
    }

    #[test]
    fn test_query_by_bool_and_number() {
        let store = create_test_store();
        store.put("c", "1", &json!({"flag": true, "n": 3})).unwrap();
        store.put("c", "2", &json!({"flag": false, "n": 4})).unwrap();

        assert_eq!(store.query("c", "flag", &json!(true)).unwrap().len(), 1);
        assert_eq!(store.query("c", "n", &json!(4)).unwrap().len(), 1);
    }

    #[test]
    fn test_query_rejects_bad_field() {
        let store = create_test_store();
        let result = store.query("users", "role') --", &json!("x"));
        assert!(matches!(result, Err(RecordStoreError::InvalidField(_))));
    }

    #[test]
    fn test_file_based_store() {
        let temp_dir = tempfile::tempdir().unwrap();
        let db_path = temp_dir.path().join("records.db");

        {
            let store = SqliteRecordStore::new(&db_path).unwrap();
            store.put("users", "a@x.com", &json!({"role": "user"})).unwrap();
        }

        let store = SqliteRecordStore::new(&db_path).unwrap();
        assert!(store.get("users", "a@x.com").unwrap().is_some());
    }
}
