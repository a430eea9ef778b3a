//! Process-local record store.

use std::collections::BTreeMap;
use std::sync::RwLock;

use super::store::check_field_name;
use super::{Document, RecordStore, RecordStoreError};

/// Record store kept in memory. Contents are lost on restart.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    documents: RwLock<BTreeMap<(String, String), Document>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in a collection.
    pub fn len(&self, collection: &str) -> usize {
        self.documents
            .read()
            .map(|docs| docs.keys().filter(|(c, _)| c == collection).count())
            .unwrap_or(0)
    }

    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }
}

fn poisoned() -> RecordStoreError {
    RecordStoreError::Database("record store lock poisoned".to_string())
}

impl RecordStore for MemoryRecordStore {
    fn get(&self, collection: &str, key: &str) -> Result<Option<Document>, RecordStoreError> {
        let docs = self.documents.read().map_err(|_| poisoned())?;
        Ok(docs
            .get(&(collection.to_string(), key.to_string()))
            .cloned())
    }

    fn put(&self, collection: &str, key: &str, document: &Document) -> Result<(), RecordStoreError> {
        let mut docs = self.documents.write().map_err(|_| poisoned())?;
        docs.insert((collection.to_string(), key.to_string()), document.clone());
        Ok(())
    }

    fn query(
        &self,
        collection: &str,
        field: &str,
        value: &Document,
    ) -> Result<Vec<Document>, RecordStoreError> {
        check_field_name(field)?;
        let docs = self.documents.read().map_err(|_| poisoned())?;
        Ok(docs
            .iter()
            .filter(|((c, _), doc)| {
                c == collection && doc.get(field).unwrap_or(&Document::Null) == value
            })
            .map(|(_, doc)| doc.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_put_get_query() {
        let store = MemoryRecordStore::new();
        store
            .put("users", "a@x.com", &json!({"role": "technician"}))
            .unwrap();
        store.put("users", "b@x.com", &json!({"role": "user"})).unwrap();

        assert_eq!(store.len("users"), 2);
        assert!(store.get("users", "a@x.com").unwrap().is_some());
        assert!(store.get("users", "z@x.com").unwrap().is_none());
        assert_eq!(
            store
                .query("users", "role", &json!("technician"))
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn test_query_missing_field_matches_null() {
        let store = MemoryRecordStore::new();
        store.put("c", "1", &json!({"a": 1})).unwrap();
        assert_eq!(store.query("c", "b", &Document::Null).unwrap().len(), 1);
    }
}
