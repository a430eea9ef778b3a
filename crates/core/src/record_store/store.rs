//! Keyed-document storage trait.

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Collection holding `User` records keyed by email.
pub const USERS_COLLECTION: &str = "users";

/// Collection holding `ArchiveRecord`s keyed by ticket id.
pub const ARCHIVE_COLLECTION: &str = "ticket-archives";

/// A stored document.
pub type Document = serde_json::Value;

#[derive(Debug, Error)]
pub enum RecordStoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid query field: {0}")]
    InvalidField(String),
}

/// Durable keyed-document store.
///
/// `put` overwrites. There are no transactions across documents.
pub trait RecordStore: Send + Sync {
    /// Fetch a document, `None` if absent.
    fn get(&self, collection: &str, key: &str) -> Result<Option<Document>, RecordStoreError>;

    /// Insert or overwrite a document.
    fn put(&self, collection: &str, key: &str, document: &Document) -> Result<(), RecordStoreError>;

    /// All documents whose top-level `field` equals `value`, ordered by key.
    fn query(
        &self,
        collection: &str,
        field: &str,
        value: &Document,
    ) -> Result<Vec<Document>, RecordStoreError>;
}

/// Typed `get`.
pub fn get_as<T: DeserializeOwned>(
    store: &dyn RecordStore,
    collection: &str,
    key: &str,
) -> Result<Option<T>, RecordStoreError> {
    store
        .get(collection, key)?
        .map(|doc| {
            serde_json::from_value(doc).map_err(|e| RecordStoreError::Serialization(e.to_string()))
        })
        .transpose()
}

/// Typed `put`.
pub fn put_as<T: Serialize>(
    store: &dyn RecordStore,
    collection: &str,
    key: &str,
    value: &T,
) -> Result<(), RecordStoreError> {
    let doc =
        serde_json::to_value(value).map_err(|e| RecordStoreError::Serialization(e.to_string()))?;
    store.put(collection, key, &doc)
}

/// Query field names are interpolated into a JSON path, so keep them plain.
pub(crate) fn check_field_name(field: &str) -> Result<(), RecordStoreError> {
    if !field.is_empty() && field.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(())
    } else {
        Err(RecordStoreError::InvalidField(field.to_string()))
    }
}
