//! Mock record store for testing.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::record_store::{Document, MemoryRecordStore, RecordStore, RecordStoreError};

/// [`MemoryRecordStore`] whose writes can be made to fail.
#[derive(Default)]
pub struct MockRecordStore {
    inner: MemoryRecordStore,
    fail_puts: AtomicBool,
    fail_reads: AtomicBool,
}

impl MockRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Documents stored in `collection`.
    pub fn len(&self, collection: &str) -> usize {
        self.inner.len(collection)
    }

    fn read_guard(&self) -> Result<(), RecordStoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(RecordStoreError::Database("mock read failure".to_string()));
        }
        Ok(())
    }
}

impl RecordStore for MockRecordStore {
    fn get(&self, collection: &str, key: &str) -> Result<Option<Document>, RecordStoreError> {
        self.read_guard()?;
        self.inner.get(collection, key)
    }

    fn put(&self, collection: &str, key: &str, document: &Document) -> Result<(), RecordStoreError> {
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(RecordStoreError::Database("mock write failure".to_string()));
        }
        self.inner.put(collection, key, document)
    }

    fn query(
        &self,
        collection: &str,
        field: &str,
        value: &Document,
    ) -> Result<Vec<Document>, RecordStoreError> {
        self.read_guard()?;
        self.inner.query(collection, field, value)
    }
}
