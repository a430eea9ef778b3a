//! Mock blob store for testing.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::blob::{Attachment, BlobError, BlobStore};

/// An upload that reached the store.
#[derive(Debug, Clone)]
pub struct RecordedUpload {
    pub owner_key: String,
    pub file_name: String,
    pub content_type: String,
    pub size: usize,
    pub url: String,
}

/// Records uploads and can fail after a set number of successes.
#[derive(Default)]
pub struct MockBlobStore {
    uploads: Arc<RwLock<Vec<RecordedUpload>>>,
    /// `Some(n)`: the (n+1)th and later uploads fail.
    fail_after: Arc<RwLock<Option<usize>>>,
}

impl MockBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn fail_after(&self, successes: usize) {
        *self.fail_after.write().await = Some(successes);
    }

    pub async fn recorded_uploads(&self) -> Vec<RecordedUpload> {
        self.uploads.read().await.clone()
    }
}

#[async_trait]
impl BlobStore for MockBlobStore {
    async fn upload(&self, attachment: &Attachment, owner_key: &str) -> Result<String, BlobError> {
        let mut uploads = self.uploads.write().await;
        if let Some(limit) = *self.fail_after.read().await {
            if uploads.len() >= limit {
                return Err(BlobError::Unavailable("mock blob store is down".to_string()));
            }
        }

        let url = format!(
            "mock://blobs/{}/{}_{}",
            owner_key,
            uploads.len(),
            attachment.file_name
        );
        uploads.push(RecordedUpload {
            owner_key: owner_key.to_string(),
            file_name: attachment.file_name.clone(),
            content_type: attachment.content_type.clone(),
            size: attachment.len(),
            url: url.clone(),
        });
        Ok(url)
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
