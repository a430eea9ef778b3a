use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

/// Errors from the attachment store.
#[derive(Debug, Error)]
pub enum BlobError {
    #[error("I/O error writing {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid blob name: {0:?}")]
    InvalidName(String),

    #[error("Blob store unavailable: {0}")]
    Unavailable(String),
}

/// An uploaded file as received from the client.
#[derive(Debug, Clone)]
pub struct Attachment {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl Attachment {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Stores attachment bytes and hands back a stable URL.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `attachment` under `owner_key` and return its public URL.
    async fn upload(&self, attachment: &Attachment, owner_key: &str) -> Result<String, BlobError>;

    /// Name of this backend, for diagnostics.
    fn name(&self) -> &'static str;
}
