//! Filesystem-backed blob store.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;
use uuid::Uuid;

use super::traits::{Attachment, BlobError, BlobStore};

/// Writes attachments to `<root>/<owner>/<uuid>_<file name>`.
pub struct FsBlobStore {
    root: PathBuf,
    public_base_url: String,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Keep a single safe path segment: no separators, no leading dots.
fn sanitize_segment(raw: &str) -> Result<String, BlobError> {
    let cleaned: String = raw
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | '@') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.').to_string();

    if cleaned.is_empty() {
        return Err(BlobError::InvalidName(raw.to_string()));
    }
    Ok(cleaned)
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn upload(&self, attachment: &Attachment, owner_key: &str) -> Result<String, BlobError> {
        let owner = sanitize_segment(owner_key)?;
        let file_name = format!(
            "{}_{}",
            Uuid::new_v4(),
            sanitize_segment(&attachment.file_name)?
        );

        let dir = self.root.join(&owner);
        fs::create_dir_all(&dir)
            .await
            .map_err(|source| BlobError::Io {
                path: dir.clone(),
                source,
            })?;

        let path = dir.join(&file_name);
        fs::write(&path, &attachment.bytes)
            .await
            .map_err(|source| BlobError::Io {
                path: path.clone(),
                source,
            })?;

        debug!(
            owner = %owner,
            path = %path.display(),
            content_type = %attachment.content_type,
            "Stored {} byte attachment",
            attachment.len()
        );

        Ok(format!("{}/{}/{}", self.public_base_url, owner, file_name))
    }

    fn name(&self) -> &'static str {
        "fs"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_upload_writes_file_and_returns_url() {
        let dir = TempDir::new().unwrap();
        let store = FsBlobStore::new(dir.path(), "https://files.example.com/");

        let attachment = Attachment::new("screen shot.png", "image/png", b"png-bytes".to_vec());
        let url = store.upload(&attachment, "u@x.com").await.unwrap();

        assert!(url.starts_with("https://files.example.com/u@x.com/"));
        assert!(url.ends_with("_screen_shot.png"));

        let stored_name = url.rsplit('/').next().unwrap();
        let stored = std::fs::read(dir.path().join("u@x.com").join(stored_name)).unwrap();
        assert_eq!(stored, b"png-bytes");
    }

    #[tokio::test]
    async fn test_same_name_twice_gets_distinct_urls() {
        let dir = TempDir::new().unwrap();
        let store = FsBlobStore::new(dir.path(), "http://localhost/files");
        let attachment = Attachment::new("log.txt", "text/plain", b"a".to_vec());

        let first = store.upload(&attachment, "u@x.com").await.unwrap();
        let second = store.upload(&attachment, "u@x.com").await.unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_sanitize_segment() {
        assert_eq!(sanitize_segment("../../etc/passwd").unwrap(), "_.._etc_passwd");
        assert_eq!(sanitize_segment("report.pdf").unwrap(), "report.pdf");
        assert!(sanitize_segment("...").is_err());
        assert!(sanitize_segment("  ").is_err());
    }
}
