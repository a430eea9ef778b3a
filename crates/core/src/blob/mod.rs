//! Attachment storage.

mod fs_store;
mod traits;

pub use fs_store::FsBlobStore;
pub use traits::{Attachment, BlobError, BlobStore};
