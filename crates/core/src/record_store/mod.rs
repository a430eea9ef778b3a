//! Durable record store for users and archived tickets.

mod archive;
mod memory;
mod sqlite;
mod store;

pub use archive::TicketArchive;
pub use memory::MemoryRecordStore;
pub use sqlite::SqliteRecordStore;
pub use store::{
    get_as, put_as, Document, RecordStore, RecordStoreError, ARCHIVE_COLLECTION, USERS_COLLECTION,
};
