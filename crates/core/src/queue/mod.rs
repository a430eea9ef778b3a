//! At-least-once message queue carrying newly created tickets.

mod memory;
mod sqlite;
mod types;

pub use memory::MemoryMessageQueue;
pub use sqlite::SqliteMessageQueue;
pub use types::*;
