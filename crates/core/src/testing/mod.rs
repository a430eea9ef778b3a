//! Test doubles and fixtures.
//!
//! Each mock wraps the in-memory adapter and lets a test inject failures,
//! so lifecycle error paths can be exercised without real infrastructure.
//!
//! # Example
//!
//! ```rust,ignore
//! use helpdesk_core::testing::{MockMessageQueue, MockPriorityCache};
//!
//! let queue = MockMessageQueue::new();
//! queue.set_publish_unavailable(true).await;
//!
//! let cache = MockPriorityCache::new();
//! cache.set_unavailable(true).await;
//! ```

mod mock_blob_store;
mod mock_cache;
mod mock_queue;
mod mock_record_store;

pub use mock_blob_store::{MockBlobStore, RecordedUpload};
pub use mock_cache::MockPriorityCache;
pub use mock_queue::MockMessageQueue;
pub use mock_record_store::MockRecordStore;

/// Test fixtures and helper functions.
pub mod fixtures {
    use chrono::{Duration, Utc};

    use crate::ticket::{Ticket, TicketInput, TicketPriority, TicketStatus};

    /// An open ticket owned by `u@x.com`, uploaded `age` ago.
    pub fn ticket(title: &str, priority: TicketPriority, age: Duration) -> Ticket {
        Ticket::new(
            TicketInput::new(title, format!("{} description", title), priority),
            "u@x.com",
            Utc::now() - age,
        )
    }

    /// Same as [`ticket`] with the given status.
    pub fn ticket_with_status(
        title: &str,
        priority: TicketPriority,
        age: Duration,
        status: TicketStatus,
    ) -> Ticket {
        let mut t = ticket(title, priority, age);
        t.status = status;
        t
    }

    pub fn input(title: &str, priority: TicketPriority) -> TicketInput {
        TicketInput::new(title, "", priority)
    }
}
