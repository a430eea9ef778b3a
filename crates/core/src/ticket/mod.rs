//! Ticket domain: the record that flows through queue, cache and archive.

mod types;
mod validate;

pub use types::{ArchiveRecord, Ticket, TicketInput, TicketPriority, TicketStatus};
pub use validate::{validate_email, ValidationError, MAX_DESCRIPTION_CHARS, MAX_TITLE_CHARS};
