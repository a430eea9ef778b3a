//! Ticket lifecycle: intake, queue processing, technician views and closure.

mod coordinator;
mod error;
mod intake;
mod processor;

pub use coordinator::{
    CacheStatus, CloseOutcome, ClosedTicket, CreatedTicket, ProcessOutcome, TicketLifecycle,
};
pub use error::{ErrorKind, LifecycleError};
pub use intake::{AttachmentLimits, TicketForm, TicketIntake};
pub use processor::{drain, DrainReport, ProcessorStatus, TicketProcessor};
