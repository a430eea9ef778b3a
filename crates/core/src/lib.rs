pub mod audit;
pub mod auth;
pub mod blob;
pub mod cache;
pub mod config;
mod keyed_lock;
pub mod lifecycle;
pub mod metrics;
pub mod queue;
pub mod record_store;
pub mod testing;
pub mod ticket;
pub mod user;

pub use audit::{
    create_audit_system, AuditEvent, AuditFilter, AuditHandle, AuditRecord, AuditStore,
    AuditWriter, SqliteAuditStore,
};
pub use auth::{
    create_authenticator, AuthError, AuthRequest, Authenticator, Identity, NoneAuthenticator,
};
pub use blob::{Attachment, BlobError, BlobStore, FsBlobStore};
pub use cache::{CacheError, InMemoryPriorityCache, PriorityCache, RedisPriorityCache};
pub use config::{
    load_config, load_config_from_str, validate_config, AuthMethod, CacheBackend, Config,
    ConfigError, QueueBackend, SanitizedConfig,
};
pub use lifecycle::{
    AttachmentLimits, CloseOutcome, ErrorKind, LifecycleError, TicketForm, TicketIntake,
    TicketLifecycle, TicketProcessor,
};
pub use queue::{MemoryMessageQueue, MessageQueue, QueueError, SqliteMessageQueue};
pub use record_store::{MemoryRecordStore, RecordStore, SqliteRecordStore, TicketArchive};
pub use ticket::{ArchiveRecord, Ticket, TicketInput, TicketPriority, TicketStatus};
pub use user::{User, UserDirectory, UserRole};
