use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Audit event types
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditEvent {
    // System events
    ServiceStarted {
        version: String,
        config_hash: String,
    },
    ServiceStopped {
        reason: String,
    },

    // Ticket lifecycle
    TicketCreated {
        ticket_id: String,
        user_email: String,
        priority: String,
        message_id: String,
        attachments: usize,
    },
    /// Ticket was drained from the queue into the priority cache.
    TicketProcessed {
        ticket_id: String,
        message_id: String,
    },
    TicketStatusChanged {
        ticket_id: String,
        changed_by: String,
        from_status: String,
        to_status: String,
    },
    /// Ticket was closed and kept in the cache for the retention window.
    TicketClosed {
        ticket_id: String,
        closed_by: String,
    },
    /// Ticket was closed, archived and evicted from the cache.
    TicketArchived {
        ticket_id: String,
        closed_by: String,
    },
    /// Queue payload could not be decoded and was dropped.
    MessageDiscarded {
        message_id: String,
        reason: String,
    },

    // Users
    UserCreated {
        email: String,
        role: String,
    },
    UserRoleChanged {
        email: String,
        from_role: String,
        to_role: String,
    },
}

impl AuditEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::ServiceStarted { .. } => "service_started",
            Self::ServiceStopped { .. } => "service_stopped",
            Self::TicketCreated { .. } => "ticket_created",
            Self::TicketProcessed { .. } => "ticket_processed",
            Self::TicketStatusChanged { .. } => "ticket_status_changed",
            Self::TicketClosed { .. } => "ticket_closed",
            Self::TicketArchived { .. } => "ticket_archived",
            Self::MessageDiscarded { .. } => "message_discarded",
            Self::UserCreated { .. } => "user_created",
            Self::UserRoleChanged { .. } => "user_role_changed",
        }
    }

    pub fn ticket_id(&self) -> Option<&str> {
        match self {
            Self::TicketCreated { ticket_id, .. }
            | Self::TicketProcessed { ticket_id, .. }
            | Self::TicketStatusChanged { ticket_id, .. }
            | Self::TicketClosed { ticket_id, .. }
            | Self::TicketArchived { ticket_id, .. } => Some(ticket_id),
            _ => None,
        }
    }

    /// Email of the person who caused the event, if any.
    pub fn actor(&self) -> Option<&str> {
        match self {
            Self::TicketCreated { user_email, .. } => Some(user_email),
            Self::TicketStatusChanged { changed_by, .. } => Some(changed_by),
            Self::TicketClosed { closed_by, .. } | Self::TicketArchived { closed_by, .. } => {
                Some(closed_by)
            }
            Self::UserCreated { email, .. } | Self::UserRoleChanged { email, .. } => Some(email),
            _ => None,
        }
    }
}

/// A stored audit record with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    pub ticket_id: Option<String>,
    pub actor: Option<String>,
    pub data: AuditEvent,
}

impl AuditRecord {
    /// Unsaved record; the store assigns `id`.
    pub fn new(timestamp: DateTime<Utc>, event: AuditEvent) -> Self {
        Self {
            id: 0,
            timestamp,
            event_type: event.event_type().to_string(),
            ticket_id: event.ticket_id().map(String::from),
            actor: event.actor().map(String::from),
            data: event,
        }
    }
}
