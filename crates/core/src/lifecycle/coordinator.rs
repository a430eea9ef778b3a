//! Ticket lifecycle coordinator.
//!
//! Create publishes to the queue, processing drains the queue into the
//! priority cache, technicians read and close from the cache, and closure
//! either updates the cache entry or archives and evicts it.

use chrono::{Duration, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::error::LifecycleError;
use crate::audit::{AuditEvent, AuditHandle};
use crate::cache::PriorityCache;
use crate::keyed_lock::KeyedLocks;
use crate::metrics::{
    QUEUE_DELIVERY_COUNT, QUEUE_MESSAGES_PROCESSED, TICKETS_CLOSED, TICKETS_CREATED,
    TICKET_PUBLISH_FAILURES,
};
use crate::queue::{MessageQueue, QueueError, PRIORITY_ATTRIBUTE};
use crate::record_store::TicketArchive;
use crate::ticket::{validate_email, ArchiveRecord, Ticket, TicketInput, TicketStatus};

/// Result of a successful publish.
#[derive(Debug, Clone, Serialize)]
pub struct CreatedTicket {
    pub ticket_id: String,
    pub message_id: String,
    pub ticket: Ticket,
}

/// What one `process_pending` call did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// Nothing was ready.
    Idle,
    /// A ticket was written to the cache.
    Processed { ticket_id: String, message_id: String },
    /// An undecodable message was acked and dropped.
    Discarded { message_id: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseOutcome {
    /// Written to the archive and evicted from the cache.
    Archived,
    /// Kept in the cache with status Closed.
    Retained,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClosedTicket {
    pub ticket: Ticket,
    pub outcome: CloseOutcome,
}

/// Snapshot of the working-set backends.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStatus {
    pub backend: String,
    pub available: bool,
    pub diagnostics: String,
    pub queue_backend: String,
    /// `None` when the queue could not be asked.
    pub queue_pending: Option<usize>,
}

pub struct TicketLifecycle {
    queue: Arc<dyn MessageQueue>,
    cache: Arc<dyn PriorityCache>,
    archive: TicketArchive,
    retention: Duration,
    audit: Option<AuditHandle>,
    /// Serializes read-check-write sequences on one ticket id.
    locks: KeyedLocks,
}

impl TicketLifecycle {
    pub fn new(
        queue: Arc<dyn MessageQueue>,
        cache: Arc<dyn PriorityCache>,
        archive: TicketArchive,
        retention_days: u32,
    ) -> Self {
        Self {
            queue,
            cache,
            archive,
            retention: Duration::days(i64::from(retention_days)),
            audit: None,
            locks: KeyedLocks::default(),
        }
    }

    pub fn with_audit(mut self, audit: AuditHandle) -> Self {
        self.audit = Some(audit);
        self
    }

    pub fn retention(&self) -> Duration {
        self.retention
    }

    /// Assign id and upload time, then publish the ticket to the queue.
    ///
    /// Success does not mean the ticket is visible to technicians yet.
    pub async fn create_ticket(
        &self,
        input: TicketInput,
        owner_email: &str,
    ) -> Result<CreatedTicket, LifecycleError> {
        input.validate()?;
        validate_email(owner_email)?;

        let ticket = Ticket::new(input, owner_email, Utc::now());
        let payload = serde_json::to_vec(&ticket).map_err(|e| LifecycleError::Encode {
            ticket_id: ticket.id.clone(),
            reason: e.to_string(),
        })?;
        let attributes = HashMap::from([(
            PRIORITY_ATTRIBUTE.to_string(),
            ticket.priority.as_str().to_string(),
        )]);

        let message_id = self.queue.publish(payload, attributes).await.map_err(|e| {
            error!(
                ticket_id = %ticket.id,
                email = %owner_email,
                "Failed to publish ticket: {}",
                e
            );
            TICKET_PUBLISH_FAILURES.inc();
            LifecycleError::Publish(e)
        })?;

        TICKETS_CREATED
            .with_label_values(&[ticket.priority.as_str()])
            .inc();
        info!(
            ticket_id = %ticket.id,
            message_id = %message_id,
            email = %owner_email,
            priority = %ticket.priority,
            "Ticket published"
        );
        self.emit(AuditEvent::TicketCreated {
            ticket_id: ticket.id.clone(),
            user_email: ticket.user_email.clone(),
            priority: ticket.priority.to_string(),
            message_id: message_id.clone(),
            attachments: ticket.image_urls.len(),
        })
        .await;

        Ok(CreatedTicket {
            ticket_id: ticket.id.clone(),
            message_id,
            ticket,
        })
    }

    /// Move at most one queued ticket into the cache.
    ///
    /// A cache failure leaves the message un-acked so it is redelivered.
    /// A redelivered ticket that is already cached or archived is acked
    /// without touching the cache, so it cannot undo a later status change.
    pub async fn process_pending(&self) -> Result<ProcessOutcome, LifecycleError> {
        let Some(message) = self.queue.pull_one().await.map_err(|e| {
            error!("Failed to pull from queue: {}", e);
            LifecycleError::Queue(e)
        })?
        else {
            return Ok(ProcessOutcome::Idle);
        };

        let message_id = message.message_id.clone();
        let ticket: Ticket = match serde_json::from_slice(&message.payload) {
            Ok(ticket) => ticket,
            Err(e) => {
                warn!(message_id = %message_id, "Discarding undecodable queue message: {}", e);
                QUEUE_MESSAGES_PROCESSED.with_label_values(&["discarded"]).inc();
                self.ack_logged(&message.ack_handle, None).await;
                self.emit(AuditEvent::MessageDiscarded {
                    message_id: message_id.clone(),
                    reason: e.to_string(),
                })
                .await;
                return Ok(ProcessOutcome::Discarded { message_id });
            }
        };

        let _guard = self.locks.lock(&ticket.id).await;
        let recorded = self.already_recorded(&ticket.id).await.inspect_err(|e| {
            error!(
                ticket_id = %ticket.id,
                message_id = %message_id,
                "Failed to check for duplicate, leaving message for redelivery: {}",
                e
            );
            QUEUE_MESSAGES_PROCESSED.with_label_values(&["cache_error"]).inc();
        })?;
        if recorded {
            debug!(
                ticket_id = %ticket.id,
                message_id = %message_id,
                delivery = message.delivery_count,
                "Duplicate delivery, ticket already recorded"
            );
        } else if let Err(e) = self.cache.upsert(&ticket).await {
            error!(
                ticket_id = %ticket.id,
                message_id = %message_id,
                "Failed to cache ticket, leaving message for redelivery: {}",
                e
            );
            QUEUE_MESSAGES_PROCESSED.with_label_values(&["cache_error"]).inc();
            return Err(LifecycleError::Cache(e));
        }

        self.ack_logged(&message.ack_handle, Some(&ticket.id)).await;

        QUEUE_MESSAGES_PROCESSED.with_label_values(&["processed"]).inc();
        QUEUE_DELIVERY_COUNT
            .with_label_values(&[])
            .observe(f64::from(message.delivery_count));
        debug!(
            ticket_id = %ticket.id,
            message_id = %message_id,
            delivery = message.delivery_count,
            "Ticket cached"
        );
        self.emit(AuditEvent::TicketProcessed {
            ticket_id: ticket.id.clone(),
            message_id: message_id.clone(),
        })
        .await;

        Ok(ProcessOutcome::Processed {
            ticket_id: ticket.id,
            message_id,
        })
    }

    /// Tickets a technician should see, highest priority and oldest first.
    ///
    /// Synthetic tickets are never shown.
    pub async fn list_for_technician(&self) -> Result<Vec<Ticket>, LifecycleError> {
        let tickets = self
            .cache
            .list_open_or_recent(self.retention, Utc::now())
            .await
            .inspect_err(|e| error!("Failed to list tickets from cache: {}", e))?;
        Ok(tickets.into_iter().filter(|t| !t.is_synthetic).collect())
    }

    /// Advisory lookup; a miss is `Ok(None)`.
    pub async fn get_ticket(&self, ticket_id: &str) -> Result<Option<Ticket>, LifecycleError> {
        Ok(self.cache.get(ticket_id).await?)
    }

    /// Open -> InProgress. Repeating the call is a no-op.
    pub async fn start_progress(
        &self,
        ticket_id: &str,
        technician_email: &str,
    ) -> Result<Ticket, LifecycleError> {
        let _guard = self.locks.lock(ticket_id).await;
        let mut ticket = self.require(ticket_id).await?;

        if ticket.status == TicketStatus::InProgress {
            return Ok(ticket);
        }
        if !ticket.status.can_transition_to(TicketStatus::InProgress) {
            return Err(LifecycleError::InvalidTransition {
                ticket_id: ticket_id.to_string(),
                from: ticket.status,
                to: TicketStatus::InProgress,
            });
        }

        let from = ticket.status;
        ticket.status = TicketStatus::InProgress;
        self.cache
            .upsert(&ticket)
            .await
            .inspect_err(|e| error!(ticket_id = %ticket_id, "Failed to update ticket: {}", e))?;

        info!(ticket_id = %ticket_id, technician = %technician_email, "Ticket in progress");
        self.emit(AuditEvent::TicketStatusChanged {
            ticket_id: ticket_id.to_string(),
            changed_by: technician_email.to_string(),
            from_status: from.to_string(),
            to_status: ticket.status.to_string(),
        })
        .await;

        Ok(ticket)
    }

    /// Close a ticket.
    ///
    /// Past the retention window the ticket is archived, then evicted. The
    /// archive write must succeed before eviction. Closing again after a
    /// crash between the two steps finishes the eviction.
    pub async fn close_ticket(
        &self,
        ticket_id: &str,
        technician_email: &str,
    ) -> Result<ClosedTicket, LifecycleError> {
        let _guard = self.locks.lock(ticket_id).await;
        let mut ticket = self.require(ticket_id).await?;
        let now = Utc::now();
        let already_closed = ticket.status == TicketStatus::Closed;
        if !already_closed && !ticket.status.can_transition_to(TicketStatus::Closed) {
            return Err(LifecycleError::InvalidTransition {
                ticket_id: ticket_id.to_string(),
                from: ticket.status,
                to: TicketStatus::Closed,
            });
        }
        ticket.status = TicketStatus::Closed;

        if !ticket.is_older_than(self.retention, now) {
            if !already_closed {
                self.cache.upsert(&ticket).await.inspect_err(|e| {
                    error!(ticket_id = %ticket_id, "Failed to update closed ticket: {}", e)
                })?;
                TICKETS_CLOSED.with_label_values(&["retained"]).inc();
                info!(ticket_id = %ticket_id, technician = %technician_email, "Ticket closed");
                self.emit(AuditEvent::TicketClosed {
                    ticket_id: ticket_id.to_string(),
                    closed_by: technician_email.to_string(),
                })
                .await;
            }
            return Ok(ClosedTicket {
                ticket,
                outcome: CloseOutcome::Retained,
            });
        }

        // Archive records are never rewritten; a retry only finishes eviction.
        let existing = self.archive.get(ticket_id).inspect_err(|e| {
            error!(ticket_id = %ticket_id, "Failed to read archive: {}", e)
        })?;
        if existing.is_none() {
            let record = ArchiveRecord::new(ticket.clone(), technician_email, now);
            self.archive.write(&record).inspect_err(|e| {
                error!(ticket_id = %ticket_id, technician = %technician_email, "Failed to archive ticket: {}", e)
            })?;
        } else {
            warn!(ticket_id = %ticket_id, "Ticket already archived, completing eviction");
        }

        self.cache.remove(ticket_id).await.inspect_err(|e| {
            error!(ticket_id = %ticket_id, "Archived ticket could not be evicted: {}", e)
        })?;

        TICKETS_CLOSED.with_label_values(&["archived"]).inc();
        info!(ticket_id = %ticket_id, technician = %technician_email, "Ticket closed and archived");
        self.emit(AuditEvent::TicketArchived {
            ticket_id: ticket_id.to_string(),
            closed_by: technician_email.to_string(),
        })
        .await;

        Ok(ClosedTicket {
            ticket,
            outcome: CloseOutcome::Archived,
        })
    }

    pub async fn cache_status(&self) -> CacheStatus {
        let queue_pending = match self.queue.pending_count().await {
            Ok(n) => Some(n),
            Err(e) => {
                warn!("Failed to read queue depth: {}", e);
                None
            }
        };
        CacheStatus {
            backend: self.cache.name().to_string(),
            available: self.cache.is_available().await,
            diagnostics: self.cache.diagnostic_info().await,
            queue_backend: self.queue.name().to_string(),
            queue_pending,
        }
    }

    async fn require(&self, ticket_id: &str) -> Result<Ticket, LifecycleError> {
        self.cache
            .get(ticket_id)
            .await
            .inspect_err(|e| error!(ticket_id = %ticket_id, "Failed to read ticket: {}", e))?
            .ok_or_else(|| LifecycleError::NotFound {
                ticket_id: ticket_id.to_string(),
            })
    }

    async fn already_recorded(&self, ticket_id: &str) -> Result<bool, LifecycleError> {
        if self.cache.get(ticket_id).await?.is_some() {
            return Ok(true);
        }
        Ok(self.archive.get(ticket_id)?.is_some())
    }

    async fn ack_logged(&self, handle: &crate::queue::AckHandle, ticket_id: Option<&str>) {
        let ticket_id = ticket_id.unwrap_or("-");
        match self.queue.ack(handle).await {
            Ok(()) => {}
            Err(QueueError::LeaseExpired { message_id }) => warn!(
                ticket_id = %ticket_id,
                message_id = %message_id,
                "Lease expired before ack, message will be redelivered"
            ),
            Err(e) => error!(
                ticket_id = %ticket_id,
                message_id = %handle.message_id,
                "Failed to ack message: {}",
                e
            ),
        }
    }

    async fn emit(&self, event: AuditEvent) {
        if let Some(audit) = &self.audit {
            audit.emit(event).await;
        }
    }
}
