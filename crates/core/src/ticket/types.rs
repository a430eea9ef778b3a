//! Core ticket data types.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Priority / Status
// ============================================================================

/// Ticket priority, as chosen by the submitting user.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum TicketPriority {
    High,
    Medium,
    Low,
}

impl TicketPriority {
    /// Sort rank: lower is served first.
    pub fn rank(self) -> i64 {
        match self {
            TicketPriority::High => 0,
            TicketPriority::Medium => 1,
            TicketPriority::Low => 2,
        }
    }

    /// Lowercase name, used as the queue `priority` attribute.
    pub fn as_str(self) -> &'static str {
        match self {
            TicketPriority::High => "high",
            TicketPriority::Medium => "medium",
            TicketPriority::Low => "low",
        }
    }
}

impl fmt::Display for TicketPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TicketPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(TicketPriority::High),
            "medium" => Ok(TicketPriority::Medium),
            "low" => Ok(TicketPriority::Low),
            other => Err(format!("unknown priority: {}", other)),
        }
    }
}

/// Ticket status.
///
/// Transitions only move forward: `Open -> InProgress -> Closed` or
/// `Open -> Closed`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    #[default]
    Open,
    InProgress,
    Closed,
}

impl TicketStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TicketStatus::Open => "open",
            TicketStatus::InProgress => "in_progress",
            TicketStatus::Closed => "closed",
        }
    }

    /// Returns true if moving from `self` to `next` is a legal forward step.
    pub fn can_transition_to(self, next: TicketStatus) -> bool {
        matches!(
            (self, next),
            (TicketStatus::Open, TicketStatus::InProgress)
                | (TicketStatus::Open, TicketStatus::Closed)
                | (TicketStatus::InProgress, TicketStatus::Closed)
        )
    }

    pub fn is_terminal(self) -> bool {
        self == TicketStatus::Closed
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Ticket
// ============================================================================

/// A support ticket.
///
/// This is also the queue payload and the cached value, so unknown fields
/// are ignored on deserialization.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ticket {
    /// Unique identifier (UUID), assigned at creation.
    pub id: String,

    pub title: String,

    pub description: String,

    /// Owner. A reference to the `User` record by value.
    pub user_email: String,

    /// Attachment URLs returned by the blob store, in upload order.
    #[serde(default)]
    pub image_urls: Vec<String>,

    pub priority: TicketPriority,

    #[serde(default)]
    pub status: TicketStatus,

    /// Creation timestamp. Never changes after creation.
    pub date_uploaded: DateTime<Utc>,

    /// Synthetic tickets (load tests, demos) are hidden from technicians.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_synthetic: bool,
}

impl Ticket {
    /// Build a fresh open ticket from validated input.
    pub fn new(input: TicketInput, owner_email: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: input.title.trim().to_string(),
            description: input.description,
            user_email: owner_email.into(),
            image_urls: input.image_urls,
            priority: input.priority,
            status: TicketStatus::Open,
            date_uploaded: now,
            is_synthetic: input.is_synthetic,
        }
    }

    /// Time elapsed since the ticket was uploaded.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.date_uploaded
    }

    /// Strictly older than `window`. A ticket exactly at the boundary is not.
    pub fn is_older_than(&self, window: Duration, now: DateTime<Utc>) -> bool {
        self.age(now) > window
    }

    /// Open, or uploaded no more than `window` ago (inclusive).
    pub fn is_open_or_recent(&self, window: Duration, now: DateTime<Utc>) -> bool {
        self.status == TicketStatus::Open || self.age(now) <= window
    }
}

/// User-supplied fields for a new ticket.
#[derive(Debug, Clone, PartialEq)]
pub struct TicketInput {
    pub title: String,
    pub description: String,
    pub priority: TicketPriority,
    /// Already-resolved blob URLs.
    pub image_urls: Vec<String>,
    pub is_synthetic: bool,
}

impl TicketInput {
    pub fn new(title: impl Into<String>, description: impl Into<String>, priority: TicketPriority) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            priority,
            image_urls: Vec::new(),
            is_synthetic: false,
        }
    }

    pub fn with_image_urls(mut self, urls: Vec<String>) -> Self {
        self.image_urls = urls;
        self
    }

    pub fn synthetic(mut self) -> Self {
        self.is_synthetic = true;
        self
    }
}

// ============================================================================
// Archive
// ============================================================================

/// Permanent snapshot of a closed, aged-out ticket.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArchiveRecord {
    #[serde(flatten)]
    pub ticket: Ticket,
    /// Technician who closed the ticket.
    pub closed_by: String,
    pub closed_at: DateTime<Utc>,
}

impl ArchiveRecord {
    pub fn new(ticket: Ticket, closed_by: impl Into<String>, closed_at: DateTime<Utc>) -> Self {
        Self {
            ticket,
            closed_by: closed_by.into(),
            closed_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticket_aged(age: Duration, status: TicketStatus) -> (Ticket, DateTime<Utc>) {
        let now = Utc::now();
        let mut ticket = Ticket::new(
            TicketInput::new("Printer jam", "Tray 2", TicketPriority::High),
            "u@x.com",
            now - age,
        );
        ticket.status = status;
        (ticket, now)
    }

    #[test]
    fn test_priority_rank_order() {
        assert!(TicketPriority::High.rank() < TicketPriority::Medium.rank());
        assert!(TicketPriority::Medium.rank() < TicketPriority::Low.rank());
    }

    #[test]
    fn test_priority_parse() {
        assert_eq!("High".parse::<TicketPriority>().unwrap(), TicketPriority::High);
        assert_eq!(" low ".parse::<TicketPriority>().unwrap(), TicketPriority::Low);
        assert!("urgent".parse::<TicketPriority>().is_err());
    }

    #[test]
    fn test_status_transitions() {
        use TicketStatus::*;
        assert!(Open.can_transition_to(InProgress));
        assert!(Open.can_transition_to(Closed));
        assert!(InProgress.can_transition_to(Closed));
        assert!(!Closed.can_transition_to(Open));
        assert!(!Closed.can_transition_to(InProgress));
        assert!(!InProgress.can_transition_to(Open));
        assert!(!Open.can_transition_to(Open));
    }

    #[test]
    fn test_new_ticket_is_open() {
        let now = Utc::now();
        let ticket = Ticket::new(
            TicketInput::new("  Printer jam ", "", TicketPriority::Low),
            "u@x.com",
            now,
        );
        assert_eq!(ticket.title, "Printer jam");
        assert_eq!(ticket.status, TicketStatus::Open);
        assert_eq!(ticket.date_uploaded, now);
        assert!(!ticket.id.is_empty());
    }

    #[test]
    fn test_boundary_is_not_older() {
        let (ticket, now) = ticket_aged(Duration::days(7), TicketStatus::Closed);
        assert!(!ticket.is_older_than(Duration::days(7), now));
        assert!(ticket.is_open_or_recent(Duration::days(7), now));
    }

    #[test]
    fn test_closed_and_old_is_filtered() {
        let (ticket, now) = ticket_aged(Duration::days(8), TicketStatus::Closed);
        assert!(ticket.is_older_than(Duration::days(7), now));
        assert!(!ticket.is_open_or_recent(Duration::days(7), now));
    }

    #[test]
    fn test_open_and_old_is_kept() {
        let (ticket, now) = ticket_aged(Duration::days(30), TicketStatus::Open);
        assert!(ticket.is_open_or_recent(Duration::days(7), now));
    }

    #[test]
    fn test_deserialize_tolerates_unknown_fields() {
        let json = r#"{
            "id": "t1",
            "title": "Printer jam",
            "description": "",
            "user_email": "u@x.com",
            "priority": "medium",
            "date_uploaded": "2024-01-01T00:00:00Z",
            "assigned_to": "someone"
        }"#;
        let ticket: Ticket = serde_json::from_str(json).unwrap();
        assert_eq!(ticket.priority, TicketPriority::Medium);
        assert_eq!(ticket.status, TicketStatus::Open);
        assert!(ticket.image_urls.is_empty());
        assert!(!ticket.is_synthetic);
    }

    #[test]
    fn test_archive_record_flattens_ticket() {
        let (ticket, now) = ticket_aged(Duration::days(10), TicketStatus::Closed);
        let record = ArchiveRecord::new(ticket.clone(), "tech@x.com", now);
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["id"], ticket.id.as_str());
        assert_eq!(value["closed_by"], "tech@x.com");
        assert_eq!(value["status"], "closed");
    }
}
