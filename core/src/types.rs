//! Core types for the authenticity-review ticket domain.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a ticket.
///
/// Generated once at submission and immutable for the life of the ticket.
/// Image blobs are namespaced under this ID in the object store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TicketId(Uuid);

impl TicketId {
    /// Generate a new random ticket ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TicketId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle status of a ticket.
///
/// `Resolved` and `Rejected` are terminal: no outgoing transitions exist
/// in the legal-transition table (see [`crate::lifecycle`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    /// Freshly submitted, waiting for a reviewer.
    Submitted,
    /// A reviewer is actively working the ticket.
    InReview,
    /// Terminal: a verdict has been reached.
    Resolved,
    /// The reviewer needs more material from the submitter.
    NeedMoreInfo,
    /// Terminal: the ticket was rejected without a verdict.
    Rejected,
}

impl TicketStatus {
    /// Wire/storage representation (snake_case, matches the serde form).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Submitted => "submitted",
            Self::InReview => "in_review",
            Self::Resolved => "resolved",
            Self::NeedMoreInfo => "need_more_info",
            Self::Rejected => "rejected",
        }
    }

    /// Parse the storage representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "submitted" => Some(Self::Submitted),
            "in_review" => Some(Self::InReview),
            "resolved" => Some(Self::Resolved),
            "need_more_info" => Some(Self::NeedMoreInfo),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    /// Whether this status has no outgoing transitions.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Resolved | Self::Rejected)
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reviewer verdict on a ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// The product is genuine.
    Authentic,
    /// The product is counterfeit.
    Inauthentic,
    /// The evidence was inconclusive.
    Undetermined,
}

impl Verdict {
    /// Wire/storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Authentic => "authentic",
            Self::Inauthentic => "inauthentic",
            Self::Undetermined => "undetermined",
        }
    }

    /// Parse the storage representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "authentic" => Some(Self::Authentic),
            "inauthentic" => Some(Self::Inauthentic),
            "undetermined" => Some(Self::Undetermined),
            _ => None,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single authenticity-review request.
///
/// Invariant: `assigned_reviewer_id` is set iff `claimed_at` is set.
/// Tickets are never deleted; terminal tickets remain queryable for audit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    /// Opaque unique identifier.
    pub id: TicketId,
    /// Submitting user, if known (auth is optional on submission).
    pub submitter_id: Option<String>,
    /// Product brand, e.g. "Dior".
    pub brand: String,
    /// Product category, e.g. "lipstick".
    pub category: String,
    /// Free-text notes from the submitter.
    pub notes: String,
    /// Ordered public URLs of the uploaded images (1 to 5).
    pub image_urls: Vec<String>,
    /// Current lifecycle status.
    pub status: TicketStatus,
    /// Reviewer currently holding the claim, if any.
    pub assigned_reviewer_id: Option<String>,
    /// When the current claim was taken.
    pub claimed_at: Option<DateTime<Utc>>,
    /// Optimistic-concurrency counter, bumped on every mutation.
    pub version: i64,
    /// When the ticket was submitted.
    pub created_at: DateTime<Utc>,
    /// When the ticket was last mutated.
    pub updated_at: DateTime<Utc>,
}

impl Ticket {
    /// Whether a reviewer currently holds this ticket.
    #[must_use]
    pub const fn is_claimed(&self) -> bool {
        self.assigned_reviewer_id.is_some()
    }
}

/// The terminal verdict artifact attached to a ticket.
///
/// At most one per ticket, immutable once recorded. Recording a result
/// forces the owning ticket to `Resolved`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewResult {
    /// The owning ticket.
    pub ticket_id: TicketId,
    /// The verdict.
    pub verdict: Verdict,
    /// Free-text justification for the verdict.
    pub rationale: String,
    /// Reviewer who recorded the verdict, if known.
    pub reviewer_id: Option<String>,
    /// When the verdict was recorded.
    pub reviewed_at: DateTime<Utc>,
}

/// Kind of lifecycle change captured by an audit event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Ticket was submitted.
    Created,
    /// Status moved along the legal-transition table.
    StatusChanged,
    /// A reviewer took the claim.
    Claimed,
    /// The claim was released.
    Unclaimed,
    /// A verdict was recorded.
    ResultAdded,
}

impl EventKind {
    /// Wire/storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::StatusChanged => "status_changed",
            Self::Claimed => "claimed",
            Self::Unclaimed => "unclaimed",
            Self::ResultAdded => "result_added",
        }
    }

    /// Parse the storage representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "created" => Some(Self::Created),
            "status_changed" => Some(Self::StatusChanged),
            "claimed" => Some(Self::Claimed),
            "unclaimed" => Some(Self::Unclaimed),
            "result_added" => Some(Self::ResultAdded),
            _ => None,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An immutable audit record of one lifecycle change.
///
/// The canonical history of a ticket is its events ordered by
/// `recorded_at`, with `seq` as the tie-break. Events are append-only and
/// cascade-deleted only with the owning ticket (no delete is exposed).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketEvent {
    /// Monotonically increasing sequence number, assigned by the store.
    pub seq: i64,
    /// The owning ticket.
    pub ticket_id: TicketId,
    /// What happened.
    pub kind: EventKind,
    /// Who did it (submitter or reviewer), if known.
    pub actor_id: Option<String>,
    /// Status before the change, where applicable.
    pub from_status: Option<TicketStatus>,
    /// Status after the change, where applicable.
    pub to_status: Option<TicketStatus>,
    /// Free-text annotation.
    pub note: Option<String>,
    /// When the change happened.
    pub recorded_at: DateTime<Utc>,
}

/// Draft of an audit event, before the store assigns a sequence number.
#[derive(Debug, Clone)]
pub struct NewEvent {
    /// The owning ticket.
    pub ticket_id: TicketId,
    /// What happened.
    pub kind: EventKind,
    /// Who did it, if known.
    pub actor_id: Option<String>,
    /// Status before the change, where applicable.
    pub from_status: Option<TicketStatus>,
    /// Status after the change, where applicable.
    pub to_status: Option<TicketStatus>,
    /// Free-text annotation.
    pub note: Option<String>,
    /// When the change happened.
    pub recorded_at: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_storage_form() {
        for status in [
            TicketStatus::Submitted,
            TicketStatus::InReview,
            TicketStatus::Resolved,
            TicketStatus::NeedMoreInfo,
            TicketStatus::Rejected,
        ] {
            assert_eq!(TicketStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(TicketStatus::parse("escalated"), None);
    }

    #[test]
    fn terminal_statuses() {
        assert!(TicketStatus::Resolved.is_terminal());
        assert!(TicketStatus::Rejected.is_terminal());
        assert!(!TicketStatus::Submitted.is_terminal());
        assert!(!TicketStatus::InReview.is_terminal());
        assert!(!TicketStatus::NeedMoreInfo.is_terminal());
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&TicketStatus::NeedMoreInfo).unwrap();
        assert_eq!(json, "\"need_more_info\"");
    }
}
