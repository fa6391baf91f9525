//! Persistent store collaborator interface.
//!
//! Three row families back the domain: tickets, results, events. The
//! contract the state machine needs from the store is small: point lookup,
//! filtered scan, and transactional multi-row writes (a ticket mutation
//! and its audit event land together or not at all).
//!
//! Mutations are guarded by optimistic compare-and-swap on the ticket's
//! `version` counter: the store applies a write only if the row's current
//! version equals `expected_version`, otherwise it reports a mismatch and
//! changes nothing. This gives the service read-validate-write atomicity
//! without holding row locks across the validation step.

use crate::error::StorageError;
use crate::types::{NewEvent, ReviewResult, Ticket, TicketEvent, TicketId, TicketStatus};
use async_trait::async_trait;

/// Default page size for ticket listings.
pub const DEFAULT_LIST_LIMIT: u32 = 50;

/// Hard cap on ticket listings.
pub const MAX_LIST_LIMIT: u32 = 200;

/// Conjunctive (AND) filters for listing tickets.
#[derive(Debug, Clone, Default)]
pub struct TicketFilter {
    /// Only tickets submitted by this user.
    pub submitter_id: Option<String>,
    /// Only tickets in this status.
    pub status: Option<TicketStatus>,
    /// Only tickets with no assigned reviewer.
    pub unassigned_only: bool,
    /// Only tickets claimed by this reviewer.
    pub reviewer_id: Option<String>,
    /// Requested page size; clamped by [`TicketFilter::effective_limit`].
    pub limit: Option<u32>,
}

impl TicketFilter {
    /// The page size to apply: the requested limit clamped to
    /// [1, [`MAX_LIST_LIMIT`]], defaulting to [`DEFAULT_LIST_LIMIT`].
    #[must_use]
    pub fn effective_limit(&self) -> u32 {
        self.limit
            .unwrap_or(DEFAULT_LIST_LIMIT)
            .clamp(1, MAX_LIST_LIMIT)
    }
}

/// Outcome of a compare-and-swap ticket update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The row matched `expected_version` and the write was applied.
    Applied,
    /// The row's version had moved; nothing was written.
    VersionMismatch,
}

/// Outcome of a compare-and-swap result insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultInsertOutcome {
    /// Result inserted and ticket row updated.
    Applied,
    /// The ticket row's version had moved; nothing was written.
    VersionMismatch,
    /// A result row already exists for this ticket; nothing was written.
    ResultExists,
}

/// Row storage for tickets, results, and audit events.
///
/// Implementations must make each method a single transaction: the ticket
/// write and its event insert are atomic, and version checks happen inside
/// that transaction.
#[async_trait]
pub trait TicketStore: Send + Sync {
    /// Insert a freshly submitted ticket together with its `created` event.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if persistence fails.
    async fn insert_ticket(&self, ticket: &Ticket, event: &NewEvent) -> Result<(), StorageError>;

    /// Point lookup of a ticket snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the query fails.
    async fn fetch_ticket(&self, id: TicketId) -> Result<Option<Ticket>, StorageError>;

    /// Replace a ticket row if its stored version equals `expected_version`,
    /// appending `event` in the same transaction.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if persistence fails.
    async fn update_ticket(
        &self,
        ticket: &Ticket,
        expected_version: i64,
        event: &NewEvent,
    ) -> Result<UpdateOutcome, StorageError>;

    /// Insert a result row (at most one per ticket), replace the ticket row
    /// under the same version check, and append `event`, all in one
    /// transaction.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if persistence fails.
    async fn insert_result(
        &self,
        ticket: &Ticket,
        expected_version: i64,
        result: &ReviewResult,
        event: &NewEvent,
    ) -> Result<ResultInsertOutcome, StorageError>;

    /// Point lookup of a ticket's result, if one was ever recorded.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the query fails.
    async fn fetch_result(&self, id: TicketId) -> Result<Option<ReviewResult>, StorageError>;

    /// Filtered scan of tickets, newest-created first, capped at the
    /// filter's effective limit.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the query fails.
    async fn list_tickets(&self, filter: &TicketFilter) -> Result<Vec<Ticket>, StorageError>;

    /// All events for a ticket, ascending by `recorded_at` with `seq` as
    /// the tie-break. An empty list is valid for an existing ticket.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the query fails.
    async fn list_events(&self, id: TicketId) -> Result<Vec<TicketEvent>, StorageError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_defaults_to_fifty() {
        let filter = TicketFilter::default();
        assert_eq!(filter.effective_limit(), 50);
    }

    #[test]
    fn cas_outcomes_are_reachable_from_the_crate_root() {
        // Store implementations in downstream crates name these via the
        // root re-export
        assert_eq!(crate::UpdateOutcome::Applied, UpdateOutcome::Applied);
        assert_eq!(
            crate::ResultInsertOutcome::ResultExists,
            ResultInsertOutcome::ResultExists
        );
    }

    #[test]
    fn limit_clamps_to_range() {
        let mut filter = TicketFilter {
            limit: Some(0),
            ..TicketFilter::default()
        };
        assert_eq!(filter.effective_limit(), 1);

        filter.limit = Some(9999);
        assert_eq!(filter.effective_limit(), MAX_LIST_LIMIT);

        filter.limit = Some(120);
        assert_eq!(filter.effective_limit(), 120);
    }
}
