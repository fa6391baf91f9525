//! Error taxonomy for the review domain.
//!
//! Every operation surfaces its failure directly to the caller; there is no
//! local recovery or retry beyond the bounded compare-and-swap loop in
//! [`crate::service`]. A failed multi-step submit leaves no ticket row but
//! may leave orphaned blobs (accepted, not remediated).

use crate::types::{TicketId, TicketStatus};
use thiserror::Error;

/// Opaque failure from a storage collaborator (row store or blob store).
#[derive(Debug, Error)]
#[error("storage failure: {0}")]
pub struct StorageError(pub String);

impl StorageError {
    /// Wrap any displayable error as a storage failure.
    pub fn new(err: impl std::fmt::Display) -> Self {
        Self(err.to_string())
    }
}

/// Comprehensive error taxonomy for ticket lifecycle operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The ticket does not exist.
    #[error("ticket {0} not found")]
    TicketNotFound(TicketId),

    /// The ticket exists but has no recorded result.
    #[error("no result recorded for ticket {0}")]
    ResultNotFound(TicketId),

    /// Malformed input, e.g. image count outside [1, 5].
    #[error("{0}")]
    Validation(String),

    /// The requested status change is not in the legal-transition table.
    #[error("illegal status transition: {from} -> {to}")]
    IllegalTransition {
        /// Current status of the ticket.
        from: TicketStatus,
        /// Requested destination status.
        to: TicketStatus,
    },

    /// Another reviewer already holds the claim, or a concurrent mutation
    /// won the race.
    #[error("{0}")]
    Conflict(String),

    /// The acting reviewer does not match the assigned reviewer.
    #[error("{0}")]
    Forbidden(String),

    /// The ticket is not in a state that permits this operation, e.g.
    /// unclaiming a ticket nobody holds.
    #[error("{0}")]
    InvalidState(String),

    /// A result already exists for this ticket (at most one, ever).
    #[error("a result already exists for ticket {0}")]
    ResultExists(TicketId),

    /// A storage collaborator failed (blob upload or row persistence).
    #[error(transparent)]
    Storage(#[from] StorageError),
}
