//! The ticket lifecycle state machine: the legal-transition table.
//!
//! This is the generic status-update path. Two named operations bypass it
//! deliberately and are implemented in [`crate::service`]:
//!
//! - `claim` force-advances `Submitted`/`NeedMoreInfo` to `InReview`
//! - `record_result` force-resolves any ticket
//!
//! Keeping the bypasses out of this table preserves the asymmetry: the
//! table is the contract for `update_status` and nothing else.

use crate::types::TicketStatus;

/// Legal destinations for a generic status update from `from`.
///
/// Terminal statuses (`Resolved`, `Rejected`) return an empty slice.
#[must_use]
pub const fn allowed_transitions(from: TicketStatus) -> &'static [TicketStatus] {
    match from {
        TicketStatus::Submitted => &[
            TicketStatus::InReview,
            TicketStatus::Rejected,
            TicketStatus::NeedMoreInfo,
        ],
        TicketStatus::InReview => &[
            TicketStatus::Resolved,
            TicketStatus::Rejected,
            TicketStatus::NeedMoreInfo,
        ],
        TicketStatus::NeedMoreInfo => &[TicketStatus::InReview, TicketStatus::Rejected],
        TicketStatus::Resolved | TicketStatus::Rejected => &[],
    }
}

/// Whether `from -> to` is a legal generic status update.
///
/// Self-transitions are always illegal: no status lists itself as a
/// destination.
#[must_use]
pub fn is_legal_transition(from: TicketStatus, to: TicketStatus) -> bool {
    allowed_transitions(from).contains(&to)
}

#[cfg(test)]
mod tests {
    use super::*;
    use TicketStatus::{InReview, NeedMoreInfo, Rejected, Resolved, Submitted};

    const ALL: [TicketStatus; 5] = [Submitted, InReview, Resolved, NeedMoreInfo, Rejected];

    #[test]
    fn submitted_transitions() {
        assert!(is_legal_transition(Submitted, InReview));
        assert!(is_legal_transition(Submitted, Rejected));
        assert!(is_legal_transition(Submitted, NeedMoreInfo));
        assert!(!is_legal_transition(Submitted, Resolved));
    }

    #[test]
    fn in_review_transitions() {
        assert!(is_legal_transition(InReview, Resolved));
        assert!(is_legal_transition(InReview, Rejected));
        assert!(is_legal_transition(InReview, NeedMoreInfo));
        assert!(!is_legal_transition(InReview, Submitted));
    }

    #[test]
    fn need_more_info_transitions() {
        assert!(is_legal_transition(NeedMoreInfo, InReview));
        assert!(is_legal_transition(NeedMoreInfo, Rejected));
        assert!(!is_legal_transition(NeedMoreInfo, Resolved));
        assert!(!is_legal_transition(NeedMoreInfo, Submitted));
    }

    #[test]
    fn terminal_statuses_have_no_outgoing_edges() {
        for to in ALL {
            assert!(!is_legal_transition(Resolved, to));
            assert!(!is_legal_transition(Rejected, to));
        }
    }

    #[test]
    fn self_transitions_are_always_illegal() {
        for status in ALL {
            assert!(!is_legal_transition(status, status));
        }
    }
}
