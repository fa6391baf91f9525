//! The ticket state machine and result recorder.
//!
//! [`ReviewService`] owns every lifecycle mutation. Each mutating operation
//! is a read-validate-write cycle guarded by the store's compare-and-swap
//! contract (see [`crate::store`]): the service re-reads and re-validates
//! on a version mismatch, so the loser of a claim race observes the
//! winner's assignment and fails with `Conflict` instead of clobbering it.

use crate::blob::ImageStore;
use crate::clock::Clock;
use crate::error::CoreError;
use crate::lifecycle;
use crate::store::{ResultInsertOutcome, TicketFilter, TicketStore, UpdateOutcome};
use crate::types::{
    EventKind, NewEvent, ReviewResult, Ticket, TicketEvent, TicketId, TicketStatus, Verdict,
};
use crate::Result;
use bytes::Bytes;
use std::sync::Arc;

/// Minimum number of images per submission.
pub const MIN_IMAGES: usize = 1;

/// Maximum number of images per submission.
pub const MAX_IMAGES: usize = 5;

/// Attempts at the read-validate-write cycle before giving up on a
/// contended ticket.
const CAS_ATTEMPTS: u32 = 3;

/// One image in a submission, prior to upload.
#[derive(Debug, Clone)]
pub struct NewImage {
    /// Original filename; used in the blob key.
    pub filename: String,
    /// Declared content type, if the client sent one.
    pub content_type: Option<String>,
    /// Raw image bytes.
    pub bytes: Bytes,
}

impl NewImage {
    /// Convenience constructor for an image without a declared content type.
    #[must_use]
    pub fn new(filename: impl Into<String>, bytes: Bytes) -> Self {
        Self {
            filename: filename.into(),
            content_type: None,
            bytes,
        }
    }
}

/// Input to [`ReviewService::submit`].
#[derive(Debug, Clone)]
pub struct NewTicket {
    /// Product brand.
    pub brand: String,
    /// Product category.
    pub category: String,
    /// Free-text notes.
    pub notes: String,
    /// Submitting user, if known.
    pub submitter_id: Option<String>,
    /// 1 to 5 images.
    pub images: Vec<NewImage>,
}

/// Ticket state machine, event log, and result recorder.
///
/// All collaborators are injected trait objects so the full lifecycle runs
/// against in-memory doubles in tests.
#[derive(Clone)]
pub struct ReviewService {
    store: Arc<dyn TicketStore>,
    images: Arc<dyn ImageStore>,
    clock: Arc<dyn Clock>,
}

impl ReviewService {
    /// Create a service over the given collaborators.
    #[must_use]
    pub fn new(
        store: Arc<dyn TicketStore>,
        images: Arc<dyn ImageStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            images,
            clock,
        }
    }

    /// Submit a new ticket with its images.
    ///
    /// Every image must upload before the ticket row is written; a single
    /// upload failure aborts the whole submission (earlier uploads become
    /// orphaned blobs, which is accepted). The ticket starts in
    /// `Submitted` with a `Created` event.
    ///
    /// # Errors
    ///
    /// - [`CoreError::Validation`] if the image count is outside [1, 5]
    /// - [`CoreError::Storage`] if an upload or the row insert fails
    pub async fn submit(&self, new: NewTicket) -> Result<Ticket> {
        let count = new.images.len();
        if !(MIN_IMAGES..=MAX_IMAGES).contains(&count) {
            return Err(CoreError::Validation(format!(
                "must upload between {MIN_IMAGES} and {MAX_IMAGES} images (got {count})"
            )));
        }

        let id = TicketId::new();
        let mut image_urls = Vec::with_capacity(count);
        for image in &new.images {
            let filename = if image.filename.is_empty() {
                "image.jpg"
            } else {
                image.filename.as_str()
            };
            let key = format!("{id}/{filename}");
            let url = self
                .images
                .put(&key, image.content_type.as_deref(), image.bytes.clone())
                .await?;
            image_urls.push(url);
        }

        let now = self.clock.now();
        let ticket = Ticket {
            id,
            submitter_id: new.submitter_id,
            brand: new.brand,
            category: new.category,
            notes: new.notes,
            image_urls,
            status: TicketStatus::Submitted,
            assigned_reviewer_id: None,
            claimed_at: None,
            version: 1,
            created_at: now,
            updated_at: now,
        };
        let event = NewEvent {
            ticket_id: id,
            kind: EventKind::Created,
            actor_id: ticket.submitter_id.clone(),
            from_status: None,
            to_status: Some(TicketStatus::Submitted),
            note: None,
            recorded_at: now,
        };
        self.store.insert_ticket(&ticket, &event).await?;

        tracing::info!(ticket_id = %id, brand = %ticket.brand, images = count, "ticket submitted");
        Ok(ticket)
    }

    /// Claim a ticket for exclusive review.
    ///
    /// Claiming a `Submitted` or `NeedMoreInfo` ticket force-advances it to
    /// `InReview` (this bypasses the transition table on purpose: claim
    /// targets `InReview` from exactly the two states that allow it).
    /// Re-claiming by the holding reviewer is accepted: the claim timestamp
    /// is re-stamped and a fresh `Claimed` event is emitted.
    ///
    /// # Errors
    ///
    /// - [`CoreError::TicketNotFound`] if the ticket is absent
    /// - [`CoreError::Conflict`] if another reviewer holds the claim, or
    ///   the ticket stays contended past the retry budget
    /// - [`CoreError::InvalidState`] if the ticket is terminal
    /// - [`CoreError::Storage`] on persistence failure
    pub async fn claim(&self, id: TicketId, reviewer_id: &str) -> Result<Ticket> {
        for _ in 0..CAS_ATTEMPTS {
            let mut ticket = self.fetch_required(id).await?;

            if let Some(holder) = &ticket.assigned_reviewer_id {
                if holder != reviewer_id {
                    return Err(CoreError::Conflict(format!(
                        "ticket {id} is already claimed by another reviewer"
                    )));
                }
            }
            if ticket.status.is_terminal() {
                return Err(CoreError::InvalidState(format!(
                    "cannot claim a {} ticket",
                    ticket.status
                )));
            }

            let now = self.clock.now();
            let from = ticket.status;
            if matches!(from, TicketStatus::Submitted | TicketStatus::NeedMoreInfo) {
                ticket.status = TicketStatus::InReview;
            }
            ticket.assigned_reviewer_id = Some(reviewer_id.to_owned());
            ticket.claimed_at = Some(now);
            ticket.updated_at = now;
            let expected = ticket.version;
            ticket.version += 1;

            let event = NewEvent {
                ticket_id: id,
                kind: EventKind::Claimed,
                actor_id: Some(reviewer_id.to_owned()),
                from_status: Some(from),
                to_status: Some(ticket.status),
                note: None,
                recorded_at: now,
            };
            match self.store.update_ticket(&ticket, expected, &event).await? {
                UpdateOutcome::Applied => {
                    tracing::info!(ticket_id = %id, reviewer_id, from = %from, to = %ticket.status, "ticket claimed");
                    return Ok(ticket);
                }
                UpdateOutcome::VersionMismatch => {}
            }
        }
        Err(CoreError::Conflict(format!(
            "ticket {id} was modified concurrently; claim aborted"
        )))
    }

    /// Release a claim. Status is deliberately not reverted.
    ///
    /// # Errors
    ///
    /// - [`CoreError::TicketNotFound`] if the ticket is absent
    /// - [`CoreError::InvalidState`] if nobody holds the ticket
    /// - [`CoreError::Forbidden`] if the caller is not the assigned reviewer
    /// - [`CoreError::Conflict`] if the ticket stays contended past the
    ///   retry budget
    /// - [`CoreError::Storage`] on persistence failure
    pub async fn unclaim(&self, id: TicketId, reviewer_id: &str) -> Result<Ticket> {
        for _ in 0..CAS_ATTEMPTS {
            let mut ticket = self.fetch_required(id).await?;

            let Some(holder) = &ticket.assigned_reviewer_id else {
                return Err(CoreError::InvalidState(format!(
                    "ticket {id} is not claimed"
                )));
            };
            if holder != reviewer_id {
                return Err(CoreError::Forbidden(format!(
                    "ticket {id} is assigned to a different reviewer"
                )));
            }

            let now = self.clock.now();
            ticket.assigned_reviewer_id = None;
            ticket.claimed_at = None;
            ticket.updated_at = now;
            let expected = ticket.version;
            ticket.version += 1;

            let event = NewEvent {
                ticket_id: id,
                kind: EventKind::Unclaimed,
                actor_id: Some(reviewer_id.to_owned()),
                from_status: None,
                to_status: None,
                note: None,
                recorded_at: now,
            };
            match self.store.update_ticket(&ticket, expected, &event).await? {
                UpdateOutcome::Applied => {
                    tracing::info!(ticket_id = %id, reviewer_id, "ticket unclaimed");
                    return Ok(ticket);
                }
                UpdateOutcome::VersionMismatch => {}
            }
        }
        Err(CoreError::Conflict(format!(
            "ticket {id} was modified concurrently; unclaim aborted"
        )))
    }

    /// Move a ticket along the legal-transition table.
    ///
    /// Claim fields are untouched; this is the generic status path only.
    ///
    /// # Errors
    ///
    /// - [`CoreError::TicketNotFound`] if the ticket is absent
    /// - [`CoreError::IllegalTransition`] if the move is not in the table
    ///   (self-transitions never are)
    /// - [`CoreError::Conflict`] if the ticket stays contended past the
    ///   retry budget
    /// - [`CoreError::Storage`] on persistence failure
    pub async fn update_status(&self, id: TicketId, to: TicketStatus) -> Result<Ticket> {
        for _ in 0..CAS_ATTEMPTS {
            let mut ticket = self.fetch_required(id).await?;

            let from = ticket.status;
            if !lifecycle::is_legal_transition(from, to) {
                return Err(CoreError::IllegalTransition { from, to });
            }

            let now = self.clock.now();
            ticket.status = to;
            ticket.updated_at = now;
            let expected = ticket.version;
            ticket.version += 1;

            let event = NewEvent {
                ticket_id: id,
                kind: EventKind::StatusChanged,
                actor_id: None,
                from_status: Some(from),
                to_status: Some(to),
                note: None,
                recorded_at: now,
            };
            match self.store.update_ticket(&ticket, expected, &event).await? {
                UpdateOutcome::Applied => {
                    tracing::info!(ticket_id = %id, from = %from, to = %to, "ticket status updated");
                    return Ok(ticket);
                }
                UpdateOutcome::VersionMismatch => {}
            }
        }
        Err(CoreError::Conflict(format!(
            "ticket {id} was modified concurrently; status update aborted"
        )))
    }

    /// Record the one-shot verdict and force the ticket to `Resolved`.
    ///
    /// This is an override path: it is not subject to the transition table
    /// and resolves the ticket from any current status. The uniqueness of
    /// the result is enforced both here (checked before insert) and by the
    /// store's insert contract.
    ///
    /// # Errors
    ///
    /// - [`CoreError::TicketNotFound`] if the ticket is absent
    /// - [`CoreError::ResultExists`] if a result was already recorded
    /// - [`CoreError::Conflict`] if the ticket stays contended past the
    ///   retry budget
    /// - [`CoreError::Storage`] on persistence failure
    pub async fn record_result(
        &self,
        id: TicketId,
        verdict: Verdict,
        rationale: Option<String>,
        reviewer_id: Option<String>,
    ) -> Result<ReviewResult> {
        for _ in 0..CAS_ATTEMPTS {
            let mut ticket = self.fetch_required(id).await?;
            if self.store.fetch_result(id).await?.is_some() {
                return Err(CoreError::ResultExists(id));
            }

            let now = self.clock.now();
            let from = ticket.status;
            ticket.status = TicketStatus::Resolved;
            ticket.updated_at = now;
            let expected = ticket.version;
            ticket.version += 1;

            let result = ReviewResult {
                ticket_id: id,
                verdict,
                rationale: rationale.clone().unwrap_or_default(),
                reviewer_id: reviewer_id.clone(),
                reviewed_at: now,
            };
            let event = NewEvent {
                ticket_id: id,
                kind: EventKind::ResultAdded,
                actor_id: reviewer_id.clone(),
                from_status: Some(from),
                to_status: Some(TicketStatus::Resolved),
                note: None,
                recorded_at: now,
            };
            match self
                .store
                .insert_result(&ticket, expected, &result, &event)
                .await?
            {
                ResultInsertOutcome::Applied => {
                    tracing::info!(ticket_id = %id, verdict = %verdict, from = %from, "result recorded");
                    return Ok(result);
                }
                ResultInsertOutcome::ResultExists => return Err(CoreError::ResultExists(id)),
                ResultInsertOutcome::VersionMismatch => {}
            }
        }
        Err(CoreError::Conflict(format!(
            "ticket {id} was modified concurrently; result aborted"
        )))
    }

    /// Fetch a ticket's result.
    ///
    /// # Errors
    ///
    /// - [`CoreError::TicketNotFound`] if the ticket is absent
    /// - [`CoreError::ResultNotFound`] if the ticket has no result
    /// - [`CoreError::Storage`] on query failure
    pub async fn get_result(&self, id: TicketId) -> Result<ReviewResult> {
        self.fetch_required(id).await?;
        self.store
            .fetch_result(id)
            .await?
            .ok_or(CoreError::ResultNotFound(id))
    }

    /// Fetch a ticket snapshot.
    ///
    /// # Errors
    ///
    /// - [`CoreError::TicketNotFound`] if the ticket is absent
    /// - [`CoreError::Storage`] on query failure
    pub async fn get_ticket(&self, id: TicketId) -> Result<Ticket> {
        self.fetch_required(id).await
    }

    /// List tickets, newest-created first, capped at the filter's
    /// effective limit.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Storage`] on query failure.
    pub async fn list_tickets(&self, filter: &TicketFilter) -> Result<Vec<Ticket>> {
        Ok(self.store.list_tickets(filter).await?)
    }

    /// List a ticket's audit history, ascending by time.
    ///
    /// # Errors
    ///
    /// - [`CoreError::TicketNotFound`] if the ticket itself is absent
    /// - [`CoreError::Storage`] on query failure
    pub async fn list_events(&self, id: TicketId) -> Result<Vec<TicketEvent>> {
        self.fetch_required(id).await?;
        Ok(self.store.list_events(id).await?)
    }

    async fn fetch_required(&self, id: TicketId) -> Result<Ticket> {
        self.store
            .fetch_ticket(id)
            .await?
            .ok_or(CoreError::TicketNotFound(id))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::mocks::{FailingImageStore, FixedClock, InMemoryImageStore, InMemoryTicketStore};
    use chrono::{TimeZone, Utc};

    fn fixed_clock() -> Arc<FixedClock> {
        Arc::new(FixedClock::at(
            Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
        ))
    }

    fn service_with(
        store: Arc<InMemoryTicketStore>,
        images: Arc<dyn ImageStore>,
    ) -> ReviewService {
        ReviewService::new(store, images, fixed_clock())
    }

    fn service() -> (ReviewService, Arc<InMemoryTicketStore>, Arc<InMemoryImageStore>) {
        let store = Arc::new(InMemoryTicketStore::new());
        let images = Arc::new(InMemoryImageStore::new());
        let service = service_with(Arc::clone(&store), images.clone());
        (service, store, images)
    }

    fn submission(image_count: usize) -> NewTicket {
        let images = (0..image_count)
            .map(|i| NewImage::new(format!("img{i}.jpg"), Bytes::from_static(b"fake-jpeg")))
            .collect();
        NewTicket {
            brand: "Dior".to_string(),
            category: "lipstick".to_string(),
            notes: "bought at a market stall".to_string(),
            submitter_id: Some("user_42".to_string()),
            images,
        }
    }

    async fn submitted_ticket(service: &ReviewService) -> Ticket {
        service.submit(submission(1)).await.unwrap()
    }

    #[tokio::test]
    async fn submit_creates_submitted_ticket_with_created_event() {
        let (service, _, images) = service();

        let ticket = service.submit(submission(1)).await.unwrap();

        assert_eq!(ticket.status, TicketStatus::Submitted);
        assert_eq!(ticket.created_at, ticket.updated_at);
        assert_eq!(ticket.image_urls.len(), 1);
        assert!(!ticket.is_claimed());

        let events = service.list_events(ticket.id).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::Created);
        assert_eq!(events[0].to_status, Some(TicketStatus::Submitted));
        assert_eq!(events[0].actor_id.as_deref(), Some("user_42"));

        assert_eq!(images.uploads().len(), 1);
        assert!(images.uploads()[0].starts_with(&ticket.id.to_string()));
    }

    #[tokio::test]
    async fn submit_rejects_zero_and_six_images() {
        let (service, store, images) = service();

        for count in [0, 6] {
            let err = service.submit(submission(count)).await.unwrap_err();
            assert!(matches!(err, CoreError::Validation(_)), "count {count}");
        }
        // Nothing was uploaded or persisted
        assert!(images.uploads().is_empty());
        assert!(store
            .list_tickets(&TicketFilter::default())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn submit_accepts_five_images() {
        let (service, _, _) = service();
        let ticket = service.submit(submission(5)).await.unwrap();
        assert_eq!(ticket.image_urls.len(), 5);
    }

    #[tokio::test]
    async fn failed_upload_aborts_the_whole_submission() {
        let store = Arc::new(InMemoryTicketStore::new());
        // Third of five uploads fails
        let images = Arc::new(FailingImageStore::failing_after(2));
        let service = service_with(Arc::clone(&store), images);

        let err = service.submit(submission(5)).await.unwrap_err();
        assert!(matches!(err, CoreError::Storage(_)));

        // No ticket row was written
        assert!(store
            .list_tickets(&TicketFilter::default())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn claim_advances_submitted_ticket_to_in_review() {
        let (service, _, _) = service();
        let ticket = submitted_ticket(&service).await;

        let claimed = service.claim(ticket.id, "rev_001").await.unwrap();

        assert_eq!(claimed.status, TicketStatus::InReview);
        assert_eq!(claimed.assigned_reviewer_id.as_deref(), Some("rev_001"));
        assert!(claimed.claimed_at.is_some());

        let events = service.list_events(ticket.id).await.unwrap();
        let claim_event = events.last().unwrap();
        assert_eq!(claim_event.kind, EventKind::Claimed);
        assert_eq!(claim_event.from_status, Some(TicketStatus::Submitted));
        assert_eq!(claim_event.to_status, Some(TicketStatus::InReview));
    }

    #[tokio::test]
    async fn claim_by_second_reviewer_is_a_conflict() {
        let (service, _, _) = service();
        let ticket = submitted_ticket(&service).await;

        service.claim(ticket.id, "rev_001").await.unwrap();
        let err = service.claim(ticket.id, "rev_002").await.unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));

        // The original claim is intact
        let current = service.get_ticket(ticket.id).await.unwrap();
        assert_eq!(current.assigned_reviewer_id.as_deref(), Some("rev_001"));
    }

    #[tokio::test]
    async fn reclaim_by_same_reviewer_is_accepted_and_re_emits() {
        let (service, _, _) = service();
        let ticket = submitted_ticket(&service).await;

        service.claim(ticket.id, "rev_001").await.unwrap();
        let again = service.claim(ticket.id, "rev_001").await.unwrap();
        assert_eq!(again.assigned_reviewer_id.as_deref(), Some("rev_001"));
        assert_eq!(again.status, TicketStatus::InReview);

        let events = service.list_events(ticket.id).await.unwrap();
        let claims = events
            .iter()
            .filter(|e| e.kind == EventKind::Claimed)
            .count();
        assert_eq!(claims, 2);
    }

    #[tokio::test]
    async fn claim_from_need_more_info_advances_to_in_review() {
        let (service, _, _) = service();
        let ticket = submitted_ticket(&service).await;
        service
            .update_status(ticket.id, TicketStatus::NeedMoreInfo)
            .await
            .unwrap();

        let claimed = service.claim(ticket.id, "rev_001").await.unwrap();
        assert_eq!(claimed.status, TicketStatus::InReview);
    }

    #[tokio::test]
    async fn claim_on_terminal_ticket_is_invalid() {
        let (service, _, _) = service();
        let ticket = submitted_ticket(&service).await;
        service
            .update_status(ticket.id, TicketStatus::Rejected)
            .await
            .unwrap();

        let err = service.claim(ticket.id, "rev_001").await.unwrap_err();
        assert!(matches!(err, CoreError::InvalidState(_)));
    }

    #[tokio::test]
    async fn claim_on_missing_ticket_is_not_found() {
        let (service, _, _) = service();
        let err = service.claim(TicketId::new(), "rev_001").await.unwrap_err();
        assert!(matches!(err, CoreError::TicketNotFound(_)));
    }

    #[tokio::test]
    async fn concurrent_claims_admit_exactly_one_reviewer() {
        let (service, _, _) = service();
        let ticket = submitted_ticket(&service).await;

        let a = {
            let service = service.clone();
            let id = ticket.id;
            tokio::spawn(async move { service.claim(id, "rev_001").await })
        };
        let b = {
            let service = service.clone();
            let id = ticket.id;
            tokio::spawn(async move { service.claim(id, "rev_002").await })
        };
        let (a, b) = (a.await.unwrap(), b.await.unwrap());

        assert_eq!(
            u32::from(a.is_ok()) + u32::from(b.is_ok()),
            1,
            "exactly one claim must win: {a:?} vs {b:?}"
        );
        let loser = if a.is_err() { a } else { b };
        assert!(matches!(loser.unwrap_err(), CoreError::Conflict(_)));

        let current = service.get_ticket(ticket.id).await.unwrap();
        assert!(current.is_claimed());
        assert_eq!(current.status, TicketStatus::InReview);
    }

    #[tokio::test]
    async fn unclaim_clears_assignment_but_not_status() {
        let (service, _, _) = service();
        let ticket = submitted_ticket(&service).await;
        service.claim(ticket.id, "rev_001").await.unwrap();

        let released = service.unclaim(ticket.id, "rev_001").await.unwrap();

        assert!(released.assigned_reviewer_id.is_none());
        assert!(released.claimed_at.is_none());
        // Status deliberately stays where the claim advanced it
        assert_eq!(released.status, TicketStatus::InReview);

        let events = service.list_events(ticket.id).await.unwrap();
        assert_eq!(events.last().unwrap().kind, EventKind::Unclaimed);
    }

    #[tokio::test]
    async fn unclaim_by_wrong_reviewer_is_forbidden() {
        let (service, _, _) = service();
        let ticket = submitted_ticket(&service).await;
        service.claim(ticket.id, "rev_001").await.unwrap();

        let err = service.unclaim(ticket.id, "rev_002").await.unwrap_err();
        assert!(matches!(err, CoreError::Forbidden(_)));
    }

    #[tokio::test]
    async fn unclaim_without_claim_is_invalid_state() {
        let (service, _, _) = service();
        let ticket = submitted_ticket(&service).await;

        let err = service.unclaim(ticket.id, "rev_001").await.unwrap_err();
        assert!(matches!(err, CoreError::InvalidState(_)));
    }

    #[tokio::test]
    async fn update_status_follows_the_table() {
        let (service, _, _) = service();
        let ticket = submitted_ticket(&service).await;

        let updated = service
            .update_status(ticket.id, TicketStatus::InReview)
            .await
            .unwrap();
        assert_eq!(updated.status, TicketStatus::InReview);

        let events = service.list_events(ticket.id).await.unwrap();
        let last = events.last().unwrap();
        assert_eq!(last.kind, EventKind::StatusChanged);
        assert_eq!(last.from_status, Some(TicketStatus::Submitted));
        assert_eq!(last.to_status, Some(TicketStatus::InReview));
    }

    #[tokio::test]
    async fn submitted_cannot_jump_to_resolved_via_status_update() {
        let (service, _, _) = service();
        let ticket = submitted_ticket(&service).await;

        let err = service
            .update_status(ticket.id, TicketStatus::Resolved)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::IllegalTransition {
                from: TicketStatus::Submitted,
                to: TicketStatus::Resolved,
            }
        ));
    }

    #[tokio::test]
    async fn self_transition_is_illegal() {
        let (service, _, _) = service();
        let ticket = submitted_ticket(&service).await;

        let err = service
            .update_status(ticket.id, TicketStatus::Submitted)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::IllegalTransition { .. }));
    }

    #[tokio::test]
    async fn update_status_does_not_touch_claim_fields() {
        let (service, _, _) = service();
        let ticket = submitted_ticket(&service).await;
        service.claim(ticket.id, "rev_001").await.unwrap();

        let updated = service
            .update_status(ticket.id, TicketStatus::NeedMoreInfo)
            .await
            .unwrap();
        assert_eq!(updated.assigned_reviewer_id.as_deref(), Some("rev_001"));
        assert!(updated.claimed_at.is_some());
    }

    #[tokio::test]
    async fn record_result_forces_resolved_from_submitted() {
        let (service, _, _) = service();
        let ticket = submitted_ticket(&service).await;

        // submitted -> resolved is not in the table, but the result
        // recorder overrides it
        let result = service
            .record_result(
                ticket.id,
                Verdict::Authentic,
                Some("holograms check out".to_string()),
                Some("rev_001".to_string()),
            )
            .await
            .unwrap();

        assert_eq!(result.verdict, Verdict::Authentic);
        let current = service.get_ticket(ticket.id).await.unwrap();
        assert_eq!(current.status, TicketStatus::Resolved);

        let events = service.list_events(ticket.id).await.unwrap();
        let last = events.last().unwrap();
        assert_eq!(last.kind, EventKind::ResultAdded);
        assert_eq!(last.from_status, Some(TicketStatus::Submitted));
        assert_eq!(last.to_status, Some(TicketStatus::Resolved));
    }

    #[tokio::test]
    async fn second_result_is_rejected_regardless_of_status() {
        let (service, _, _) = service();
        let ticket = submitted_ticket(&service).await;

        service
            .record_result(ticket.id, Verdict::Authentic, None, None)
            .await
            .unwrap();
        let err = service
            .record_result(ticket.id, Verdict::Inauthentic, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::ResultExists(_)));
    }

    #[tokio::test]
    async fn get_result_distinguishes_missing_ticket_from_missing_result() {
        let (service, _, _) = service();
        let ticket = submitted_ticket(&service).await;

        let err = service.get_result(TicketId::new()).await.unwrap_err();
        assert!(matches!(err, CoreError::TicketNotFound(_)));

        let err = service.get_result(ticket.id).await.unwrap_err();
        assert!(matches!(err, CoreError::ResultNotFound(_)));

        service
            .record_result(ticket.id, Verdict::Undetermined, None, None)
            .await
            .unwrap();
        let result = service.get_result(ticket.id).await.unwrap();
        assert_eq!(result.verdict, Verdict::Undetermined);
        assert_eq!(result.ticket_id, ticket.id);
    }

    #[tokio::test]
    async fn claim_invariant_reviewer_iff_claimed_at() {
        let (service, _, _) = service();
        let ticket = submitted_ticket(&service).await;

        let check = |t: &Ticket| {
            assert_eq!(t.assigned_reviewer_id.is_some(), t.claimed_at.is_some());
        };

        check(&service.get_ticket(ticket.id).await.unwrap());
        check(&service.claim(ticket.id, "rev_001").await.unwrap());
        check(&service.unclaim(ticket.id, "rev_001").await.unwrap());
    }

    #[tokio::test]
    async fn event_history_only_grows_and_stays_ordered() {
        let (service, _, _) = service();
        let ticket = submitted_ticket(&service).await;

        let mut previous_len = service.list_events(ticket.id).await.unwrap().len();
        service.claim(ticket.id, "rev_001").await.unwrap();
        service.unclaim(ticket.id, "rev_001").await.unwrap();
        service.claim(ticket.id, "rev_002").await.unwrap();
        service
            .record_result(ticket.id, Verdict::Inauthentic, None, Some("rev_002".into()))
            .await
            .unwrap();

        let events = service.list_events(ticket.id).await.unwrap();
        assert!(events.len() > previous_len);
        previous_len = events.len();
        assert_eq!(previous_len, 5);

        for window in events.windows(2) {
            assert!(window[0].recorded_at <= window[1].recorded_at);
            assert!(window[0].seq < window[1].seq);
        }
        assert_eq!(events[0].kind, EventKind::Created);
        assert_eq!(events.last().unwrap().kind, EventKind::ResultAdded);
    }

    #[tokio::test]
    async fn events_for_missing_ticket_is_not_found() {
        let (service, _, _) = service();
        let err = service.list_events(TicketId::new()).await.unwrap_err();
        assert!(matches!(err, CoreError::TicketNotFound(_)));
    }

    #[tokio::test]
    async fn list_filters_are_conjunctive() {
        let (service, _, _) = service();

        let mine = service.submit(submission(1)).await.unwrap();
        let theirs = service
            .submit(NewTicket {
                submitter_id: Some("user_99".to_string()),
                ..submission(1)
            })
            .await
            .unwrap();
        service.claim(theirs.id, "rev_001").await.unwrap();

        let filter = TicketFilter {
            submitter_id: Some("user_42".to_string()),
            ..TicketFilter::default()
        };
        let tickets = service.list_tickets(&filter).await.unwrap();
        assert_eq!(tickets.len(), 1);
        assert_eq!(tickets[0].id, mine.id);

        let filter = TicketFilter {
            status: Some(TicketStatus::InReview),
            reviewer_id: Some("rev_001".to_string()),
            ..TicketFilter::default()
        };
        let tickets = service.list_tickets(&filter).await.unwrap();
        assert_eq!(tickets.len(), 1);
        assert_eq!(tickets[0].id, theirs.id);

        let filter = TicketFilter {
            unassigned_only: true,
            ..TicketFilter::default()
        };
        let tickets = service.list_tickets(&filter).await.unwrap();
        assert_eq!(tickets.len(), 1);
        assert_eq!(tickets[0].id, mine.id);
    }
}
