//! In-memory collaborator doubles.
//!
//! These back the domain test suite and the server's HTTP tests, honoring
//! the same contracts as the production Postgres/S3 implementations: the
//! ticket store serializes writes through a mutex and enforces the
//! compare-and-swap version check, so race tests against it are meaningful.

use crate::blob::ImageStore;
use crate::clock::Clock;
use crate::error::StorageError;
use crate::store::{ResultInsertOutcome, TicketFilter, TicketStore, UpdateOutcome};
use crate::types::{NewEvent, ReviewResult, Ticket, TicketEvent, TicketId};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

/// Fixed clock for deterministic timestamps in tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(DateTime<Utc>);

impl FixedClock {
    /// Clock frozen at the given instant.
    #[must_use]
    pub const fn at(instant: DateTime<Utc>) -> Self {
        Self(instant)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

#[derive(Default)]
struct Inner {
    tickets: HashMap<TicketId, Ticket>,
    results: HashMap<TicketId, ReviewResult>,
    events: HashMap<TicketId, Vec<TicketEvent>>,
}

impl Inner {
    fn append_event(&mut self, event: &NewEvent) {
        let log = self.events.entry(event.ticket_id).or_default();
        let seq = log.last().map_or(1, |e| e.seq + 1);
        log.push(TicketEvent {
            seq,
            ticket_id: event.ticket_id,
            kind: event.kind,
            actor_id: event.actor_id.clone(),
            from_status: event.from_status,
            to_status: event.to_status,
            note: event.note.clone(),
            recorded_at: event.recorded_at,
        });
    }
}

/// Mutex-serialized in-memory [`TicketStore`].
#[derive(Default)]
pub struct InMemoryTicketStore {
    inner: Mutex<Inner>,
}

impl InMemoryTicketStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl TicketStore for InMemoryTicketStore {
    async fn insert_ticket(&self, ticket: &Ticket, event: &NewEvent) -> Result<(), StorageError> {
        let mut inner = self.lock();
        inner.tickets.insert(ticket.id, ticket.clone());
        inner.append_event(event);
        Ok(())
    }

    async fn fetch_ticket(&self, id: TicketId) -> Result<Option<Ticket>, StorageError> {
        Ok(self.lock().tickets.get(&id).cloned())
    }

    async fn update_ticket(
        &self,
        ticket: &Ticket,
        expected_version: i64,
        event: &NewEvent,
    ) -> Result<UpdateOutcome, StorageError> {
        let mut inner = self.lock();
        let Some(stored) = inner.tickets.get(&ticket.id) else {
            return Ok(UpdateOutcome::VersionMismatch);
        };
        if stored.version != expected_version {
            return Ok(UpdateOutcome::VersionMismatch);
        }
        inner.tickets.insert(ticket.id, ticket.clone());
        inner.append_event(event);
        Ok(UpdateOutcome::Applied)
    }

    async fn insert_result(
        &self,
        ticket: &Ticket,
        expected_version: i64,
        result: &ReviewResult,
        event: &NewEvent,
    ) -> Result<ResultInsertOutcome, StorageError> {
        let mut inner = self.lock();
        if inner.results.contains_key(&ticket.id) {
            return Ok(ResultInsertOutcome::ResultExists);
        }
        let Some(stored) = inner.tickets.get(&ticket.id) else {
            return Ok(ResultInsertOutcome::VersionMismatch);
        };
        if stored.version != expected_version {
            return Ok(ResultInsertOutcome::VersionMismatch);
        }
        inner.tickets.insert(ticket.id, ticket.clone());
        inner.results.insert(ticket.id, result.clone());
        inner.append_event(event);
        Ok(ResultInsertOutcome::Applied)
    }

    async fn fetch_result(&self, id: TicketId) -> Result<Option<ReviewResult>, StorageError> {
        Ok(self.lock().results.get(&id).cloned())
    }

    async fn list_tickets(&self, filter: &TicketFilter) -> Result<Vec<Ticket>, StorageError> {
        let inner = self.lock();
        let mut tickets: Vec<Ticket> = inner
            .tickets
            .values()
            .filter(|t| {
                filter
                    .submitter_id
                    .as_ref()
                    .is_none_or(|u| t.submitter_id.as_ref() == Some(u))
                    && filter.status.is_none_or(|s| t.status == s)
                    && (!filter.unassigned_only || t.assigned_reviewer_id.is_none())
                    && filter
                        .reviewer_id
                        .as_ref()
                        .is_none_or(|r| t.assigned_reviewer_id.as_ref() == Some(r))
            })
            .cloned()
            .collect();
        tickets.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        tickets.truncate(filter.effective_limit() as usize);
        Ok(tickets)
    }

    async fn list_events(&self, id: TicketId) -> Result<Vec<TicketEvent>, StorageError> {
        let mut events = self.lock().events.get(&id).cloned().unwrap_or_default();
        events.sort_by(|a, b| a.recorded_at.cmp(&b.recorded_at).then(a.seq.cmp(&b.seq)));
        Ok(events)
    }
}

/// In-memory [`ImageStore`] that records uploaded keys.
#[derive(Default)]
pub struct InMemoryImageStore {
    uploads: Mutex<Vec<String>>,
}

impl InMemoryImageStore {
    /// Create an empty image store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys uploaded so far, in order.
    #[must_use]
    pub fn uploads(&self) -> Vec<String> {
        self.uploads
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl ImageStore for InMemoryImageStore {
    async fn put(
        &self,
        key: &str,
        _content_type: Option<&str>,
        _bytes: Bytes,
    ) -> Result<String, StorageError> {
        self.uploads
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(key.to_owned());
        Ok(format!("http://blobs.test/tickets/{key}"))
    }
}

/// [`ImageStore`] that succeeds for the first `n` uploads and fails after,
/// for exercising mid-submission upload failures.
pub struct FailingImageStore {
    successes: usize,
    calls: AtomicUsize,
}

impl FailingImageStore {
    /// Succeed for `successes` puts, then fail every subsequent one.
    #[must_use]
    pub const fn failing_after(successes: usize) -> Self {
        Self {
            successes,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ImageStore for FailingImageStore {
    async fn put(
        &self,
        key: &str,
        _content_type: Option<&str>,
        _bytes: Bytes,
    ) -> Result<String, StorageError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.successes {
            Ok(format!("http://blobs.test/tickets/{key}"))
        } else {
            Err(StorageError("simulated upload failure".to_string()))
        }
    }
}
