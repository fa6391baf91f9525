//! Audit history endpoint.
//!
//! - `GET /tickets/:id/events` — the append-only lifecycle history

use crate::error::AppError;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use detective_core::{EventKind, TicketEvent, TicketId, TicketStatus};
use serde::Serialize;
use uuid::Uuid;

/// One audit event in a ticket's history.
#[derive(Debug, Serialize)]
pub struct EventResponse {
    /// Sequence number within the log.
    pub seq: i64,
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

impl From<TicketEvent> for EventResponse {
    fn from(event: TicketEvent) -> Self {
        Self {
            seq: event.seq,
            kind: event.kind,
            actor_id: event.actor_id,
            from_status: event.from_status,
            to_status: event.to_status,
            note: event.note,
            recorded_at: event.recorded_at,
        }
    }
}

/// List a ticket's lifecycle history, ascending by time.
///
/// # Errors
///
/// 404 if the ticket itself does not exist.
pub async fn list_events(
    State(state): State<AppState>,
    Path(ticket_id): Path<Uuid>,
) -> Result<Json<Vec<EventResponse>>, AppError> {
    let events = state
        .service
        .list_events(TicketId::from_uuid(ticket_id))
        .await?;
    Ok(Json(events.into_iter().map(Into::into).collect()))
}
