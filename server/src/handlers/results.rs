//! Result endpoints.
//!
//! - `POST /tickets/:id/result` — record the one-shot verdict (API key)
//! - `GET /tickets/:id/result` — fetch the verdict

use crate::auth::ReviewerKey;
use crate::error::AppError;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use detective_core::{ReviewResult, TicketId, Verdict};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request to record a verdict.
#[derive(Debug, Deserialize)]
pub struct ResultRequest {
    /// The verdict.
    pub verdict: Verdict,
    /// Free-text justification.
    pub rationale: Option<String>,
    /// The recording reviewer, if known.
    pub reviewer_id: Option<String>,
}

/// Verdict response.
#[derive(Debug, Serialize)]
pub struct ResultResponse {
    /// The owning ticket.
    pub ticket_id: TicketId,
    /// The verdict.
    pub verdict: Verdict,
    /// Free-text justification.
    pub rationale: String,
    /// The recording reviewer, if known.
    pub reviewer_id: Option<String>,
    /// When the verdict was recorded.
    pub reviewed_at: DateTime<Utc>,
}

impl From<ReviewResult> for ResultResponse {
    fn from(result: ReviewResult) -> Self {
        Self {
            ticket_id: result.ticket_id,
            verdict: result.verdict,
            rationale: result.rationale,
            reviewer_id: result.reviewer_id,
            reviewed_at: result.reviewed_at,
        }
    }
}

/// Record the verdict for a ticket and force it to `resolved`.
/// Requires the API key.
///
/// # Errors
///
/// 404 unknown ticket, 400 if a result already exists.
pub async fn create_result(
    _key: ReviewerKey,
    State(state): State<AppState>,
    Path(ticket_id): Path<Uuid>,
    Json(request): Json<ResultRequest>,
) -> Result<Json<ResultResponse>, AppError> {
    let result = state
        .service
        .record_result(
            TicketId::from_uuid(ticket_id),
            request.verdict,
            request.rationale,
            request.reviewer_id,
        )
        .await?;
    Ok(Json(result.into()))
}

/// Fetch the verdict for a ticket.
///
/// # Errors
///
/// 404 if the ticket is absent or has no result yet.
pub async fn get_result(
    State(state): State<AppState>,
    Path(ticket_id): Path<Uuid>,
) -> Result<Json<ResultResponse>, AppError> {
    let result = state
        .service
        .get_result(TicketId::from_uuid(ticket_id))
        .await?;
    Ok(Json(result.into()))
}
