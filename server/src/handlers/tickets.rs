//! Ticket endpoints.
//!
//! - `POST /tickets` — submit a ticket with 1 to 5 images (multipart)
//! - `GET /tickets/:id` — fetch a ticket
//! - `GET /tickets` — list tickets with optional filters
//! - `POST /tickets/:id/claim` — claim for review (API key)
//! - `POST /tickets/:id/unclaim` — release a claim (API key)
//! - `PATCH /tickets/:id/status` — move along the transition table (API key)

use crate::auth::ReviewerKey;
use crate::error::AppError;
use crate::state::AppState;
use axum::{
    extract::{Multipart, Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use detective_core::{NewImage, NewTicket, Ticket, TicketFilter, TicketId, TicketStatus};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Ticket details response.
#[derive(Debug, Serialize)]
pub struct TicketResponse {
    /// Ticket ID.
    pub ticket_id: TicketId,
    /// Submitting user, if known.
    pub user_id: Option<String>,
    /// Product brand.
    pub brand: String,
    /// Product category.
    pub category: String,
    /// Submitter notes.
    pub notes: String,
    /// Public URLs of the uploaded images, in upload order.
    pub images: Vec<String>,
    /// Current lifecycle status.
    pub status: TicketStatus,
    /// Reviewer currently holding the claim, if any.
    pub assigned_reviewer_id: Option<String>,
    /// When the current claim was taken.
    pub claimed_at: Option<DateTime<Utc>>,
    /// When the ticket was submitted.
    pub created_at: DateTime<Utc>,
    /// When the ticket was last mutated.
    pub updated_at: DateTime<Utc>,
}

impl From<Ticket> for TicketResponse {
    fn from(ticket: Ticket) -> Self {
        Self {
            ticket_id: ticket.id,
            user_id: ticket.submitter_id,
            brand: ticket.brand,
            category: ticket.category,
            notes: ticket.notes,
            images: ticket.image_urls,
            status: ticket.status,
            assigned_reviewer_id: ticket.assigned_reviewer_id,
            claimed_at: ticket.claimed_at,
            created_at: ticket.created_at,
            updated_at: ticket.updated_at,
        }
    }
}

/// Query parameters for listing tickets.
#[derive(Debug, Deserialize)]
pub struct ListTicketsQuery {
    /// Filter by submitting user.
    pub user_id: Option<String>,
    /// Filter by status.
    pub status: Option<TicketStatus>,
    /// Only tickets with no assigned reviewer.
    #[serde(default)]
    pub unassigned: bool,
    /// Filter by assigned reviewer.
    pub reviewer_id: Option<String>,
    /// Max items to return (clamped to [1, 200], default 50).
    pub limit: Option<u32>,
}

/// Request body for claiming or unclaiming a ticket.
#[derive(Debug, Deserialize)]
pub struct ClaimRequest {
    /// The acting reviewer.
    pub reviewer_id: String,
}

/// Request body for a status update.
#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    /// Destination status.
    pub status: TicketStatus,
}

// ============================================================================
// Handlers
// ============================================================================

/// Submit a ticket with images.
///
/// Multipart fields: `brand`, `category`, optional `notes`, optional
/// `user_id`, and 1 to 5 `images` file parts. All uploads must succeed
/// before the ticket is persisted.
///
/// # Errors
///
/// 400 if the multipart body is malformed, a required field is missing,
/// or the image count is outside [1, 5].
pub async fn create_ticket(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<TicketResponse>, AppError> {
    let mut brand: Option<String> = None;
    let mut category: Option<String> = None;
    let mut notes = String::new();
    let mut user_id: Option<String> = None;
    let mut images: Vec<NewImage> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::bad_request(format!("Malformed multipart body: {e}")))?
    {
        let name = field.name().map(ToString::to_string);
        match name.as_deref() {
            Some("brand") => brand = Some(read_text(field).await?),
            Some("category") => category = Some(read_text(field).await?),
            Some("notes") => notes = read_text(field).await?,
            Some("user_id") => user_id = Some(read_text(field).await?),
            Some("images") => {
                let filename = field.file_name().unwrap_or("image.jpg").to_string();
                let content_type = field.content_type().map(ToString::to_string);
                let bytes = field.bytes().await.map_err(|e| {
                    AppError::bad_request(format!("Failed to read image part: {e}"))
                })?;
                images.push(NewImage {
                    filename,
                    content_type,
                    bytes,
                });
            }
            _ => {}
        }
    }

    let brand = brand.ok_or_else(|| AppError::bad_request("Field 'brand' is required"))?;
    let category = category.ok_or_else(|| AppError::bad_request("Field 'category' is required"))?;

    let ticket = state
        .service
        .submit(NewTicket {
            brand,
            category,
            notes,
            submitter_id: user_id,
            images,
        })
        .await?;
    Ok(Json(ticket.into()))
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::bad_request(format!("Malformed multipart field: {e}")))
}

/// Get a ticket by ID.
pub async fn get_ticket(
    State(state): State<AppState>,
    Path(ticket_id): Path<Uuid>,
) -> Result<Json<TicketResponse>, AppError> {
    let ticket = state
        .service
        .get_ticket(TicketId::from_uuid(ticket_id))
        .await?;
    Ok(Json(ticket.into()))
}

/// List tickets, newest first. All filters are conjunctive.
pub async fn list_tickets(
    State(state): State<AppState>,
    Query(query): Query<ListTicketsQuery>,
) -> Result<Json<Vec<TicketResponse>>, AppError> {
    let filter = TicketFilter {
        submitter_id: query.user_id,
        status: query.status,
        unassigned_only: query.unassigned,
        reviewer_id: query.reviewer_id,
        limit: query.limit,
    };
    let tickets = state.service.list_tickets(&filter).await?;
    Ok(Json(tickets.into_iter().map(Into::into).collect()))
}

/// Claim a ticket for exclusive review. Requires the API key.
///
/// # Errors
///
/// 404 unknown ticket, 409 if another reviewer holds the claim.
pub async fn claim_ticket(
    _key: ReviewerKey,
    State(state): State<AppState>,
    Path(ticket_id): Path<Uuid>,
    Json(request): Json<ClaimRequest>,
) -> Result<Json<TicketResponse>, AppError> {
    let ticket = state
        .service
        .claim(TicketId::from_uuid(ticket_id), &request.reviewer_id)
        .await?;
    Ok(Json(ticket.into()))
}

/// Release a claim. Requires the API key.
///
/// # Errors
///
/// 404 unknown ticket, 400 if not claimed, 403 if the caller is not the
/// assigned reviewer.
pub async fn unclaim_ticket(
    _key: ReviewerKey,
    State(state): State<AppState>,
    Path(ticket_id): Path<Uuid>,
    Json(request): Json<ClaimRequest>,
) -> Result<Json<TicketResponse>, AppError> {
    let ticket = state
        .service
        .unclaim(TicketId::from_uuid(ticket_id), &request.reviewer_id)
        .await?;
    Ok(Json(ticket.into()))
}

/// Move a ticket along the legal-transition table. Requires the API key.
///
/// # Errors
///
/// 404 unknown ticket, 400 for an illegal transition.
pub async fn update_status(
    _key: ReviewerKey,
    State(state): State<AppState>,
    Path(ticket_id): Path<Uuid>,
    Json(request): Json<StatusUpdateRequest>,
) -> Result<Json<TicketResponse>, AppError> {
    let ticket = state
        .service
        .update_status(TicketId::from_uuid(ticket_id), request.status)
        .await?;
    Ok(Json(ticket.into()))
}
