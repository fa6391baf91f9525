//! Router configuration for the review service.

use crate::handlers::{events, health, results, tickets};
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, patch, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Maximum accepted request body: five images with headroom.
const MAX_BODY_BYTES: usize = 25 * 1024 * 1024;

/// Build the complete Axum router.
///
/// Submission and read endpoints are public; the reviewer endpoints
/// (claim, unclaim, status, result) require the API key via the
/// [`crate::auth::ReviewerKey`] extractor inside their handlers.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Liveness (no authentication)
        .route("/", get(health::health_check))
        .route("/health", get(health::health_check))
        // Tickets
        .route(
            "/tickets",
            post(tickets::create_ticket).get(tickets::list_tickets),
        )
        .route("/tickets/:id", get(tickets::get_ticket))
        .route("/tickets/:id/claim", post(tickets::claim_ticket))
        .route("/tickets/:id/unclaim", post(tickets::unclaim_ticket))
        .route("/tickets/:id/status", patch(tickets::update_status))
        // Results & audit history
        .route(
            "/tickets/:id/result",
            post(results::create_result).get(results::get_result),
        )
        .route("/tickets/:id/events", get(events::list_events))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
