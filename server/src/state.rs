//! Application state for the HTTP server.

use crate::config::AuthConfig;
use detective_core::ReviewService;
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
///
/// Cloned (cheaply via `Arc`) for each request. The service already owns
/// its collaborators as injected trait objects, so swapping Postgres/S3
/// for in-memory doubles in tests happens below this struct.
#[derive(Clone)]
pub struct AppState {
    /// The ticket lifecycle service.
    pub service: Arc<ReviewService>,
    /// Reviewer API-key configuration for the keyed endpoints.
    pub auth: AuthConfig,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(service: Arc<ReviewService>, auth: AuthConfig) -> Self {
        Self { service, auth }
    }
}
