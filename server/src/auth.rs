//! API-key authentication for reviewer endpoints.
//!
//! A single static shared secret gates the mutating reviewer operations
//! (claim, unclaim, status update, result). Clients send it in the
//! `x-api-key` header; handlers opt in by taking [`ReviewerKey`] as a
//! parameter.

use crate::error::AppError;
use crate::state::AppState;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

/// Header carrying the reviewer API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Extractor proving the request carried the reviewer API key.
///
/// - Missing or mismatched key: 401 Unauthorized
/// - No key configured server-side: 500 (misconfiguration, not a client
///   error)
#[derive(Debug, Clone, Copy)]
pub struct ReviewerKey;

#[async_trait]
impl FromRequestParts<AppState> for ReviewerKey {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(expected) = state.auth.api_key.as_deref() else {
            return Err(AppError::internal("Reviewer API key is not configured"));
        };

        let provided = parts
            .headers
            .get(API_KEY_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::unauthorized("Missing API key"))?;

        if provided != expected {
            return Err(AppError::unauthorized("Invalid API key"));
        }

        Ok(Self)
    }
}
