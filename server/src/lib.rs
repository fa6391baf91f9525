//! HTTP server for the cosmetic authenticity review service.
//!
//! This crate is the imperative shell around [`detective_core`]: it parses
//! requests, maps them onto state-machine operations, and renders domain
//! errors as HTTP responses.
//!
//! # Request Flow
//!
//! 1. **HTTP request** arrives at an Axum handler
//! 2. **Extract data** from the request (JSON, multipart, headers)
//! 3. **Call** the corresponding [`detective_core::ReviewService`] operation
//! 4. **Map result** to a JSON response (or an error status via `AppError`)
//!
//! Persistence is Postgres (sqlx) and blob storage is an S3-compatible
//! endpoint (MinIO in development); both are injected into the service as
//! trait objects, so the HTTP tests in `tests/` run against in-memory
//! doubles.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;
pub mod stores;

// Re-export key types for convenience
pub use config::Config;
pub use error::AppError;
pub use routes::build_router;
pub use state::AppState;
