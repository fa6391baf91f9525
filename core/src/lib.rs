//! # Cosmetic Detective — core domain
//!
//! Domain logic for the authenticity-review ticket service: the ticket
//! lifecycle state machine, the append-only event log, and the one-shot
//! result recorder.
//!
//! ## Architecture
//!
//! The crate follows the "Functional Core, Imperative Shell" pattern:
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │        Imperative Shell (server)        │  ← HTTP, Postgres, S3
//! ├─────────────────────────────────────────┤
//! │        Functional Core (this crate)     │
//! │  - Ticket lifecycle state machine       │  ← legal-transition table
//! │  - Append-only event log model          │  ← audit history
//! │  - Result recorder                      │  ← one-shot verdicts
//! └─────────────────────────────────────────┘
//! ```
//!
//! All external collaborators (row storage, blob storage, the wall clock)
//! are abstracted behind traits and injected into [`ReviewService`], so the
//! whole lifecycle runs at memory speed in tests.
//!
//! ## Example
//!
//! ```ignore
//! use detective_core::{ReviewService, NewTicket, NewImage};
//! use std::sync::Arc;
//!
//! let service = ReviewService::new(store, images, Arc::new(SystemClock));
//! let ticket = service.submit(NewTicket {
//!     brand: "Dior".into(),
//!     category: "lipstick".into(),
//!     notes: String::new(),
//!     submitter_id: None,
//!     images: vec![NewImage::new("front.jpg", bytes)],
//! }).await?;
//! ```

pub mod blob;
pub mod clock;
pub mod error;
pub mod lifecycle;
pub mod service;
pub mod store;
pub mod types;

#[cfg(any(test, feature = "mocks"))]
pub mod mocks;

// Re-export key types for convenience
pub use blob::ImageStore;
pub use clock::{Clock, SystemClock};
pub use error::{CoreError, StorageError};
pub use service::{NewImage, NewTicket, ReviewService};
pub use store::{ResultInsertOutcome, TicketFilter, TicketStore, UpdateOutcome};
pub use types::{
    EventKind, NewEvent, ReviewResult, Ticket, TicketEvent, TicketId, TicketStatus, Verdict,
};

/// Result type alias for domain operations.
pub type Result<T> = std::result::Result<T, CoreError>;
