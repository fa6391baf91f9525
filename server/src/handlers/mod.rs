//! HTTP handlers for the review API.

pub mod events;
pub mod health;
pub mod results;
pub mod tickets;
