//! Domain types and logic for the Gym Manager backend.
//!
//! This crate is independent of the HTTP layer: it defines the entity
//! models and status enums, the reservation availability checker, invoice
//! numbering, and the activity/notification building blocks.

pub mod models;
pub mod services;
