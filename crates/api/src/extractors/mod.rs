//! Axum extractors.

pub mod auth;
pub mod context;

pub use auth::AuthUser;
pub use context::Context;
