//! HTTP route handlers.

use persistence::repositories::SortParams;

pub mod auth;
pub mod dashboard;
pub mod equipment;
pub mod health;
pub mod members;
pub mod notifications;
pub mod payments;
pub mod reservations;
pub mod services;
pub mod subscriptions;
pub mod users;

/// Builds repository sort parameters from the `sort_field` and
/// `sort_direction` query params. Unknown directions fall back to
/// ascending; unknown fields are rejected by the repository whitelist.
pub(crate) fn sort_params(field: Option<String>, direction: Option<String>) -> SortParams {
    SortParams {
        field,
        direction: direction
            .as_deref()
            .and_then(|d| d.parse().ok())
            .unwrap_or_default(),
    }
}
