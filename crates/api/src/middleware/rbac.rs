//! Role-based access control middleware.

use axum::{
    body::Body,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::ApiError;
use crate::middleware::auth::AuthUser;

/// Middleware that requires the authenticated account to be an admin.
///
/// Must be layered inside `require_auth` so `AuthUser` is already in the
/// request extensions.
pub async fn require_admin(req: Request<Body>, next: Next) -> Response {
    match req.extensions().get::<AuthUser>() {
        Some(auth) if auth.role.is_admin() => next.run(req).await,
        Some(_) => ApiError::Forbidden("Administrator access required".to_string()).into_response(),
        None => ApiError::Unauthorized("Authentication required".to_string()).into_response(),
    }
}

/// Middleware that requires an admin or manager account. Coaches are
/// turned away.
///
/// Same layering rule as [`require_admin`].
pub async fn require_staff(req: Request<Body>, next: Next) -> Response {
    match req.extensions().get::<AuthUser>() {
        Some(auth) if auth.role.is_staff() => next.run(req).await,
        Some(_) => ApiError::Forbidden("Manager access required".to_string()).into_response(),
        None => ApiError::Unauthorized("Authentication required".to_string()).into_response(),
    }
}
