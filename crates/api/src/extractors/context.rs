//! Request context extractor.
//!
//! Handlers that write to the activity log take a [`Context`], which
//! bundles the authenticated account with the client IP and user agent.
//! The actor is always explicit in the call chain; nothing reads it from
//! ambient state.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use domain::services::activity::RequestContext;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::auth::AuthUser;

/// The acting account plus request metadata.
#[derive(Debug, Clone)]
pub struct Context {
    pub auth: AuthUser,
    pub request: RequestContext,
}

#[async_trait]
impl FromRequestParts<AppState> for Context {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth = AuthUser::from_request_parts(parts, state).await?;

        let mut request = RequestContext::authenticated(auth.user_id, auth.role);
        if let Some(ip) = client_ip(parts) {
            request = request.with_ip(ip);
        }
        if let Some(agent) = user_agent(parts) {
            request = request.with_user_agent(agent);
        }

        Ok(Context { auth, request })
    }
}

/// Best-effort client IP: first hop of `X-Forwarded-For`, then
/// `X-Real-IP`.
fn client_ip(parts: &Parts) -> Option<String> {
    let forwarded = parts
        .headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string());
    if forwarded.is_some() {
        return forwarded;
    }

    parts
        .headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
}

fn user_agent(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(axum::http::header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
}
