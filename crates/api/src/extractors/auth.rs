//! Authenticated user extractor.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::auth::{bearer_token, AuthUser as AuthUserData};

pub use crate::middleware::auth::AuthUser;

#[async_trait]
impl FromRequestParts<AppState> for AuthUserData {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // The auth middleware usually got here first.
        if let Some(auth) = parts.extensions.get::<AuthUserData>() {
            return Ok(auth.clone());
        }

        let token = bearer_token(&parts.headers)?;
        AuthUserData::validate(&state.jwt, token)
    }
}
