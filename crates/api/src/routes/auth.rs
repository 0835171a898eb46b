//! Session endpoints: login, logout and the current account.

use axum::{extract::State, Json};
use domain::models::{EntityKind, User};
use domain::services::activity::{ActivityEntry, RequestContext};
use persistence::repositories::{ActivityLogRepository, UserRepository};
use serde::{Deserialize, Serialize};
use shared::password::verify_password;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::Context;
use crate::response::ApiResponse;

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "A valid email address is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

/// `POST /api/login`
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, ApiError> {
    payload.validate()?;

    let users = UserRepository::new(state.pool.clone());
    let user = users
        .find_by_email(&payload.email)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid credentials".into()))?;

    if !user.is_active {
        return Err(ApiError::Unauthorized("This account is disabled".into()));
    }

    let valid = verify_password(&payload.password, &user.password_hash)
        .map_err(|err| ApiError::Internal(format!("Password verification failed: {}", err)))?;
    if !valid {
        tracing::warn!(email = %payload.email, "failed login attempt");
        return Err(ApiError::Unauthorized("Invalid credentials".into()));
    }

    let (token, _jti) = state.jwt.issue_token(user.id, user.role.as_str())?;

    let ctx = RequestContext::authenticated(user.id, user.role);
    ActivityLogRepository::new(state.pool.clone()).insert_async(
        ActivityEntry::new(&ctx, "login", EntityKind::User, user.id)
            .describe(format!("{} logged in", user.name))
            .build(),
    );

    Ok(Json(ApiResponse::data(LoginResponse { token, user })))
}

/// `POST /api/logout`
///
/// Tokens are stateless; the client discards its copy. The logout is
/// still recorded in the activity log.
pub async fn logout(
    State(state): State<AppState>,
    ctx: Context,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    ActivityLogRepository::new(state.pool.clone()).insert_async(
        ActivityEntry::new(&ctx.request, "logout", EntityKind::User, ctx.auth.user_id).build(),
    );

    Ok(Json(ApiResponse::message("Logged out successfully")))
}

/// `GET /api/me`
pub async fn me(
    State(state): State<AppState>,
    ctx: Context,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    let users = UserRepository::new(state.pool.clone());
    let user = users
        .find_by_id(ctx.auth.user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Account no longer exists".into()))?;

    Ok(Json(ApiResponse::data(user)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_request_requires_valid_email() {
        let payload = LoginRequest {
            email: "not-an-email".into(),
            password: "secret".into(),
        };
        assert!(payload.validate().is_err());
    }

    #[test]
    fn login_request_requires_password() {
        let payload = LoginRequest {
            email: "manager@example.com".into(),
            password: String::new(),
        };
        assert!(payload.validate().is_err());
    }
}
