//! Staff account endpoints. Everything here except the coach list is
//! admin-only, enforced by the router.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use domain::models::{EntityKind, Role, User};
use domain::services::activity::ActivityEntry;
use persistence::repositories::{
    ActivityLogRepository, UserInput, UserRepository, UserUpdate,
};
use serde::Deserialize;
use shared::pagination::{Page, PageParams};
use shared::password::hash_password;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::Context;
use crate::response::ApiResponse;
use crate::routes::sort_params;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub role: Option<Role>,
    /// Matches name or email.
    pub search: Option<String>,
    pub sort_field: Option<String>,
    pub sort_direction: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "A valid email address is required"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    pub role: Role,
    pub phone: Option<String>,
    pub specialty: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "A valid email address is required"))]
    pub email: String,
    /// When present the password is replaced, otherwise kept.
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: Option<String>,
    pub role: Role,
    pub phone: Option<String>,
    pub specialty: Option<String>,
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

/// `POST /api/register`
pub async fn register(
    State(state): State<AppState>,
    ctx: Context,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    payload.validate()?;

    let password_hash = hash_password(&payload.password)
        .map_err(|err| ApiError::Internal(format!("Password hashing failed: {}", err)))?;

    let input = UserInput {
        name: payload.name,
        email: payload.email,
        password_hash,
        role: payload.role,
        phone: payload.phone,
        specialty: payload.specialty,
        is_active: payload.is_active,
    };

    let user = UserRepository::new(state.pool.clone()).create(&input).await?;

    ActivityLogRepository::new(state.pool.clone()).insert_async(
        ActivityEntry::new(&ctx.request, "created", EntityKind::User, user.id)
            .describe(format!("Account {} created with role {}", user.name, user.role))
            .build(),
    );

    Ok(Json(ApiResponse::with_message(
        user,
        "Account created successfully",
    )))
}

/// `GET /api/users`
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<Page<User>>>, ApiError> {
    let params = PageParams::new(query.page, query.per_page);
    let sort = sort_params(query.sort_field, query.sort_direction);
    let (users, total) = UserRepository::new(state.pool.clone())
        .list(query.role, query.search.as_deref(), &sort, params)
        .await?;

    Ok(Json(ApiResponse::data(Page::new(users, total, params))))
}

/// `GET /api/users/coaches`
pub async fn list_coaches(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<User>>>, ApiError> {
    let coaches = UserRepository::new(state.pool.clone())
        .list_coaches()
        .await?;
    Ok(Json(ApiResponse::data(coaches)))
}

/// `GET /api/users/:id`
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    let user = UserRepository::new(state.pool.clone())
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    Ok(Json(ApiResponse::data(user)))
}

/// `PUT /api/users/:id`
pub async fn update_user(
    State(state): State<AppState>,
    ctx: Context,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    payload.validate()?;

    let password_hash = match &payload.password {
        Some(password) => Some(
            hash_password(password)
                .map_err(|err| ApiError::Internal(format!("Password hashing failed: {}", err)))?,
        ),
        None => None,
    };

    let update = UserUpdate {
        name: payload.name,
        email: payload.email,
        password_hash,
        role: payload.role,
        phone: payload.phone,
        specialty: payload.specialty,
        is_active: payload.is_active,
    };

    let user = UserRepository::new(state.pool.clone())
        .update(id, &update)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    ActivityLogRepository::new(state.pool.clone()).insert_async(
        ActivityEntry::new(&ctx.request, "updated", EntityKind::User, user.id)
            .describe(format!("Account {} updated", user.name))
            .build(),
    );

    Ok(Json(ApiResponse::with_message(
        user,
        "Account updated successfully",
    )))
}

/// `DELETE /api/users/:id`
pub async fn delete_user(
    State(state): State<AppState>,
    ctx: Context,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    if id == ctx.auth.user_id {
        return Err(ApiError::Conflict(
            "You cannot delete your own account".into(),
        ));
    }

    let repo = UserRepository::new(state.pool.clone());
    if repo.has_upcoming_reservations(id).await? {
        return Err(ApiError::Conflict(
            "Cannot delete a coach with upcoming reservations".into(),
        ));
    }

    let deleted = repo.soft_delete(id).await?;
    if !deleted {
        return Err(ApiError::NotFound("User not found".into()));
    }

    ActivityLogRepository::new(state.pool.clone()).insert_async(
        ActivityEntry::new(&ctx.request, "deleted", EntityKind::User, id).build(),
    );

    Ok(Json(ApiResponse::message("Account deleted successfully")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_rejects_short_password() {
        let payload = RegisterRequest {
            name: "Sam Coach".into(),
            email: "sam@example.com".into(),
            password: "short".into(),
            role: Role::Coach,
            phone: None,
            specialty: Some("crossfit".into()),
            is_active: true,
        };
        assert!(payload.validate().is_err());
    }

    #[test]
    fn update_allows_missing_password() {
        let payload = UpdateUserRequest {
            name: "Sam Coach".into(),
            email: "sam@example.com".into(),
            password: None,
            role: Role::Coach,
            phone: None,
            specialty: None,
            is_active: false,
        };
        assert!(payload.validate().is_ok());
    }
}
