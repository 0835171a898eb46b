//! In-app notification endpoints.
//!
//! Authenticated staff read their own feed by default; passing
//! `member_id` lets them pull up a member's feed instead. Marking rows
//! read always targets the caller's own feed.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use domain::models::{EntityKind, Notification};
use persistence::repositories::NotificationRepository;
use serde::{Deserialize, Serialize};
use shared::pagination::{Page, PageParams};

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::Context;
use crate::response::ApiResponse;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    /// When set, lists the member's notifications instead of the
    /// caller's.
    pub member_id: Option<i64>,
    pub read: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct NotificationList {
    #[serde(flatten)]
    pub page: Page<Notification>,
    pub unread_count: i64,
}

/// `GET /api/notifications`
pub async fn list(
    State(state): State<AppState>,
    ctx: Context,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<NotificationList>>, ApiError> {
    let params = PageParams::new(query.page, query.per_page);
    let (subject_kind, subject_id) = match query.member_id {
        Some(member_id) => (EntityKind::Member, member_id),
        None => (EntityKind::User, ctx.auth.user_id),
    };

    let (notifications, total, unread) = NotificationRepository::new(state.pool.clone())
        .list_for_subject(subject_kind, subject_id, query.read, params)
        .await?;

    Ok(Json(ApiResponse::data(NotificationList {
        page: Page::new(notifications, total, params),
        unread_count: unread,
    })))
}

/// `PUT /api/notifications/:id/read`
///
/// Idempotent: re-reading an already read notification keeps the
/// original timestamp.
pub async fn mark_read(
    State(state): State<AppState>,
    ctx: Context,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Notification>>, ApiError> {
    let notification = NotificationRepository::new(state.pool.clone())
        .mark_read(EntityKind::User, ctx.auth.user_id, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Notification not found".into()))?;

    Ok(Json(ApiResponse::data(notification)))
}

/// `PUT /api/notifications/read-all`
pub async fn mark_all_read(
    State(state): State<AppState>,
    ctx: Context,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let updated = NotificationRepository::new(state.pool.clone())
        .mark_all_read(EntityKind::User, ctx.auth.user_id)
        .await?;

    Ok(Json(ApiResponse::message(format!(
        "{} notifications marked as read",
        updated
    ))))
}
