//! Member management endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::NaiveDate;
use domain::models::{
    EntityKind, Member, MemberStats, MemberStatus, Payment, ReservationDetails, Subscription,
};
use domain::services::activity::ActivityEntry;
use persistence::repositories::{
    ActivityLogRepository, MemberInput, MemberListQuery, MemberRepository, PaymentRepository,
    ReservationRepository, SubscriptionRepository,
};
use serde::{Deserialize, Serialize};
use shared::pagination::{Page, PageParams};
use shared::validation::validate_phone;
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
    pub status: Option<MemberStatus>,
    pub search: Option<String>,
    pub sort_field: Option<String>,
    pub sort_direction: Option<String>,
}

/// Member profile with its related records, for the detail view.
#[derive(Debug, Serialize)]
pub struct MemberDetails {
    #[serde(flatten)]
    pub member: Member,
    pub subscriptions: Vec<Subscription>,
    pub reservations: Vec<ReservationDetails>,
    pub payments: Vec<Payment>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct MemberPayload {
    #[validate(length(min = 1, max = 100, message = "First name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100, message = "Last name is required"))]
    pub last_name: String,
    #[validate(email(message = "A valid email address is required"))]
    pub email: String,
    #[validate(custom(function = "validate_phone"))]
    pub phone: String,
    pub birth_date: Option<NaiveDate>,
    #[validate(length(max = 255))]
    pub address: Option<String>,
    #[validate(length(max = 255))]
    pub emergency_contact: Option<String>,
    pub photo: Option<String>,
    #[serde(default)]
    pub status: Option<MemberStatus>,
    pub notes: Option<String>,
}

impl MemberPayload {
    fn into_input(self) -> MemberInput {
        MemberInput {
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            phone: self.phone,
            birth_date: self.birth_date,
            address: self.address,
            emergency_contact: self.emergency_contact,
            photo: self.photo,
            status: self.status.unwrap_or(MemberStatus::Pending),
            notes: self.notes,
        }
    }
}

/// `GET /api/members`
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<Page<Member>>>, ApiError> {
    let params = PageParams::new(query.page, query.per_page);
    let filters = MemberListQuery {
        status: query.status,
        search: query.search,
    };

    let sort = sort_params(query.sort_field, query.sort_direction);
    let (members, total) = MemberRepository::new(state.pool.clone())
        .list(&filters, &sort, params)
        .await?;

    Ok(Json(ApiResponse::data(Page::new(members, total, params))))
}

/// `GET /api/members/active`
pub async fn list_active(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<Member>>>, ApiError> {
    let members = MemberRepository::new(state.pool.clone())
        .list_active()
        .await?;
    Ok(Json(ApiResponse::data(members)))
}

/// `GET /api/members/stats`
pub async fn stats(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<MemberStats>>, ApiError> {
    let stats = MemberRepository::new(state.pool.clone()).stats().await?;
    Ok(Json(ApiResponse::data(stats)))
}

/// `GET /api/members/:id`
///
/// Returns the member together with their subscriptions, reservations
/// and payment history.
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<MemberDetails>>, ApiError> {
    let member = MemberRepository::new(state.pool.clone())
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Member not found".into()))?;

    let subscriptions = SubscriptionRepository::new(state.pool.clone())
        .list_for_member(id)
        .await?;
    let reservations = ReservationRepository::new(state.pool.clone())
        .list_for_member(id)
        .await?;
    let payments = PaymentRepository::new(state.pool.clone())
        .list_for_member(id)
        .await?;

    Ok(Json(ApiResponse::data(MemberDetails {
        member,
        subscriptions,
        reservations,
        payments,
    })))
}

/// `POST /api/members`
pub async fn create(
    State(state): State<AppState>,
    ctx: Context,
    Json(payload): Json<MemberPayload>,
) -> Result<Json<ApiResponse<Member>>, ApiError> {
    payload.validate()?;

    let member = MemberRepository::new(state.pool.clone())
        .create(&payload.into_input())
        .await?;

    ActivityLogRepository::new(state.pool.clone()).insert_async(
        ActivityEntry::new(&ctx.request, "created", EntityKind::Member, member.id)
            .describe(format!("Member {} created", member.full_name()))
            .build(),
    );

    Ok(Json(ApiResponse::with_message(
        member,
        "Member created successfully",
    )))
}

/// `PUT /api/members/:id`
pub async fn update(
    State(state): State<AppState>,
    ctx: Context,
    Path(id): Path<i64>,
    Json(payload): Json<MemberPayload>,
) -> Result<Json<ApiResponse<Member>>, ApiError> {
    payload.validate()?;

    let member = MemberRepository::new(state.pool.clone())
        .update(id, &payload.into_input())
        .await?
        .ok_or_else(|| ApiError::NotFound("Member not found".into()))?;

    ActivityLogRepository::new(state.pool.clone()).insert_async(
        ActivityEntry::new(&ctx.request, "updated", EntityKind::Member, member.id)
            .describe(format!("Member {} updated", member.full_name()))
            .build(),
    );

    Ok(Json(ApiResponse::with_message(
        member,
        "Member updated successfully",
    )))
}

/// `DELETE /api/members/:id`
pub async fn remove(
    State(state): State<AppState>,
    ctx: Context,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let deleted = MemberRepository::new(state.pool.clone())
        .soft_delete(id)
        .await?;
    if !deleted {
        return Err(ApiError::NotFound("Member not found".into()));
    }

    ActivityLogRepository::new(state.pool.clone()).insert_async(
        ActivityEntry::new(&ctx.request, "deleted", EntityKind::Member, id).build(),
    );

    Ok(Json(ApiResponse::message("Member deleted successfully")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> MemberPayload {
        MemberPayload {
            first_name: "Alice".into(),
            last_name: "Martin".into(),
            email: "alice.martin@example.com".into(),
            phone: "+1 555 123 4567".into(),
            birth_date: None,
            address: None,
            emergency_contact: None,
            photo: None,
            status: None,
            notes: None,
        }
    }

    #[test]
    fn valid_payload_passes() {
        assert!(payload().validate().is_ok());
    }

    #[test]
    fn rejects_bad_phone() {
        let mut p = payload();
        p.phone = "555".into();
        assert!(p.validate().is_err());
    }

    #[test]
    fn defaults_status_to_pending() {
        let input = payload().into_input();
        assert_eq!(input.status, MemberStatus::Pending);
    }
}
