//! Subscription management endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::NaiveDate;
use domain::models::{EntityKind, Subscription, SubscriptionStatus, SubscriptionType};
use domain::services::activity::ActivityEntry;
use persistence::repositories::{
    ActivityLogRepository, MemberRepository, SubscriptionInput, SubscriptionRepository,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::pagination::{Page, PageParams};

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::Context;
use crate::response::ApiResponse;
use crate::routes::sort_params;

/// Default lookahead for the expiring list, in days.
const DEFAULT_EXPIRY_WINDOW_DAYS: i32 = 30;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub status: Option<SubscriptionStatus>,
    pub member_id: Option<i64>,
    pub sort_field: Option<String>,
    pub sort_direction: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ExpiringQuery {
    pub days: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct SubscriptionPayload {
    pub member_id: i64,
    pub name: String,
    pub subscription_type: SubscriptionType,
    pub start_date: NaiveDate,
    /// Derived from the subscription type when absent.
    pub end_date: Option<NaiveDate>,
    pub price: Decimal,
    #[serde(default)]
    pub auto_renewal: bool,
    #[serde(default)]
    pub status: Option<SubscriptionStatus>,
}

impl SubscriptionPayload {
    fn into_input(self) -> Result<SubscriptionInput, ApiError> {
        let end_date = match self.end_date {
            Some(end) if end <= self.start_date => {
                return Err(ApiError::validation(
                    "end_date must be after start_date",
                ));
            }
            Some(end) => end,
            None => self.subscription_type.end_date_from(self.start_date),
        };

        if self.price < Decimal::ZERO {
            return Err(ApiError::validation("price must not be negative"));
        }
        if self.name.trim().is_empty() {
            return Err(ApiError::validation("name must not be empty"));
        }

        Ok(SubscriptionInput {
            member_id: self.member_id,
            name: self.name,
            subscription_type: self.subscription_type,
            start_date: self.start_date,
            end_date,
            price: self.price,
            auto_renewal: self.auto_renewal,
            status: self.status.unwrap_or(SubscriptionStatus::Active),
        })
    }
}

/// `GET /api/subscriptions`
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<Page<Subscription>>>, ApiError> {
    let params = PageParams::new(query.page, query.per_page);
    let sort = sort_params(query.sort_field, query.sort_direction);
    let (subscriptions, total) = SubscriptionRepository::new(state.pool.clone())
        .list(query.status, query.member_id, &sort, params)
        .await?;

    Ok(Json(ApiResponse::data(Page::new(
        subscriptions,
        total,
        params,
    ))))
}

/// `GET /api/subscriptions/expiring`
pub async fn expiring(
    State(state): State<AppState>,
    Query(query): Query<ExpiringQuery>,
) -> Result<Json<ApiResponse<Vec<Subscription>>>, ApiError> {
    let days = query.days.unwrap_or(DEFAULT_EXPIRY_WINDOW_DAYS).max(0);
    let subscriptions = SubscriptionRepository::new(state.pool.clone())
        .list_expiring(days)
        .await?;

    Ok(Json(ApiResponse::data(subscriptions)))
}

/// `GET /api/subscriptions/:id`
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Subscription>>, ApiError> {
    let subscription = SubscriptionRepository::new(state.pool.clone())
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Subscription not found".into()))?;

    Ok(Json(ApiResponse::data(subscription)))
}

/// `GET /api/members/:id/subscriptions`
pub async fn list_for_member(
    State(state): State<AppState>,
    Path(member_id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<Subscription>>>, ApiError> {
    let members = MemberRepository::new(state.pool.clone());
    if members.find_by_id(member_id).await?.is_none() {
        return Err(ApiError::NotFound("Member not found".into()));
    }

    let subscriptions = SubscriptionRepository::new(state.pool.clone())
        .list_for_member(member_id)
        .await?;

    Ok(Json(ApiResponse::data(subscriptions)))
}

/// `POST /api/subscriptions`
pub async fn create(
    State(state): State<AppState>,
    ctx: Context,
    Json(payload): Json<SubscriptionPayload>,
) -> Result<Json<ApiResponse<Subscription>>, ApiError> {
    let input = payload.into_input()?;

    let members = MemberRepository::new(state.pool.clone());
    if members.find_by_id(input.member_id).await?.is_none() {
        return Err(ApiError::validation(
            "The selected member does not exist",
        ));
    }

    let subscription = SubscriptionRepository::new(state.pool.clone())
        .create(&input)
        .await?;

    ActivityLogRepository::new(state.pool.clone()).insert_async(
        ActivityEntry::new(
            &ctx.request,
            "created",
            EntityKind::Subscription,
            subscription.id,
        )
        .describe(format!(
            "{} subscription for member {}",
            subscription.subscription_type, subscription.member_id
        ))
        .build(),
    );

    Ok(Json(ApiResponse::with_message(
        subscription,
        "Subscription created successfully",
    )))
}

/// `PUT /api/subscriptions/:id`
pub async fn update(
    State(state): State<AppState>,
    ctx: Context,
    Path(id): Path<i64>,
    Json(payload): Json<SubscriptionPayload>,
) -> Result<Json<ApiResponse<Subscription>>, ApiError> {
    let input = payload.into_input()?;

    let subscription = SubscriptionRepository::new(state.pool.clone())
        .update(id, &input)
        .await?
        .ok_or_else(|| ApiError::NotFound("Subscription not found".into()))?;

    ActivityLogRepository::new(state.pool.clone()).insert_async(
        ActivityEntry::new(
            &ctx.request,
            "updated",
            EntityKind::Subscription,
            subscription.id,
        )
        .build(),
    );

    Ok(Json(ApiResponse::with_message(
        subscription,
        "Subscription updated successfully",
    )))
}

/// `DELETE /api/subscriptions/:id`
pub async fn remove(
    State(state): State<AppState>,
    ctx: Context,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let deleted = SubscriptionRepository::new(state.pool.clone())
        .soft_delete(id)
        .await?;
    if !deleted {
        return Err(ApiError::NotFound("Subscription not found".into()));
    }

    ActivityLogRepository::new(state.pool.clone()).insert_async(
        ActivityEntry::new(&ctx.request, "deleted", EntityKind::Subscription, id).build(),
    );

    Ok(Json(ApiResponse::message(
        "Subscription deleted successfully",
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> SubscriptionPayload {
        SubscriptionPayload {
            member_id: 1,
            name: "Basic monthly".to_string(),
            subscription_type: SubscriptionType::Monthly,
            start_date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            end_date: None,
            price: Decimal::new(4990, 2),
            auto_renewal: false,
            status: None,
        }
    }

    #[test]
    fn derives_end_date_from_type() {
        let input = payload().into_input().unwrap();
        assert_eq!(input.end_date, NaiveDate::from_ymd_opt(2025, 4, 1).unwrap());
        assert_eq!(input.status, SubscriptionStatus::Active);
    }

    #[test]
    fn rejects_inverted_date_range() {
        let mut p = payload();
        p.end_date = NaiveDate::from_ymd_opt(2025, 2, 1);
        assert!(p.into_input().is_err());
    }

    #[test]
    fn rejects_negative_price() {
        let mut p = payload();
        p.price = Decimal::new(-100, 2);
        assert!(p.into_input().is_err());
    }
}
