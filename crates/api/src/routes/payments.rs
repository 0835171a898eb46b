//! Payment and invoicing endpoints.
//!
//! Invoice numbers are allocated by the repository inside the insert
//! transaction and never change afterwards.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{Datelike, NaiveDate, Utc};
use domain::models::{
    EntityKind, FinancialStats, Payment, PaymentInvoice, PaymentMethod, PaymentStatus,
};
use domain::services::activity::ActivityEntry;
use persistence::repositories::{
    ActivityLogRepository, MemberRepository, PaymentInput, PaymentListQuery, PaymentRepository,
    PaymentUpdate, SubscriptionRepository,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::pagination::{Page, PageParams};

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::Context;
use crate::response::ApiResponse;
use crate::routes::sort_params;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub status: Option<PaymentStatus>,
    pub member_id: Option<i64>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub sort_field: Option<String>,
    pub sort_direction: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    pub year: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct PaymentPayload {
    pub member_id: i64,
    pub subscription_id: Option<i64>,
    pub amount: Decimal,
    pub payment_method: PaymentMethod,
    pub payment_date: NaiveDate,
    #[serde(default)]
    pub status: Option<PaymentStatus>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PaymentUpdatePayload {
    pub amount: Decimal,
    pub payment_method: PaymentMethod,
    pub payment_date: NaiveDate,
    pub status: PaymentStatus,
    pub notes: Option<String>,
}

fn check_amount(amount: Decimal) -> Result<(), ApiError> {
    if amount <= Decimal::ZERO {
        return Err(ApiError::validation("amount must be positive"));
    }
    Ok(())
}

/// `GET /api/payments`
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<Page<Payment>>>, ApiError> {
    let params = PageParams::new(query.page, query.per_page);
    let filters = PaymentListQuery {
        status: query.status,
        member_id: query.member_id,
        from: query.from,
        to: query.to,
    };

    let sort = sort_params(query.sort_field, query.sort_direction);
    let (payments, total) = PaymentRepository::new(state.pool.clone())
        .list(&filters, &sort, params)
        .await?;

    Ok(Json(ApiResponse::data(Page::new(payments, total, params))))
}

/// `GET /api/payments/financial-stats`
///
/// Defaults to the current year.
pub async fn financial_stats(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<ApiResponse<FinancialStats>>, ApiError> {
    let year = query.year.unwrap_or_else(|| Utc::now().year());
    let stats = PaymentRepository::new(state.pool.clone())
        .financial_stats(year)
        .await?;
    Ok(Json(ApiResponse::data(stats)))
}

/// `GET /api/payments/:id`
///
/// Returns the payment together with the member and plan it settles.
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<PaymentInvoice>>, ApiError> {
    let payment = PaymentRepository::new(state.pool.clone())
        .find_invoice(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Payment not found".into()))?;

    Ok(Json(ApiResponse::data(payment)))
}

/// `GET /api/payments/:id/invoice`
pub async fn invoice(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<PaymentInvoice>>, ApiError> {
    let invoice = PaymentRepository::new(state.pool.clone())
        .find_invoice(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Payment not found".into()))?;

    Ok(Json(ApiResponse::data(invoice)))
}

/// `POST /api/payments`
pub async fn create(
    State(state): State<AppState>,
    ctx: Context,
    Json(payload): Json<PaymentPayload>,
) -> Result<Json<ApiResponse<Payment>>, ApiError> {
    check_amount(payload.amount)?;

    let members = MemberRepository::new(state.pool.clone());
    if members.find_by_id(payload.member_id).await?.is_none() {
        return Err(ApiError::validation(
            "The selected member does not exist",
        ));
    }

    if let Some(subscription_id) = payload.subscription_id {
        let subscription = SubscriptionRepository::new(state.pool.clone())
            .find_by_id(subscription_id)
            .await?
            .ok_or_else(|| {
                ApiError::validation("The selected subscription does not exist")
            })?;
        if subscription.member_id != payload.member_id {
            return Err(ApiError::validation(
                "The subscription does not belong to the selected member",
            ));
        }
    }

    let input = PaymentInput {
        member_id: payload.member_id,
        subscription_id: payload.subscription_id,
        amount: payload.amount,
        payment_method: payload.payment_method,
        payment_date: payload.payment_date,
        status: payload.status.unwrap_or(PaymentStatus::Paid),
        notes: payload.notes,
    };

    let payment = PaymentRepository::new(state.pool.clone())
        .create(&input)
        .await?;

    ActivityLogRepository::new(state.pool.clone()).insert_async(
        ActivityEntry::new(&ctx.request, "created", EntityKind::Payment, payment.id)
            .describe(format!(
                "Payment {} recorded for {}",
                payment.invoice_number, payment.amount
            ))
            .build(),
    );

    Ok(Json(ApiResponse::with_message(
        payment,
        "Payment recorded successfully",
    )))
}

/// `PUT /api/payments/:id`
pub async fn update(
    State(state): State<AppState>,
    ctx: Context,
    Path(id): Path<i64>,
    Json(payload): Json<PaymentUpdatePayload>,
) -> Result<Json<ApiResponse<Payment>>, ApiError> {
    check_amount(payload.amount)?;

    let update = PaymentUpdate {
        amount: payload.amount,
        payment_method: payload.payment_method,
        payment_date: payload.payment_date,
        status: payload.status,
        notes: payload.notes,
    };

    let payment = PaymentRepository::new(state.pool.clone())
        .update(id, &update)
        .await?
        .ok_or_else(|| ApiError::NotFound("Payment not found".into()))?;

    ActivityLogRepository::new(state.pool.clone()).insert_async(
        ActivityEntry::new(&ctx.request, "updated", EntityKind::Payment, payment.id)
            .describe(format!("Payment {} updated", payment.invoice_number))
            .build(),
    );

    Ok(Json(ApiResponse::with_message(
        payment,
        "Payment updated successfully",
    )))
}

/// `DELETE /api/payments/:id`
pub async fn remove(
    State(state): State<AppState>,
    ctx: Context,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let deleted = PaymentRepository::new(state.pool.clone())
        .soft_delete(id)
        .await?;
    if !deleted {
        return Err(ApiError::NotFound("Payment not found".into()));
    }

    ActivityLogRepository::new(state.pool.clone()).insert_async(
        ActivityEntry::new(&ctx.request, "deleted", EntityKind::Payment, id).build(),
    );

    Ok(Json(ApiResponse::message("Payment deleted successfully")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_positive_amount() {
        assert!(check_amount(Decimal::ZERO).is_err());
        assert!(check_amount(Decimal::new(-500, 2)).is_err());
    }

    #[test]
    fn accepts_positive_amount() {
        assert!(check_amount(Decimal::new(4990, 2)).is_ok());
    }
}
