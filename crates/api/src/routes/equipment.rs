//! Equipment inventory endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::NaiveDate;
use domain::models::{EntityKind, Equipment, EquipmentStatus};
use domain::services::activity::ActivityEntry;
use persistence::repositories::{
    ActivityLogRepository, EquipmentInput, EquipmentListQuery, EquipmentRepository,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::pagination::{Page, PageParams};
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
    pub status: Option<EquipmentStatus>,
    /// Matches name, category or serial number.
    pub search: Option<String>,
    pub sort_field: Option<String>,
    pub sort_direction: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct EquipmentPayload {
    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub name: String,
    pub description: Option<String>,
    #[validate(length(max = 100))]
    pub category: Option<String>,
    #[validate(length(max = 100))]
    pub serial_number: Option<String>,
    #[serde(default)]
    pub status: Option<EquipmentStatus>,
    pub purchase_date: Option<NaiveDate>,
    pub purchase_price: Option<Decimal>,
    pub last_maintenance_date: Option<NaiveDate>,
    pub next_maintenance_date: Option<NaiveDate>,
}

impl EquipmentPayload {
    fn into_input(self) -> Result<EquipmentInput, ApiError> {
        if matches!(self.purchase_price, Some(price) if price < Decimal::ZERO) {
            return Err(ApiError::validation(
                "purchase_price must not be negative",
            ));
        }

        Ok(EquipmentInput {
            name: self.name,
            description: self.description,
            category: self.category,
            serial_number: self.serial_number,
            status: self.status.unwrap_or(EquipmentStatus::Available),
            purchase_date: self.purchase_date,
            purchase_price: self.purchase_price,
            last_maintenance_date: self.last_maintenance_date,
            next_maintenance_date: self.next_maintenance_date,
        })
    }
}

/// `GET /api/equipment`
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<Page<Equipment>>>, ApiError> {
    let params = PageParams::new(query.page, query.per_page);
    let filters = EquipmentListQuery {
        status: query.status,
        search: query.search,
    };

    let sort = sort_params(query.sort_field, query.sort_direction);
    let (items, total) = EquipmentRepository::new(state.pool.clone())
        .list(&filters, &sort, params)
        .await?;

    Ok(Json(ApiResponse::data(Page::new(items, total, params))))
}

/// `GET /api/equipment/available`
pub async fn list_available(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<Equipment>>>, ApiError> {
    let items = EquipmentRepository::new(state.pool.clone())
        .list_available()
        .await?;
    Ok(Json(ApiResponse::data(items)))
}

/// `GET /api/equipment/maintenance-due`
pub async fn list_maintenance_due(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<Equipment>>>, ApiError> {
    let items = EquipmentRepository::new(state.pool.clone())
        .list_maintenance_due()
        .await?;
    Ok(Json(ApiResponse::data(items)))
}

/// `GET /api/equipment/:id`
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Equipment>>, ApiError> {
    let item = EquipmentRepository::new(state.pool.clone())
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Equipment not found".into()))?;

    Ok(Json(ApiResponse::data(item)))
}

/// `POST /api/equipment`
pub async fn create(
    State(state): State<AppState>,
    ctx: Context,
    Json(payload): Json<EquipmentPayload>,
) -> Result<Json<ApiResponse<Equipment>>, ApiError> {
    payload.validate()?;

    let item = EquipmentRepository::new(state.pool.clone())
        .create(&payload.into_input()?)
        .await?;

    ActivityLogRepository::new(state.pool.clone()).insert_async(
        ActivityEntry::new(&ctx.request, "created", EntityKind::Equipment, item.id)
            .describe(format!("Equipment {} created", item.name))
            .build(),
    );

    Ok(Json(ApiResponse::with_message(
        item,
        "Equipment created successfully",
    )))
}

/// `PUT /api/equipment/:id`
pub async fn update(
    State(state): State<AppState>,
    ctx: Context,
    Path(id): Path<i64>,
    Json(payload): Json<EquipmentPayload>,
) -> Result<Json<ApiResponse<Equipment>>, ApiError> {
    payload.validate()?;

    let item = EquipmentRepository::new(state.pool.clone())
        .update(id, &payload.into_input()?)
        .await?
        .ok_or_else(|| ApiError::NotFound("Equipment not found".into()))?;

    ActivityLogRepository::new(state.pool.clone()).insert_async(
        ActivityEntry::new(&ctx.request, "updated", EntityKind::Equipment, item.id).build(),
    );

    Ok(Json(ApiResponse::with_message(
        item,
        "Equipment updated successfully",
    )))
}

/// `DELETE /api/equipment/:id`
///
/// Refused while scheduled reservations still reference the unit.
pub async fn remove(
    State(state): State<AppState>,
    ctx: Context,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let repo = EquipmentRepository::new(state.pool.clone());

    if repo.has_upcoming_reservations(id).await? {
        return Err(ApiError::Conflict(
            "Cannot delete equipment with upcoming reservations".into(),
        ));
    }

    let deleted = repo.soft_delete(id).await?;
    if !deleted {
        return Err(ApiError::NotFound("Equipment not found".into()));
    }

    ActivityLogRepository::new(state.pool.clone()).insert_async(
        ActivityEntry::new(&ctx.request, "deleted", EntityKind::Equipment, id).build(),
    );

    Ok(Json(ApiResponse::message("Equipment deleted successfully")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> EquipmentPayload {
        EquipmentPayload {
            name: "Treadmill 3".into(),
            description: None,
            category: Some("cardio".into()),
            serial_number: None,
            status: None,
            purchase_date: None,
            purchase_price: None,
            last_maintenance_date: None,
            next_maintenance_date: None,
        }
    }

    #[test]
    fn defaults_status_to_available() {
        let p = payload();
        assert!(p.validate().is_ok());
        assert_eq!(p.into_input().unwrap().status, EquipmentStatus::Available);
    }

    #[test]
    fn rejects_negative_purchase_price() {
        let mut p = payload();
        p.purchase_price = Some(Decimal::new(-9900, 2));
        assert!(p.into_input().is_err());
    }
}
