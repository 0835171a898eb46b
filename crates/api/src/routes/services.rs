//! Service catalog endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use domain::models::{EntityKind, Service};
use domain::services::activity::ActivityEntry;
use persistence::repositories::{ActivityLogRepository, ServiceInput, ServiceRepository};
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
    /// Matches name or description.
    pub search: Option<String>,
    pub sort_field: Option<String>,
    pub sort_direction: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ServicePayload {
    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub name: String,
    pub description: Option<String>,
    #[validate(range(min = 1, max = 480, message = "Duration must be between 1 and 480 minutes"))]
    pub duration_minutes: i32,
    pub price: Decimal,
    #[validate(range(min = 1, message = "Capacity must be at least 1"))]
    pub max_capacity: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

impl ServicePayload {
    fn into_input(self) -> Result<ServiceInput, ApiError> {
        if self.price < Decimal::ZERO {
            return Err(ApiError::validation("price must not be negative"));
        }
        Ok(ServiceInput {
            name: self.name,
            description: self.description,
            duration_minutes: self.duration_minutes,
            price: self.price,
            max_capacity: self.max_capacity,
            is_active: self.is_active,
        })
    }
}

/// `GET /api/services`
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<Page<Service>>>, ApiError> {
    let params = PageParams::new(query.page, query.per_page);
    let sort = sort_params(query.sort_field, query.sort_direction);
    let (services, total) = ServiceRepository::new(state.pool.clone())
        .list(query.search.as_deref(), &sort, params)
        .await?;

    Ok(Json(ApiResponse::data(Page::new(services, total, params))))
}

/// `GET /api/services/active`
pub async fn list_active(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<Service>>>, ApiError> {
    let services = ServiceRepository::new(state.pool.clone())
        .list_active()
        .await?;
    Ok(Json(ApiResponse::data(services)))
}

/// `GET /api/services/:id`
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Service>>, ApiError> {
    let service = ServiceRepository::new(state.pool.clone())
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Service not found".into()))?;

    Ok(Json(ApiResponse::data(service)))
}

/// `POST /api/services`
pub async fn create(
    State(state): State<AppState>,
    ctx: Context,
    Json(payload): Json<ServicePayload>,
) -> Result<Json<ApiResponse<Service>>, ApiError> {
    payload.validate()?;

    let service = ServiceRepository::new(state.pool.clone())
        .create(&payload.into_input()?)
        .await?;

    ActivityLogRepository::new(state.pool.clone()).insert_async(
        ActivityEntry::new(&ctx.request, "created", EntityKind::Service, service.id)
            .describe(format!("Service {} created", service.name))
            .build(),
    );

    Ok(Json(ApiResponse::with_message(
        service,
        "Service created successfully",
    )))
}

/// `PUT /api/services/:id`
pub async fn update(
    State(state): State<AppState>,
    ctx: Context,
    Path(id): Path<i64>,
    Json(payload): Json<ServicePayload>,
) -> Result<Json<ApiResponse<Service>>, ApiError> {
    payload.validate()?;

    let service = ServiceRepository::new(state.pool.clone())
        .update(id, &payload.into_input()?)
        .await?
        .ok_or_else(|| ApiError::NotFound("Service not found".into()))?;

    ActivityLogRepository::new(state.pool.clone()).insert_async(
        ActivityEntry::new(&ctx.request, "updated", EntityKind::Service, service.id).build(),
    );

    Ok(Json(ApiResponse::with_message(
        service,
        "Service updated successfully",
    )))
}

/// `DELETE /api/services/:id`
///
/// Refused while scheduled reservations still reference the service.
pub async fn remove(
    State(state): State<AppState>,
    ctx: Context,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let repo = ServiceRepository::new(state.pool.clone());

    if repo.has_upcoming_reservations(id).await? {
        return Err(ApiError::Conflict(
            "Cannot delete a service with upcoming reservations".into(),
        ));
    }

    let deleted = repo.soft_delete(id).await?;
    if !deleted {
        return Err(ApiError::NotFound("Service not found".into()));
    }

    ActivityLogRepository::new(state.pool.clone()).insert_async(
        ActivityEntry::new(&ctx.request, "deleted", EntityKind::Service, id).build(),
    );

    Ok(Json(ApiResponse::message("Service deleted successfully")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> ServicePayload {
        ServicePayload {
            name: "Yoga".into(),
            description: None,
            duration_minutes: 60,
            price: Decimal::new(2500, 2),
            max_capacity: 12,
            is_active: true,
        }
    }

    #[test]
    fn valid_payload_passes() {
        assert!(payload().validate().is_ok());
    }

    #[test]
    fn rejects_zero_duration() {
        let mut p = payload();
        p.duration_minutes = 0;
        assert!(p.validate().is_err());
    }

    #[test]
    fn rejects_negative_price() {
        let mut p = payload();
        p.price = Decimal::new(-1, 0);
        assert!(p.into_input().is_err());
    }
}
