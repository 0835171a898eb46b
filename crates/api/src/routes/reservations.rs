//! Reservation endpoints.
//!
//! Booking conflicts are detected inside the repository transaction, so
//! two racing requests cannot both claim the same coach or equipment
//! window. Handlers here only shape the request and the response.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use domain::models::{
    EntityKind, Reservation, ReservationDetails, ReservationStats, ReservationStatus, Role,
};
use domain::services::activity::ActivityEntry;
use persistence::repositories::{
    ActivityLogRepository, NotificationInput, NotificationRepository, ReservationInput,
    ReservationListQuery, ReservationRepository,
};
use serde::Deserialize;
use shared::pagination::{Page, PageParams};
use shared::validation::validate_time_window;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::Context;
use crate::response::ApiResponse;

/// Default number of rows for the upcoming list.
const DEFAULT_UPCOMING_LIMIT: i64 = 10;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub status: Option<ReservationStatus>,
    pub coach_id: Option<i64>,
    pub member_id: Option<i64>,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct CalendarQuery {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct UpcomingQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ReservationPayload {
    pub member_id: i64,
    pub coach_id: Option<i64>,
    pub service_id: i64,
    #[serde(default)]
    pub equipment_ids: Vec<i64>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusPayload {
    pub status: ReservationStatus,
}

impl ReservationPayload {
    fn into_input(self) -> Result<ReservationInput, ApiError> {
        validate_time_window(self.start_time, self.end_time)
            .map_err(|_| ApiError::validation("end_time must be after start_time"))?;

        Ok(ReservationInput {
            member_id: self.member_id,
            coach_id: self.coach_id,
            service_id: self.service_id,
            equipment_ids: self.equipment_ids,
            start_time: self.start_time,
            end_time: self.end_time,
            notes: self.notes,
        })
    }
}

/// `GET /api/reservations`
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<Page<ReservationDetails>>>, ApiError> {
    let params = PageParams::new(query.page, query.per_page);
    let filters = ReservationListQuery {
        status: query.status,
        coach_id: query.coach_id,
        member_id: query.member_id,
        date: query.date,
    };

    let (reservations, total) = ReservationRepository::new(state.pool.clone())
        .list(&filters, params)
        .await?;

    Ok(Json(ApiResponse::data(Page::new(
        reservations,
        total,
        params,
    ))))
}

/// `GET /api/reservations/calendar-events`
pub async fn calendar_events(
    State(state): State<AppState>,
    Query(query): Query<CalendarQuery>,
) -> Result<Json<ApiResponse<Vec<ReservationDetails>>>, ApiError> {
    if query.start >= query.end {
        return Err(ApiError::validation("end must be after start"));
    }

    let events = ReservationRepository::new(state.pool.clone())
        .calendar_events(query.start, query.end)
        .await?;

    Ok(Json(ApiResponse::data(events)))
}

/// `GET /api/reservations/upcoming`
///
/// Coaches only see their own sessions.
pub async fn upcoming(
    State(state): State<AppState>,
    ctx: Context,
    Query(query): Query<UpcomingQuery>,
) -> Result<Json<ApiResponse<Vec<ReservationDetails>>>, ApiError> {
    let coach_id = match ctx.auth.role {
        Role::Coach => Some(ctx.auth.user_id),
        _ => None,
    };
    let limit = query.limit.unwrap_or(DEFAULT_UPCOMING_LIMIT).clamp(1, 100);

    let reservations = ReservationRepository::new(state.pool.clone())
        .list_upcoming(coach_id, None, limit)
        .await?;

    Ok(Json(ApiResponse::data(reservations)))
}

/// `GET /api/reservations/stats`
pub async fn stats(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<ReservationStats>>, ApiError> {
    let stats = ReservationRepository::new(state.pool.clone())
        .stats()
        .await?;
    Ok(Json(ApiResponse::data(stats)))
}

/// `GET /api/reservations/:id`
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<ReservationDetails>>, ApiError> {
    let reservation = ReservationRepository::new(state.pool.clone())
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Reservation not found".into()))?;

    Ok(Json(ApiResponse::data(reservation)))
}

/// `POST /api/reservations`
pub async fn create(
    State(state): State<AppState>,
    ctx: Context,
    Json(payload): Json<ReservationPayload>,
) -> Result<Json<ApiResponse<Reservation>>, ApiError> {
    let input = payload.into_input()?;

    let reservation = ReservationRepository::new(state.pool.clone())
        .create(&input)
        .await?;

    ActivityLogRepository::new(state.pool.clone()).insert_async(
        ActivityEntry::new(
            &ctx.request,
            "created",
            EntityKind::Reservation,
            reservation.id,
        )
        .describe(format!(
            "Reservation booked from {} to {}",
            reservation.start_time, reservation.end_time
        ))
        .build(),
    );

    notify_member(
        &state,
        &reservation,
        "reservation_created",
        "Reservation confirmed",
        format!(
            "Your session on {} is booked",
            reservation.start_time.format("%Y-%m-%d %H:%M")
        ),
    );

    Ok(Json(ApiResponse::with_message(
        reservation,
        "Reservation created successfully",
    )))
}

/// `PUT /api/reservations/:id`
pub async fn update(
    State(state): State<AppState>,
    ctx: Context,
    Path(id): Path<i64>,
    Json(payload): Json<ReservationPayload>,
) -> Result<Json<ApiResponse<Reservation>>, ApiError> {
    let input = payload.into_input()?;

    let reservation = ReservationRepository::new(state.pool.clone())
        .update(id, &input)
        .await?
        .ok_or_else(|| ApiError::NotFound("Reservation not found".into()))?;

    ActivityLogRepository::new(state.pool.clone()).insert_async(
        ActivityEntry::new(
            &ctx.request,
            "updated",
            EntityKind::Reservation,
            reservation.id,
        )
        .build(),
    );

    notify_member(
        &state,
        &reservation,
        "reservation_rescheduled",
        "Reservation rescheduled",
        format!(
            "Your session was moved to {}",
            reservation.start_time.format("%Y-%m-%d %H:%M")
        ),
    );

    Ok(Json(ApiResponse::with_message(
        reservation,
        "Reservation updated successfully",
    )))
}

/// `PATCH /api/reservations/:id/status`
pub async fn update_status(
    State(state): State<AppState>,
    ctx: Context,
    Path(id): Path<i64>,
    Json(payload): Json<StatusPayload>,
) -> Result<Json<ApiResponse<Reservation>>, ApiError> {
    let reservation = ReservationRepository::new(state.pool.clone())
        .set_status(id, payload.status)
        .await?
        .ok_or_else(|| ApiError::NotFound("Reservation not found".into()))?;

    ActivityLogRepository::new(state.pool.clone()).insert_async(
        ActivityEntry::new(
            &ctx.request,
            "status_changed",
            EntityKind::Reservation,
            reservation.id,
        )
        .describe(format!("Reservation marked {}", reservation.status))
        .build(),
    );

    if reservation.status == ReservationStatus::Cancelled {
        notify_member(
            &state,
            &reservation,
            "reservation_cancelled",
            "Reservation cancelled",
            format!(
                "Your session on {} was cancelled",
                reservation.start_time.format("%Y-%m-%d %H:%M")
            ),
        );
    }

    Ok(Json(ApiResponse::with_message(
        reservation,
        "Reservation status updated",
    )))
}

/// `DELETE /api/reservations/:id`
pub async fn remove(
    State(state): State<AppState>,
    ctx: Context,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let deleted = ReservationRepository::new(state.pool.clone())
        .soft_delete(id)
        .await?;
    if !deleted {
        return Err(ApiError::NotFound("Reservation not found".into()));
    }

    ActivityLogRepository::new(state.pool.clone()).insert_async(
        ActivityEntry::new(&ctx.request, "deleted", EntityKind::Reservation, id).build(),
    );

    Ok(Json(ApiResponse::message(
        "Reservation deleted successfully",
    )))
}

fn notify_member(
    state: &AppState,
    reservation: &Reservation,
    kind: &str,
    title: &str,
    body: String,
) {
    NotificationRepository::new(state.pool.clone()).insert_async(NotificationInput {
        subject_kind: EntityKind::Member,
        subject_id: reservation.member_id,
        kind: kind.to_string(),
        title: title.to_string(),
        body,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn rejects_inverted_time_window() {
        let payload = ReservationPayload {
            member_id: 1,
            coach_id: Some(2),
            service_id: 3,
            equipment_ids: vec![],
            start_time: Utc.with_ymd_and_hms(2025, 3, 1, 11, 0, 0).unwrap(),
            end_time: Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap(),
            notes: None,
        };
        assert!(payload.into_input().is_err());
    }

    #[test]
    fn accepts_well_formed_window() {
        let payload = ReservationPayload {
            member_id: 1,
            coach_id: None,
            service_id: 3,
            equipment_ids: vec![4, 7],
            start_time: Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap(),
            end_time: Utc.with_ymd_and_hms(2025, 3, 1, 11, 0, 0).unwrap(),
            notes: Some("first session".into()),
        };
        let input = payload.into_input().unwrap();
        assert_eq!(input.equipment_ids, vec![4, 7]);
        assert!(input.coach_id.is_none());
    }
}
