//! Role-aware dashboard endpoint.

use axum::{extract::State, Json};
use chrono::{Duration, Utc};
use domain::models::{
    AdminDashboard, CoachDashboard, Dashboard, ManagerDashboard, Role,
};
use persistence::repositories::{
    ActivityLogRepository, DashboardRepository, ReservationRepository,
};

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::Context;
use crate::response::ApiResponse;

const POPULAR_SERVICES_LIMIT: i64 = 5;
const UPCOMING_LIMIT: i64 = 10;
const RECENT_ACTIVITY_LIMIT: i64 = 10;
const REVENUE_MONTHS: i32 = 12;

/// `GET /api/dashboard/stats`
///
/// Admins get the manager view plus staffing, revenue trend, occupancy
/// and recent activity. Coaches only see their own schedule.
pub async fn stats(
    State(state): State<AppState>,
    ctx: Context,
) -> Result<Json<ApiResponse<Dashboard>>, ApiError> {
    let dashboards = DashboardRepository::new(state.pool.clone());
    let reservations = ReservationRepository::new(state.pool.clone());

    let dashboard = match ctx.auth.role {
        Role::Coach => {
            let coach_id = ctx.auth.user_id;
            Dashboard::Coach(Box::new(CoachDashboard {
                reservations: dashboards.coach_summary(coach_id).await?,
                reservations_by_day: dashboards.reservations_by_day(Some(coach_id)).await?,
                upcoming_reservations: reservations
                    .list_upcoming(Some(coach_id), None, UPCOMING_LIMIT)
                    .await?,
                top_services: dashboards
                    .coach_top_services(coach_id, POPULAR_SERVICES_LIMIT)
                    .await?,
            }))
        }
        Role::Manager => {
            Dashboard::Manager(Box::new(manager_view(&dashboards, &reservations).await?))
        }
        Role::Admin => {
            let manager = manager_view(&dashboards, &reservations).await?;
            let activity = ActivityLogRepository::new(state.pool.clone());
            Dashboard::Admin(Box::new(AdminDashboard {
                manager,
                users_by_role: dashboards.users_by_role().await?,
                revenue_by_month: dashboards.revenue_by_month(REVENUE_MONTHS).await?,
                service_occupancy: dashboards.service_occupancy().await?,
                recent_activity: activity.recent(RECENT_ACTIVITY_LIMIT).await?,
            }))
        }
    };

    Ok(Json(ApiResponse::data(dashboard)))
}

async fn manager_view(
    dashboards: &DashboardRepository,
    reservations: &ReservationRepository,
) -> Result<ManagerDashboard, sqlx::Error> {
    Ok(ManagerDashboard {
        members: dashboards.member_summary().await?,
        reservations: dashboards.reservation_summary().await?,
        finances: dashboards.finance_summary().await?,
        popular_services: dashboards.popular_services(POPULAR_SERVICES_LIMIT).await?,
        reservations_by_day: dashboards.reservations_by_day(None).await?,
        // Only sessions starting within the next day.
        upcoming_reservations: reservations
            .list_upcoming(None, Some(Utc::now() + Duration::hours(24)), UPCOMING_LIMIT)
            .await?,
    })
}
