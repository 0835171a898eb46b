//! Role-scoped dashboard payloads.
//!
//! The `/dashboard/stats` endpoint returns one of three shapes depending
//! on the caller's role. Admin extends the manager view; the coach view is
//! scoped to the caller's own reservations.

use crate::models::reservation::ReservationDetails;
use crate::models::ActivityLog;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct MemberSummary {
    pub total: i64,
    pub active: i64,
    pub new_this_month: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReservationSummary {
    pub total: i64,
    pub upcoming: i64,
    pub today: i64,
}

/// This month vs last month, with the relative change in percent. The
/// change reads 100 when last month had no revenue.
#[derive(Debug, Clone, Serialize)]
pub struct FinanceSummary {
    pub revenue_this_month: Decimal,
    pub revenue_last_month: Decimal,
    pub percent_change: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceCount {
    pub service: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DayCount {
    pub day: String,
    pub date: NaiveDate,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoleCount {
    pub role: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthRevenue {
    pub month: String,
    pub revenue: Decimal,
}

/// Per-service completion breakdown. `occupancy_rate` is the completed
/// share of all reservations for the service, in percent.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceOccupancy {
    pub service: String,
    pub total: i64,
    pub completed: i64,
    pub cancelled: i64,
    pub no_show: i64,
    pub occupancy_rate: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ManagerDashboard {
    pub members: MemberSummary,
    pub reservations: ReservationSummary,
    pub finances: FinanceSummary,
    pub popular_services: Vec<ServiceCount>,
    pub reservations_by_day: Vec<DayCount>,
    pub upcoming_reservations: Vec<ReservationDetails>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminDashboard {
    #[serde(flatten)]
    pub manager: ManagerDashboard,
    pub users_by_role: Vec<RoleCount>,
    pub revenue_by_month: Vec<MonthRevenue>,
    pub service_occupancy: Vec<ServiceOccupancy>,
    pub recent_activity: Vec<ActivityLog>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CoachReservationSummary {
    pub total: i64,
    pub completed: i64,
    pub upcoming: i64,
    pub cancelled: i64,
    pub no_show: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CoachDashboard {
    pub reservations: CoachReservationSummary,
    pub reservations_by_day: Vec<DayCount>,
    pub upcoming_reservations: Vec<ReservationDetails>,
    pub top_services: Vec<ServiceCount>,
}

/// Dashboard payload selected by the caller's role.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Dashboard {
    Admin(Box<AdminDashboard>),
    Manager(Box<ManagerDashboard>),
    Coach(Box<CoachDashboard>),
}

/// Percent change of `current` against `previous`, rounded to two
/// decimals. Reads 100 when `previous` is zero or negative.
pub fn percent_change(current: Decimal, previous: Decimal) -> f64 {
    if previous <= Decimal::ZERO {
        return 100.0;
    }
    let ratio = (current - previous) / previous * Decimal::new(100, 0);
    let value: f64 = ratio.try_into().unwrap_or(0.0);
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_change() {
        let current = Decimal::new(1500, 0);
        let previous = Decimal::new(1000, 0);
        assert_eq!(percent_change(current, previous), 50.0);
    }

    #[test]
    fn test_percent_change_zero_previous() {
        assert_eq!(percent_change(Decimal::new(500, 0), Decimal::ZERO), 100.0);
    }

    #[test]
    fn test_percent_change_decline() {
        let current = Decimal::new(750, 0);
        let previous = Decimal::new(1000, 0);
        assert_eq!(percent_change(current, previous), -25.0);
    }
}
