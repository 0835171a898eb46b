//! Dashboard aggregation queries.
//!
//! Read-only rollups backing the role-scoped dashboard endpoint. The
//! weekly breakdown always covers Monday through Sunday of the current
//! week, with zero counts for empty days.

use domain::models::dashboard::{
    CoachReservationSummary, DayCount, FinanceSummary, MemberSummary, MonthRevenue,
    ReservationSummary, RoleCount, ServiceCount, ServiceOccupancy,
};
use domain::models::dashboard::percent_change;
use rust_decimal::Decimal;
use sqlx::PgPool;

/// Repository for dashboard rollup queries.
#[derive(Clone)]
pub struct DashboardRepository {
    pool: PgPool,
}

impl DashboardRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn member_summary(&self) -> Result<MemberSummary, sqlx::Error> {
        let row: (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*),
                COUNT(*) FILTER (WHERE status = 'active'),
                COUNT(*) FILTER (WHERE created_at >= date_trunc('month', now()))
            FROM members
            WHERE deleted_at IS NULL
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(MemberSummary {
            total: row.0,
            active: row.1,
            new_this_month: row.2,
        })
    }

    pub async fn reservation_summary(&self) -> Result<ReservationSummary, sqlx::Error> {
        let row: (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*),
                COUNT(*) FILTER (WHERE status = 'scheduled' AND start_time >= now()),
                COUNT(*) FILTER (WHERE start_time::date = CURRENT_DATE)
            FROM reservations
            WHERE deleted_at IS NULL
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(ReservationSummary {
            total: row.0,
            upcoming: row.1,
            today: row.2,
        })
    }

    pub async fn finance_summary(&self) -> Result<FinanceSummary, sqlx::Error> {
        let row: (Option<Decimal>, Option<Decimal>) = sqlx::query_as(
            r#"
            SELECT
                SUM(amount) FILTER (WHERE date_trunc('month', payment_date)
                    = date_trunc('month', CURRENT_DATE)),
                SUM(amount) FILTER (WHERE date_trunc('month', payment_date)
                    = date_trunc('month', CURRENT_DATE - interval '1 month'))
            FROM payments
            WHERE status = 'paid' AND deleted_at IS NULL
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        let this_month = row.0.unwrap_or(Decimal::ZERO);
        let last_month = row.1.unwrap_or(Decimal::ZERO);

        Ok(FinanceSummary {
            revenue_this_month: this_month,
            revenue_last_month: last_month,
            percent_change: percent_change(this_month, last_month),
        })
    }

    /// The most-booked services, descending.
    pub async fn popular_services(&self, limit: i64) -> Result<Vec<ServiceCount>, sqlx::Error> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT s.name, COUNT(*) AS count
            FROM reservations r
            JOIN services s ON s.id = r.service_id
            WHERE r.deleted_at IS NULL
            GROUP BY s.name
            ORDER BY count DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(service, count)| ServiceCount { service, count })
            .collect())
    }

    /// Reservation counts per day for the current week, optionally scoped
    /// to one coach.
    pub async fn reservations_by_day(
        &self,
        coach_id: Option<i64>,
    ) -> Result<Vec<DayCount>, sqlx::Error> {
        let rows: Vec<(chrono::NaiveDate, String, i64)> = sqlx::query_as(
            r#"
            SELECT d::date,
                   trim(to_char(d, 'Dy')),
                   COUNT(r.id)
            FROM generate_series(
                date_trunc('week', CURRENT_DATE),
                date_trunc('week', CURRENT_DATE) + interval '6 days',
                interval '1 day'
            ) AS d
            LEFT JOIN reservations r
                ON r.start_time::date = d::date
               AND r.deleted_at IS NULL
               AND ($1::bigint IS NULL OR r.coach_id = $1)
            GROUP BY d
            ORDER BY d
            "#,
        )
        .bind(coach_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(date, day, count)| DayCount { day, date, count })
            .collect())
    }

    pub async fn users_by_role(&self) -> Result<Vec<RoleCount>, sqlx::Error> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            "SELECT role, COUNT(*) FROM users WHERE deleted_at IS NULL GROUP BY role ORDER BY role",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(role, count)| RoleCount { role, count })
            .collect())
    }

    /// Paid revenue per month over the trailing `months` months, oldest
    /// first. Empty months show zero.
    pub async fn revenue_by_month(&self, months: i32) -> Result<Vec<MonthRevenue>, sqlx::Error> {
        let rows: Vec<(String, Option<Decimal>)> = sqlx::query_as(
            r#"
            SELECT trim(to_char(m, 'Mon YYYY')),
                   SUM(p.amount) FILTER (WHERE p.status = 'paid' AND p.deleted_at IS NULL)
            FROM generate_series(
                date_trunc('month', CURRENT_DATE) - make_interval(months => $1 - 1),
                date_trunc('month', CURRENT_DATE),
                interval '1 month'
            ) AS m
            LEFT JOIN payments p
                ON date_trunc('month', p.payment_date) = m
            GROUP BY m
            ORDER BY m
            "#,
        )
        .bind(months)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(month, revenue)| MonthRevenue {
                month,
                revenue: revenue.unwrap_or(Decimal::ZERO),
            })
            .collect())
    }

    /// Completion breakdown per service.
    pub async fn service_occupancy(&self) -> Result<Vec<ServiceOccupancy>, sqlx::Error> {
        let rows: Vec<(String, i64, i64, i64, i64)> = sqlx::query_as(
            r#"
            SELECT s.name,
                   COUNT(r.id),
                   COUNT(r.id) FILTER (WHERE r.status = 'completed'),
                   COUNT(r.id) FILTER (WHERE r.status = 'cancelled'),
                   COUNT(r.id) FILTER (WHERE r.status = 'no_show')
            FROM services s
            LEFT JOIN reservations r ON r.service_id = s.id AND r.deleted_at IS NULL
            WHERE s.deleted_at IS NULL
            GROUP BY s.name
            ORDER BY s.name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(service, total, completed, cancelled, no_show)| {
                let occupancy_rate = if total > 0 {
                    ((completed as f64 / total as f64) * 10_000.0).round() / 100.0
                } else {
                    0.0
                };
                ServiceOccupancy {
                    service,
                    total,
                    completed,
                    cancelled,
                    no_show,
                    occupancy_rate,
                }
            })
            .collect())
    }

    pub async fn coach_summary(
        &self,
        coach_id: i64,
    ) -> Result<CoachReservationSummary, sqlx::Error> {
        let row: (i64, i64, i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*),
                COUNT(*) FILTER (WHERE status = 'completed'),
                COUNT(*) FILTER (WHERE status = 'scheduled' AND start_time >= now()),
                COUNT(*) FILTER (WHERE status = 'cancelled'),
                COUNT(*) FILTER (WHERE status = 'no_show')
            FROM reservations
            WHERE coach_id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(coach_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(CoachReservationSummary {
            total: row.0,
            completed: row.1,
            upcoming: row.2,
            cancelled: row.3,
            no_show: row.4,
        })
    }

    /// The services one coach teaches most, descending.
    pub async fn coach_top_services(
        &self,
        coach_id: i64,
        limit: i64,
    ) -> Result<Vec<ServiceCount>, sqlx::Error> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT s.name, COUNT(*) AS count
            FROM reservations r
            JOIN services s ON s.id = r.service_id
            WHERE r.coach_id = $1 AND r.deleted_at IS NULL
            GROUP BY s.name
            ORDER BY count DESC
            LIMIT $2
            "#,
        )
        .bind(coach_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(service, count)| ServiceCount { service, count })
            .collect())
    }
}
