//! Reservation entities.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database entity for reservations.
///
/// Equipment links live in `reservation_equipment`; queries needing them
/// aggregate the join rows into an array column.
#[derive(Debug, Clone, FromRow)]
pub struct ReservationEntity {
    pub id: i64,
    pub member_id: i64,
    pub coach_id: Option<i64>,
    pub service_id: i64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,

    /// One of `scheduled`, `completed`, `cancelled`, `no_show`.
    pub status: String,

    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Reservation row joined with member, coach, service and equipment names.
///
/// `equipment_ids` and `equipment_names` come from an `array_agg` over the
/// join table, filtered so a reservation with no equipment yields empty
/// arrays rather than `[NULL]`.
#[derive(Debug, Clone, FromRow)]
pub struct ReservationDetailsEntity {
    pub id: i64,
    pub member_id: i64,
    pub coach_id: Option<i64>,
    pub service_id: i64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub member_name: String,
    pub coach_name: Option<String>,
    pub service_name: String,
    pub equipment_ids: Vec<i64>,
    pub equipment_names: Vec<String>,
}
