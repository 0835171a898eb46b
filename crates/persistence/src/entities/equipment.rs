//! Equipment entity.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;

/// Database entity for equipment.
#[derive(Debug, Clone, FromRow)]
pub struct EquipmentEntity {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub serial_number: Option<String>,

    /// One of `available`, `in_use`, `maintenance`, `out_of_service`.
    pub status: String,

    pub purchase_date: Option<NaiveDate>,
    pub purchase_price: Option<Decimal>,
    pub last_maintenance_date: Option<NaiveDate>,
    pub next_maintenance_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
