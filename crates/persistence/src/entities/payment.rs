//! Payment entity.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;

/// Database entity for payments.
#[derive(Debug, Clone, FromRow)]
pub struct PaymentEntity {
    pub id: i64,
    pub member_id: i64,
    pub subscription_id: Option<i64>,
    pub amount: Decimal,

    /// One of `cash`, `credit_card`, `bank_transfer`, `other`.
    pub payment_method: String,

    pub payment_date: NaiveDate,

    /// One of `paid`, `pending`, `cancelled`, `refunded`.
    pub status: String,

    pub invoice_number: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
