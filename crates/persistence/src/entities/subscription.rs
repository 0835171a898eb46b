//! Subscription entity.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;

/// Database entity for subscriptions.
#[derive(Debug, Clone, FromRow)]
pub struct SubscriptionEntity {
    pub id: i64,
    pub member_id: i64,
    pub name: String,

    /// One of `monthly`, `quarterly`, `biannual`, `annual`.
    pub subscription_type: String,

    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub price: Decimal,
    pub auto_renewal: bool,

    /// One of `active`, `expired`, `cancelled`.
    pub status: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
