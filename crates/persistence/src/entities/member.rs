//! Member entity.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;

/// Database entity for members.
#[derive(Debug, Clone, FromRow)]
pub struct MemberEntity {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub birth_date: Option<NaiveDate>,
    pub address: Option<String>,
    pub emergency_contact: Option<String>,
    pub photo: Option<String>,

    /// One of `active`, `inactive`, `pending`.
    pub status: String,

    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
