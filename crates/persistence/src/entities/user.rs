//! Staff account entity.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database entity for staff accounts.
#[derive(Debug, Clone, FromRow)]
pub struct UserEntity {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: String,

    /// One of `admin`, `manager`, `coach`.
    pub role: String,

    pub phone: Option<String>,
    pub specialty: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
