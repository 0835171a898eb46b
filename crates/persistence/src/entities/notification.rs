//! Notification entity.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database entity for notifications.
#[derive(Debug, Clone, FromRow)]
pub struct NotificationEntity {
    pub id: i64,

    /// Either `user` or `member`.
    pub subject_kind: String,

    pub subject_id: i64,
    pub kind: String,
    pub title: String,
    pub body: String,
    pub read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
