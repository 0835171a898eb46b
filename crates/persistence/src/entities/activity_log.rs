//! Activity log entity.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database entity for activity log rows.
#[derive(Debug, Clone, FromRow)]
pub struct ActivityLogEntity {
    pub id: i64,
    pub actor_id: Option<i64>,
    pub action: String,
    pub entity_kind: String,
    pub entity_id: i64,
    pub description: String,
    pub details: Option<serde_json::Value>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}
