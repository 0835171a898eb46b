//! Append-only activity log.

use crate::models::EntityKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One recorded mutation: who did what to which entity.
///
/// Rows are append-only; nothing in the API mutates or deletes them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityLog {
    pub id: i64,
    pub actor_id: Option<i64>,
    pub action: String,
    pub entity_kind: EntityKind,
    pub entity_id: i64,
    pub description: String,
    pub details: Option<Value>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}
