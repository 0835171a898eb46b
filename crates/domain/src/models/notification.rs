//! In-app notifications.

use crate::models::EntityKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A notification addressed to one recipient.
///
/// The recipient is a tagged polymorphic reference: staff accounts are
/// `(user, id)`, gym members are `(member, id)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    pub subject_kind: EntityKind,
    pub subject_id: i64,
    pub kind: String,
    pub title: String,
    pub body: String,
    pub read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn is_read(&self) -> bool {
        self.read
    }
}
