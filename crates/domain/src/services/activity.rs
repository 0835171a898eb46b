//! Activity log entry construction.
//!
//! Handlers never reach for an ambient "current user": the acting staff
//! account travels as an explicit [`RequestContext`] and every log entry is
//! built from one.

use crate::models::{EntityKind, Role};
use serde_json::Value;

/// Who is performing the current request.
///
/// Built by the authentication extractor and passed down to repositories;
/// `actor_id` is `None` only for unauthenticated flows such as login
/// failures.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub actor_id: Option<i64>,
    pub role: Option<Role>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl RequestContext {
    pub fn authenticated(actor_id: i64, role: Role) -> Self {
        Self {
            actor_id: Some(actor_id),
            role: Some(role),
            ip_address: None,
            user_agent: None,
        }
    }

    pub fn anonymous() -> Self {
        Self {
            actor_id: None,
            role: None,
            ip_address: None,
            user_agent: None,
        }
    }

    pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
        self.ip_address = Some(ip.into());
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }
}

/// Input for one activity log row.
#[derive(Debug, Clone)]
pub struct NewActivityLog {
    pub actor_id: Option<i64>,
    pub action: String,
    pub entity_kind: EntityKind,
    pub entity_id: i64,
    pub description: String,
    pub details: Option<Value>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Builder for activity log entries.
#[derive(Debug, Clone)]
pub struct ActivityEntry {
    actor_id: Option<i64>,
    action: String,
    entity_kind: EntityKind,
    entity_id: i64,
    description: String,
    details: Option<Value>,
    ip_address: Option<String>,
    user_agent: Option<String>,
}

impl ActivityEntry {
    pub fn new(
        ctx: &RequestContext,
        action: impl Into<String>,
        entity_kind: EntityKind,
        entity_id: i64,
    ) -> Self {
        Self {
            actor_id: ctx.actor_id,
            action: action.into(),
            entity_kind,
            entity_id,
            description: String::new(),
            details: None,
            ip_address: ctx.ip_address.clone(),
            user_agent: ctx.user_agent.clone(),
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn build(self) -> NewActivityLog {
        NewActivityLog {
            actor_id: self.actor_id,
            action: self.action,
            entity_kind: self.entity_kind,
            entity_id: self.entity_id,
            description: self.description,
            details: self.details,
            ip_address: self.ip_address,
            user_agent: self.user_agent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entry_carries_actor_and_client_metadata() {
        let ctx = RequestContext::authenticated(42, Role::Manager)
            .with_ip("203.0.113.9")
            .with_user_agent("Mozilla/5.0 (X11; Linux x86_64)");
        let entry = ActivityEntry::new(&ctx, "created", EntityKind::Member, 7)
            .describe("Created member Ada Lovelace")
            .build();

        assert_eq!(entry.actor_id, Some(42));
        assert_eq!(entry.action, "created");
        assert_eq!(entry.entity_kind, EntityKind::Member);
        assert_eq!(entry.entity_id, 7);
        assert_eq!(entry.ip_address.as_deref(), Some("203.0.113.9"));
        assert_eq!(
            entry.user_agent.as_deref(),
            Some("Mozilla/5.0 (X11; Linux x86_64)")
        );
    }

    #[test]
    fn test_anonymous_context() {
        let ctx = RequestContext::anonymous();
        let entry = ActivityEntry::new(&ctx, "login_failed", EntityKind::User, 0)
            .describe("Failed login for unknown@example.com")
            .with_details(json!({ "email": "unknown@example.com" }))
            .build();

        assert_eq!(entry.actor_id, None);
        assert!(entry.details.is_some());
    }
}
