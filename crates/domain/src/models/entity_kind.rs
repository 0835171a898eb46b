//! Tagged entity references.
//!
//! Notifications and activity log rows point at a subject entity through a
//! `(kind, id)` pair. The kind is a closed enum stored as text, so every
//! read-side dispatch over subjects is an exhaustive match.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The kinds of entity a notification or activity log row may reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Member,
    Service,
    Equipment,
    Subscription,
    Reservation,
    Payment,
    User,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Member => "member",
            EntityKind::Service => "service",
            EntityKind::Equipment => "equipment",
            EntityKind::Subscription => "subscription",
            EntityKind::Reservation => "reservation",
            EntityKind::Payment => "payment",
            EntityKind::User => "user",
        }
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "member" => Ok(EntityKind::Member),
            "service" => Ok(EntityKind::Service),
            "equipment" => Ok(EntityKind::Equipment),
            "subscription" => Ok(EntityKind::Subscription),
            "reservation" => Ok(EntityKind::Reservation),
            "payment" => Ok(EntityKind::Payment),
            "user" => Ok(EntityKind::User),
            _ => Err(format!("Unknown entity kind: {}", s)),
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        for kind in [
            EntityKind::Member,
            EntityKind::Service,
            EntityKind::Equipment,
            EntityKind::Subscription,
            EntityKind::Reservation,
            EntityKind::Payment,
            EntityKind::User,
        ] {
            assert_eq!(EntityKind::from_str(kind.as_str()).unwrap(), kind);
        }
    }

    #[test]
    fn test_serde_uses_snake_case() {
        let json = serde_json::to_string(&EntityKind::Reservation).unwrap();
        assert_eq!(json, "\"reservation\"");
    }

    #[test]
    fn test_unknown_kind() {
        assert!(EntityKind::from_str("invoice").is_err());
    }
}
