//! Whitelisted sorting for list endpoints.
//!
//! Sort fields interpolate into SQL, so they only pass through when they
//! match a repository's column whitelist; anything else falls back to the
//! endpoint's default order.

use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            _ => Err(format!("Unknown sort direction: {}", s)),
        }
    }
}

/// Caller-supplied sort request for a list endpoint.
#[derive(Debug, Clone, Default)]
pub struct SortParams {
    pub field: Option<String>,
    pub direction: SortDirection,
}

impl SortParams {
    /// The `ORDER BY` expression: the requested column when whitelisted,
    /// the endpoint default otherwise.
    pub fn order_by(&self, allowed: &[&str], default: &str) -> String {
        match self.field.as_deref() {
            Some(field) if allowed.contains(&field) => {
                format!("{} {}, id {}", field, self.direction.as_sql(), self.direction.as_sql())
            }
            _ => default.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whitelisted_field_is_used() {
        let sort = SortParams {
            field: Some("email".to_string()),
            direction: SortDirection::Desc,
        };
        assert_eq!(
            sort.order_by(&["name", "email"], "created_at DESC"),
            "email DESC, id DESC"
        );
    }

    #[test]
    fn test_unknown_field_falls_back() {
        let sort = SortParams {
            field: Some("password_hash; DROP TABLE users".to_string()),
            direction: SortDirection::Asc,
        };
        assert_eq!(sort.order_by(&["name"], "created_at DESC"), "created_at DESC");
    }

    #[test]
    fn test_missing_field_falls_back() {
        let sort = SortParams::default();
        assert_eq!(sort.order_by(&["name"], "name"), "name");
    }
}
