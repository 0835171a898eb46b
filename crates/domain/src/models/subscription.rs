//! Member subscriptions.

use chrono::{DateTime, Months, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Subscription plan length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionType {
    Monthly,
    Quarterly,
    Biannual,
    Annual,
}

impl SubscriptionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionType::Monthly => "monthly",
            SubscriptionType::Quarterly => "quarterly",
            SubscriptionType::Biannual => "biannual",
            SubscriptionType::Annual => "annual",
        }
    }

    pub fn duration_months(&self) -> u32 {
        match self {
            SubscriptionType::Monthly => 1,
            SubscriptionType::Quarterly => 3,
            SubscriptionType::Biannual => 6,
            SubscriptionType::Annual => 12,
        }
    }

    /// End date for a plan starting on `start`.
    pub fn end_date_from(&self, start: NaiveDate) -> NaiveDate {
        start + Months::new(self.duration_months())
    }
}

impl FromStr for SubscriptionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "monthly" => Ok(SubscriptionType::Monthly),
            "quarterly" => Ok(SubscriptionType::Quarterly),
            "biannual" => Ok(SubscriptionType::Biannual),
            "annual" => Ok(SubscriptionType::Annual),
            _ => Err(format!("Unknown subscription type: {}", s)),
        }
    }
}

impl fmt::Display for SubscriptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Subscription lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Expired,
    Cancelled,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Expired => "expired",
            SubscriptionStatus::Cancelled => "cancelled",
        }
    }
}

impl FromStr for SubscriptionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(SubscriptionStatus::Active),
            "expired" => Ok(SubscriptionStatus::Expired),
            "cancelled" => Ok(SubscriptionStatus::Cancelled),
            _ => Err(format!("Unknown subscription status: {}", s)),
        }
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A member's subscription to a plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub id: i64,
    pub member_id: i64,
    pub name: String,
    pub subscription_type: SubscriptionType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub price: Decimal,
    pub auto_renewal: bool,
    pub status: SubscriptionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Subscription {
    /// Active and ending within the next `days` days (inclusive).
    pub fn expires_within(&self, today: NaiveDate, days: i64) -> bool {
        self.status == SubscriptionStatus::Active
            && self.end_date >= today
            && (self.end_date - today).num_days() <= days
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subscription(status: SubscriptionStatus, end_date: NaiveDate) -> Subscription {
        Subscription {
            id: 1,
            member_id: 1,
            name: "Basic monthly".to_string(),
            subscription_type: SubscriptionType::Monthly,
            start_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            end_date,
            price: Decimal::new(4990, 2),
            auto_renewal: false,
            status,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_type_round_trip() {
        for plan in [
            SubscriptionType::Monthly,
            SubscriptionType::Quarterly,
            SubscriptionType::Biannual,
            SubscriptionType::Annual,
        ] {
            assert_eq!(SubscriptionType::from_str(plan.as_str()).unwrap(), plan);
        }
    }

    #[test]
    fn test_end_date_from_start() {
        let start = NaiveDate::from_ymd_opt(2025, 1, 31).unwrap();
        assert_eq!(
            SubscriptionType::Monthly.end_date_from(start),
            NaiveDate::from_ymd_opt(2025, 2, 28).unwrap()
        );
        assert_eq!(
            SubscriptionType::Annual.end_date_from(start),
            NaiveDate::from_ymd_opt(2026, 1, 31).unwrap()
        );
    }

    #[test]
    fn test_expires_within() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let soon = NaiveDate::from_ymd_opt(2025, 6, 20).unwrap();
        let far = NaiveDate::from_ymd_opt(2025, 9, 1).unwrap();
        let past = NaiveDate::from_ymd_opt(2025, 5, 1).unwrap();

        assert!(subscription(SubscriptionStatus::Active, soon).expires_within(today, 30));
        assert!(!subscription(SubscriptionStatus::Active, far).expires_within(today, 30));
        assert!(!subscription(SubscriptionStatus::Active, past).expires_within(today, 30));
        assert!(!subscription(SubscriptionStatus::Cancelled, soon).expires_within(today, 30));
    }
}
