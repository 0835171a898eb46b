//! Payments and invoice records.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How a payment was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    CreditCard,
    BankTransfer,
    Other,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::CreditCard => "credit_card",
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::Other => "other",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash" => Ok(PaymentMethod::Cash),
            "credit_card" => Ok(PaymentMethod::CreditCard),
            "bank_transfer" => Ok(PaymentMethod::BankTransfer),
            "other" => Ok(PaymentMethod::Other),
            _ => Err(format!("Unknown payment method: {}", s)),
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Settlement state of a payment.
///
/// Marking a payment `Paid` re-activates its subscription; `Cancelled` and
/// `Refunded` push the subscription back to cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Paid,
    Pending,
    Cancelled,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Paid => "paid",
            PaymentStatus::Pending => "pending",
            PaymentStatus::Cancelled => "cancelled",
            PaymentStatus::Refunded => "refunded",
        }
    }

    /// Whether the amount counts towards revenue totals.
    pub fn counts_as_revenue(&self) -> bool {
        matches!(self, PaymentStatus::Paid)
    }
}

impl FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "paid" => Ok(PaymentStatus::Paid),
            "pending" => Ok(PaymentStatus::Pending),
            "cancelled" => Ok(PaymentStatus::Cancelled),
            "refunded" => Ok(PaymentStatus::Refunded),
            _ => Err(format!("Unknown payment status: {}", s)),
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A payment, optionally settling a member's subscription.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: i64,
    pub member_id: i64,
    pub subscription_id: Option<i64>,
    pub amount: Decimal,
    pub payment_method: PaymentMethod,
    pub payment_date: NaiveDate,
    pub status: PaymentStatus,
    pub invoice_number: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payment joined with the member and plan details an invoice displays.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentInvoice {
    #[serde(flatten)]
    pub payment: Payment,
    pub member_name: String,
    pub member_email: String,
    pub subscription_name: Option<String>,
    pub subscription_type: Option<String>,
}

/// Revenue total for one calendar month of the requested year.
#[derive(Debug, Clone, Serialize)]
pub struct MonthlyRevenue {
    /// 1-based month number.
    pub month: u32,
    pub total: Decimal,
}

/// Revenue total per payment method.
#[derive(Debug, Clone, Serialize)]
pub struct MethodRevenue {
    pub method: PaymentMethod,
    pub total: Decimal,
}

/// Payment count and amount per status.
#[derive(Debug, Clone, Serialize)]
pub struct StatusTotal {
    pub status: PaymentStatus,
    pub count: i64,
    pub total: Decimal,
}

/// Financial aggregates for one year. Includes tombstoned payments;
/// historical reporting does not forget deleted rows.
#[derive(Debug, Clone, Serialize)]
pub struct FinancialStats {
    pub year: i32,
    pub total_revenue: Decimal,
    pub revenue_by_month: Vec<MonthlyRevenue>,
    pub revenue_by_method: Vec<MethodRevenue>,
    pub by_status: Vec<StatusTotal>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_round_trip() {
        for method in [
            PaymentMethod::Cash,
            PaymentMethod::CreditCard,
            PaymentMethod::BankTransfer,
            PaymentMethod::Other,
        ] {
            assert_eq!(PaymentMethod::from_str(method.as_str()).unwrap(), method);
        }
    }

    #[test]
    fn test_only_paid_counts_as_revenue() {
        assert!(PaymentStatus::Paid.counts_as_revenue());
        assert!(!PaymentStatus::Pending.counts_as_revenue());
        assert!(!PaymentStatus::Cancelled.counts_as_revenue());
        assert!(!PaymentStatus::Refunded.counts_as_revenue());
    }

    #[test]
    fn test_stats_types_reachable_from_models_root() {
        // The stats structs are part of the crate surface alongside Payment.
        let breakdown = crate::models::StatusTotal {
            status: PaymentStatus::Paid,
            count: 3,
            total: Decimal::new(15000, 2),
        };
        assert_eq!(breakdown.count, 3);
    }
}
