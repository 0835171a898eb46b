//! Equipment inventory.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Operational state of a piece of equipment.
///
/// `InUse` is driven by the reservation lifecycle; the other states are set
/// by staff. Only `Available` equipment can be attached to a new booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentStatus {
    Available,
    InUse,
    Maintenance,
    OutOfService,
}

impl EquipmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EquipmentStatus::Available => "available",
            EquipmentStatus::InUse => "in_use",
            EquipmentStatus::Maintenance => "maintenance",
            EquipmentStatus::OutOfService => "out_of_service",
        }
    }
}

impl FromStr for EquipmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(EquipmentStatus::Available),
            "in_use" => Ok(EquipmentStatus::InUse),
            "maintenance" => Ok(EquipmentStatus::Maintenance),
            "out_of_service" => Ok(EquipmentStatus::OutOfService),
            _ => Err(format!("Unknown equipment status: {}", s)),
        }
    }
}

impl fmt::Display for EquipmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A piece of gym equipment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Equipment {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub serial_number: Option<String>,
    pub status: EquipmentStatus,
    pub purchase_date: Option<NaiveDate>,
    pub purchase_price: Option<Decimal>,
    pub last_maintenance_date: Option<NaiveDate>,
    pub next_maintenance_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Equipment {
    /// Whether the unit can be attached to a new reservation.
    pub fn is_bookable(&self) -> bool {
        self.status == EquipmentStatus::Available
    }

    /// Whether maintenance is due on or before `today`.
    pub fn maintenance_due(&self, today: NaiveDate) -> bool {
        self.next_maintenance_date
            .map(|due| due <= today)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn equipment(status: EquipmentStatus) -> Equipment {
        Equipment {
            id: 1,
            name: "Treadmill".into(),
            description: None,
            category: Some("cardio".into()),
            serial_number: None,
            status,
            purchase_date: None,
            purchase_price: None,
            last_maintenance_date: None,
            next_maintenance_date: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            EquipmentStatus::Available,
            EquipmentStatus::InUse,
            EquipmentStatus::Maintenance,
            EquipmentStatus::OutOfService,
        ] {
            assert_eq!(EquipmentStatus::from_str(status.as_str()).unwrap(), status);
        }
    }

    #[test]
    fn test_only_available_is_bookable() {
        assert!(equipment(EquipmentStatus::Available).is_bookable());
        assert!(!equipment(EquipmentStatus::InUse).is_bookable());
        assert!(!equipment(EquipmentStatus::Maintenance).is_bookable());
        assert!(!equipment(EquipmentStatus::OutOfService).is_bookable());
    }

    #[test]
    fn test_maintenance_due() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
        let mut unit = equipment(EquipmentStatus::Available);
        assert!(!unit.maintenance_due(today));

        unit.next_maintenance_date = NaiveDate::from_ymd_opt(2025, 6, 15);
        assert!(unit.maintenance_due(today));

        unit.next_maintenance_date = NaiveDate::from_ymd_opt(2025, 7, 1);
        assert!(!unit.maintenance_due(today));
    }
}
