//! Reservations: a member booked for a service over a time window,
//! optionally with a coach and a set of equipment units.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Reservation lifecycle state.
///
/// Only `Scheduled` reservations occupy a slot. `Completed`, `Cancelled`
/// and `NoShow` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    Scheduled,
    Completed,
    Cancelled,
    NoShow,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Scheduled => "scheduled",
            ReservationStatus::Completed => "completed",
            ReservationStatus::Cancelled => "cancelled",
            ReservationStatus::NoShow => "no_show",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, ReservationStatus::Scheduled)
    }

    /// Whether a reservation in this state blocks the coach and equipment.
    pub fn blocks_slot(&self) -> bool {
        matches!(self, ReservationStatus::Scheduled)
    }
}

impl FromStr for ReservationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(ReservationStatus::Scheduled),
            "completed" => Ok(ReservationStatus::Completed),
            "cancelled" => Ok(ReservationStatus::Cancelled),
            "no_show" => Ok(ReservationStatus::NoShow),
            _ => Err(format!("Unknown reservation status: {}", s)),
        }
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A booked time window.
///
/// The window is half-open: `start_time` is inside it, `end_time` is not,
/// so back-to-back bookings never collide.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    pub id: i64,
    pub member_id: i64,
    pub coach_id: Option<i64>,
    pub service_id: i64,
    /// Equipment units held by this reservation, attached via the join
    /// table.
    pub equipment_ids: Vec<i64>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: ReservationStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Reservation with the joined display names the calendar and list views
/// need.
#[derive(Debug, Clone, Serialize)]
pub struct ReservationDetails {
    #[serde(flatten)]
    pub reservation: Reservation,
    pub member_name: String,
    pub coach_name: Option<String>,
    pub service_name: String,
    pub equipment_names: Vec<String>,
}

/// Reservation counts grouped by status.
#[derive(Debug, Clone, Serialize)]
pub struct ReservationStats {
    pub total: i64,
    pub scheduled: i64,
    pub completed: i64,
    pub cancelled: i64,
    pub no_show: i64,
    pub today: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in [
            ReservationStatus::Scheduled,
            ReservationStatus::Completed,
            ReservationStatus::Cancelled,
            ReservationStatus::NoShow,
        ] {
            assert_eq!(
                ReservationStatus::from_str(status.as_str()).unwrap(),
                status
            );
        }
        assert!(ReservationStatus::from_str("pending").is_err());
    }

    #[test]
    fn test_only_scheduled_blocks_slot() {
        assert!(ReservationStatus::Scheduled.blocks_slot());
        assert!(!ReservationStatus::Completed.blocks_slot());
        assert!(!ReservationStatus::Cancelled.blocks_slot());
        assert!(!ReservationStatus::NoShow.blocks_slot());
    }

    #[test]
    fn test_terminal_states() {
        assert!(!ReservationStatus::Scheduled.is_terminal());
        assert!(ReservationStatus::Completed.is_terminal());
        assert!(ReservationStatus::Cancelled.is_terminal());
        assert!(ReservationStatus::NoShow.is_terminal());
    }
}
