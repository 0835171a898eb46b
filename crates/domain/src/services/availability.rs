//! Availability checking for reservations.
//!
//! A booking holds a set of equipment units and optionally a coach over a
//! half-open window `[start, end)`. Two windows collide when each starts
//! before the other ends, so a booking ending at 10:00 never collides with
//! one starting at 10:00.
//!
//! Only `Scheduled` reservations occupy resources. Completed, cancelled
//! and no-show rows are dead weight for availability purposes.

use crate::models::{Equipment, EquipmentStatus, Reservation};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Why a window cannot be booked.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AvailabilityError {
    #[error("Coach is already booked during this time slot")]
    CoachBusy { conflicting_reservation_id: i64 },

    #[error("Equipment is already reserved during this time slot")]
    EquipmentBusy { conflicting_reservation_id: i64 },

    #[error("Equipment is not available (status: {status})")]
    EquipmentNotAvailable { status: EquipmentStatus },
}

/// Half-open interval overlap: `[a_start, a_end)` against `[b_start, b_end)`.
pub fn overlaps(
    a_start: DateTime<Utc>,
    a_end: DateTime<Utc>,
    b_start: DateTime<Utc>,
    b_end: DateTime<Utc>,
) -> bool {
    a_start < b_end && a_end > b_start
}

/// First blocking reservation that overlaps `[start, end)`, skipping the
/// reservation identified by `exclude_id` so reschedules do not collide
/// with themselves.
pub fn find_conflict<'a>(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    exclude_id: Option<i64>,
    existing: &'a [Reservation],
) -> Option<&'a Reservation> {
    existing.iter().find(|r| {
        r.status.blocks_slot()
            && Some(r.id) != exclude_id
            && overlaps(start, end, r.start_time, r.end_time)
    })
}

/// Checks the coach's schedule for a collision with `[start, end)`.
///
/// `existing` must hold the coach's reservations; rows for other coaches
/// would produce false conflicts.
pub fn check_coach(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    exclude_id: Option<i64>,
    existing: &[Reservation],
) -> Result<(), AvailabilityError> {
    match find_conflict(start, end, exclude_id, existing) {
        Some(conflict) => Err(AvailabilityError::CoachBusy {
            conflicting_reservation_id: conflict.id,
        }),
        None => Ok(()),
    }
}

/// Checks that the unit is in a bookable state and free over `[start, end)`.
///
/// A unit held `InUse` by the reservation being rescheduled is still
/// bookable for it, so the status gate only rejects `Maintenance` and
/// `OutOfService`; the overlap scan handles contention.
pub fn check_equipment(
    equipment: &Equipment,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    exclude_id: Option<i64>,
    existing: &[Reservation],
) -> Result<(), AvailabilityError> {
    if matches!(
        equipment.status,
        EquipmentStatus::Maintenance | EquipmentStatus::OutOfService
    ) {
        return Err(AvailabilityError::EquipmentNotAvailable {
            status: equipment.status,
        });
    }
    match find_conflict(start, end, exclude_id, existing) {
        Some(conflict) => Err(AvailabilityError::EquipmentBusy {
            conflicting_reservation_id: conflict.id,
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ReservationStatus;
    use chrono::TimeZone;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 10, hour, minute, 0).unwrap()
    }

    fn reservation(
        id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        status: ReservationStatus,
    ) -> Reservation {
        Reservation {
            id,
            member_id: 1,
            coach_id: Some(7),
            service_id: 3,
            equipment_ids: vec![],
            start_time: start,
            end_time: end,
            status,
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_overlap_is_half_open() {
        // Back-to-back windows share an endpoint but not a moment.
        assert!(!overlaps(at(9, 0), at(10, 0), at(10, 0), at(11, 0)));
        assert!(!overlaps(at(10, 0), at(11, 0), at(9, 0), at(10, 0)));
    }

    #[test]
    fn test_overlap_partial_and_containment() {
        assert!(overlaps(at(9, 0), at(10, 30), at(10, 0), at(11, 0)));
        assert!(overlaps(at(9, 0), at(12, 0), at(10, 0), at(11, 0)));
        assert!(overlaps(at(10, 15), at(10, 45), at(10, 0), at(11, 0)));
        assert!(overlaps(at(10, 0), at(11, 0), at(10, 0), at(11, 0)));
    }

    #[test]
    fn test_overlap_is_symmetric() {
        let cases = [
            (at(9, 0), at(10, 30), at(10, 0), at(11, 0)),
            (at(9, 0), at(10, 0), at(10, 0), at(11, 0)),
            (at(8, 0), at(12, 0), at(9, 0), at(10, 0)),
        ];
        for (a1, a2, b1, b2) in cases {
            assert_eq!(overlaps(a1, a2, b1, b2), overlaps(b1, b2, a1, a2));
        }
    }

    #[test]
    fn test_terminal_reservations_do_not_block() {
        let existing = vec![
            reservation(1, at(10, 0), at(11, 0), ReservationStatus::Cancelled),
            reservation(2, at(10, 0), at(11, 0), ReservationStatus::Completed),
            reservation(3, at(10, 0), at(11, 0), ReservationStatus::NoShow),
        ];
        assert!(find_conflict(at(10, 0), at(11, 0), None, &existing).is_none());
    }

    #[test]
    fn test_scheduled_reservation_blocks() {
        let existing = vec![reservation(
            5,
            at(10, 0),
            at(11, 0),
            ReservationStatus::Scheduled,
        )];
        let conflict = find_conflict(at(10, 30), at(11, 30), None, &existing);
        assert_eq!(conflict.map(|r| r.id), Some(5));
    }

    #[test]
    fn test_reschedule_excludes_self() {
        let existing = vec![reservation(
            5,
            at(10, 0),
            at(11, 0),
            ReservationStatus::Scheduled,
        )];
        assert!(find_conflict(at(10, 0), at(11, 0), Some(5), &existing).is_none());
        assert!(find_conflict(at(10, 0), at(11, 0), Some(6), &existing).is_some());
    }

    #[test]
    fn test_check_coach_reports_conflict_id() {
        let existing = vec![reservation(
            9,
            at(14, 0),
            at(15, 0),
            ReservationStatus::Scheduled,
        )];
        let err = check_coach(at(14, 30), at(15, 30), None, &existing).unwrap_err();
        assert_eq!(
            err,
            AvailabilityError::CoachBusy {
                conflicting_reservation_id: 9
            }
        );
        assert!(check_coach(at(15, 0), at(16, 0), None, &existing).is_ok());
    }

    #[test]
    fn test_check_equipment_status_gate() {
        let mut unit = Equipment {
            id: 2,
            name: "Rower".into(),
            description: None,
            category: None,
            serial_number: None,
            status: EquipmentStatus::Maintenance,
            purchase_date: None,
            purchase_price: None,
            last_maintenance_date: None,
            next_maintenance_date: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let err = check_equipment(&unit, at(9, 0), at(10, 0), None, &[]).unwrap_err();
        assert_eq!(
            err,
            AvailabilityError::EquipmentNotAvailable {
                status: EquipmentStatus::Maintenance
            }
        );

        // InUse passes the gate; the overlap scan decides contention.
        unit.status = EquipmentStatus::InUse;
        assert!(check_equipment(&unit, at(9, 0), at(10, 0), None, &[]).is_ok());
    }

    #[test]
    fn test_check_equipment_overlap() {
        let unit = Equipment {
            id: 2,
            name: "Rower".into(),
            description: None,
            category: None,
            serial_number: None,
            status: EquipmentStatus::Available,
            purchase_date: None,
            purchase_price: None,
            last_maintenance_date: None,
            next_maintenance_date: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let existing = vec![reservation(
            4,
            at(9, 0),
            at(10, 0),
            ReservationStatus::Scheduled,
        )];
        let err = check_equipment(&unit, at(9, 30), at(10, 30), None, &existing).unwrap_err();
        assert_eq!(
            err,
            AvailabilityError::EquipmentBusy {
                conflicting_reservation_id: 4
            }
        );
        assert!(check_equipment(&unit, at(10, 0), at(11, 0), None, &existing).is_ok());
    }
}
