//! Reservation repository.
//!
//! Booking and rescheduling run inside a single transaction that locks the
//! competing rows with `SELECT ... FOR UPDATE` before the overlap check, so
//! two concurrent requests for the same coach or unit serialize instead of
//! double-booking. Equipment units are locked in ascending id order.

use chrono::{DateTime, NaiveDate, Utc};
use domain::models::{Reservation, ReservationDetails, ReservationStats, ReservationStatus};
use domain::services::availability::{self, AvailabilityError};
use shared::pagination::PageParams;
use sqlx::{PgPool, Postgres, Transaction};

use crate::entities::{ReservationDetailsEntity, ReservationEntity};
use crate::repositories::equipment;

const RESERVATION_COLUMNS: &str = "id, member_id, coach_id, service_id, \
     start_time, end_time, status, notes, created_at, updated_at";

const DETAILS_SELECT: &str = r#"
    SELECT r.id, r.member_id, r.coach_id, r.service_id,
           r.start_time, r.end_time, r.status, r.notes, r.created_at, r.updated_at,
           m.first_name || ' ' || m.last_name AS member_name,
           u.name AS coach_name,
           s.name AS service_name,
           COALESCE(array_agg(e.id ORDER BY e.id) FILTER (WHERE e.id IS NOT NULL), '{}') AS equipment_ids,
           COALESCE(array_agg(e.name ORDER BY e.id) FILTER (WHERE e.id IS NOT NULL), '{}') AS equipment_names
    FROM reservations r
    JOIN members m ON m.id = r.member_id
    LEFT JOIN users u ON u.id = r.coach_id
    JOIN services s ON s.id = r.service_id
    LEFT JOIN reservation_equipment re ON re.reservation_id = r.id
    LEFT JOIN equipment e ON e.id = re.equipment_id
"#;

const DETAILS_GROUP_BY: &str =
    "GROUP BY r.id, m.first_name, m.last_name, u.name, s.name";

/// Why a booking or reschedule was rejected.
#[derive(Debug)]
pub enum BookingError {
    /// Coach or equipment is taken, or the unit is not bookable.
    Unavailable(AvailabilityError),
    /// A referenced row does not exist (member, coach, service or equipment).
    MissingReference(&'static str),
    /// The referenced user is not a coach.
    NotACoach,
    /// The reservation is already in a terminal state.
    TerminalState(ReservationStatus),
    Database(sqlx::Error),
}

impl From<sqlx::Error> for BookingError {
    fn from(err: sqlx::Error) -> Self {
        BookingError::Database(err)
    }
}

/// Optional filters for the reservation list endpoint.
#[derive(Debug, Clone, Default)]
pub struct ReservationListQuery {
    pub status: Option<ReservationStatus>,
    pub coach_id: Option<i64>,
    pub member_id: Option<i64>,
    pub date: Option<NaiveDate>,
}

/// Column values for creating or rescheduling a reservation.
#[derive(Debug, Clone)]
pub struct ReservationInput {
    pub member_id: i64,
    pub coach_id: Option<i64>,
    pub service_id: i64,
    pub equipment_ids: Vec<i64>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub notes: Option<String>,
}

/// Repository for reservation database operations.
#[derive(Clone)]
pub struct ReservationRepository {
    pool: PgPool,
}

impl ReservationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List reservations with optional filters, soonest first.
    pub async fn list(
        &self,
        query: &ReservationListQuery,
        page: PageParams,
    ) -> Result<(Vec<ReservationDetails>, i64), sqlx::Error> {
        let mut conditions = vec!["r.deleted_at IS NULL".to_string()];
        let mut param_count = 0;

        if query.status.is_some() {
            param_count += 1;
            conditions.push(format!("r.status = ${}", param_count));
        }
        if query.coach_id.is_some() {
            param_count += 1;
            conditions.push(format!("r.coach_id = ${}", param_count));
        }
        if query.member_id.is_some() {
            param_count += 1;
            conditions.push(format!("r.member_id = ${}", param_count));
        }
        if query.date.is_some() {
            param_count += 1;
            conditions.push(format!("r.start_time::date = ${}", param_count));
        }
        let where_clause = conditions.join(" AND ");

        macro_rules! bind_filters {
            ($builder:expr) => {{
                let mut b = $builder;
                if let Some(status) = query.status {
                    b = b.bind(status.as_str());
                }
                if let Some(coach_id) = query.coach_id {
                    b = b.bind(coach_id);
                }
                if let Some(member_id) = query.member_id {
                    b = b.bind(member_id);
                }
                if let Some(date) = query.date {
                    b = b.bind(date);
                }
                b
            }};
        }

        let count_sql = format!(
            "SELECT COUNT(*) FROM reservations r WHERE {}",
            where_clause
        );
        let count_query = bind_filters!(sqlx::query_scalar::<_, i64>(&count_sql));
        let total = count_query.fetch_one(&self.pool).await?;

        let list_sql = format!(
            "{} WHERE {} {} ORDER BY r.start_time LIMIT ${} OFFSET ${}",
            DETAILS_SELECT,
            where_clause,
            DETAILS_GROUP_BY,
            param_count + 1,
            param_count + 2
        );
        let list_query = bind_filters!(sqlx::query_as::<_, ReservationDetailsEntity>(&list_sql));
        let entities = list_query
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok((
            entities.into_iter().map(details_to_domain).collect(),
            total,
        ))
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<ReservationDetails>, sqlx::Error> {
        let entity = sqlx::query_as::<_, ReservationDetailsEntity>(&format!(
            "{} WHERE r.id = $1 AND r.deleted_at IS NULL {}",
            DETAILS_SELECT, DETAILS_GROUP_BY
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(entity.map(details_to_domain))
    }

    /// Full booking history for one member, newest first. Used by the
    /// member detail view.
    pub async fn list_for_member(
        &self,
        member_id: i64,
    ) -> Result<Vec<ReservationDetails>, sqlx::Error> {
        let entities = sqlx::query_as::<_, ReservationDetailsEntity>(&format!(
            "{} WHERE r.member_id = $1 AND r.deleted_at IS NULL \
             {} ORDER BY r.start_time DESC",
            DETAILS_SELECT, DETAILS_GROUP_BY
        ))
        .bind(member_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entities.into_iter().map(details_to_domain).collect())
    }

    /// Books a new reservation.
    ///
    /// Validates the references, locks and checks the coach's and every
    /// requested unit's schedule, inserts the row, attaches the units and
    /// flips them to `in_use`, all in one transaction. Any failure aborts
    /// the whole booking.
    pub async fn create(&self, input: &ReservationInput) -> Result<Reservation, BookingError> {
        let mut tx = self.pool.begin().await?;

        check_references(&mut tx, input).await?;
        check_availability(&mut tx, input, None).await?;

        let entity = sqlx::query_as::<_, ReservationEntity>(&format!(
            r#"
            INSERT INTO reservations (
                member_id, coach_id, service_id,
                start_time, end_time, status, notes
            )
            VALUES ($1, $2, $3, $4, $5, 'scheduled', $6)
            RETURNING {}
            "#,
            RESERVATION_COLUMNS
        ))
        .bind(input.member_id)
        .bind(input.coach_id)
        .bind(input.service_id)
        .bind(input.start_time)
        .bind(input.end_time)
        .bind(&input.notes)
        .fetch_one(&mut *tx)
        .await?;

        attach_equipment(&mut tx, entity.id, &input.equipment_ids).await?;

        tx.commit().await?;
        Ok(entity_to_domain(entity, sorted_ids(&input.equipment_ids)))
    }

    /// Reschedules an existing reservation, re-running the availability
    /// checks with the reservation itself excluded. A changed equipment
    /// set releases the dropped units and attaches the added ones.
    pub async fn update(
        &self,
        id: i64,
        input: &ReservationInput,
    ) -> Result<Option<Reservation>, BookingError> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, ReservationEntity>(&format!(
            "SELECT {} FROM reservations WHERE id = $1 AND deleted_at IS NULL FOR UPDATE",
            RESERVATION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let current = match current {
            Some(current) => current,
            None => return Ok(None),
        };

        let status = current
            .status
            .parse::<ReservationStatus>()
            .unwrap_or(ReservationStatus::Scheduled);
        if status.is_terminal() {
            return Err(BookingError::TerminalState(status));
        }

        check_references(&mut tx, input).await?;
        check_availability(&mut tx, input, Some(id)).await?;

        let entity = sqlx::query_as::<_, ReservationEntity>(&format!(
            r#"
            UPDATE reservations
            SET member_id = $2, coach_id = $3, service_id = $4,
                start_time = $5, end_time = $6, notes = $7, updated_at = now()
            WHERE id = $1
            RETURNING {}
            "#,
            RESERVATION_COLUMNS
        ))
        .bind(id)
        .bind(input.member_id)
        .bind(input.coach_id)
        .bind(input.service_id)
        .bind(input.start_time)
        .bind(input.end_time)
        .bind(&input.notes)
        .fetch_one(&mut *tx)
        .await?;

        let attached = attached_equipment(&mut tx, id).await?;
        let new_set = sorted_ids(&input.equipment_ids);

        for &old_id in attached.iter().filter(|id| !new_set.contains(id)) {
            detach_unit(&mut tx, id, old_id).await?;
            release_if_unused(&mut tx, old_id, id).await?;
        }
        let added: Vec<i64> = new_set
            .iter()
            .copied()
            .filter(|id| !attached.contains(id))
            .collect();
        attach_equipment(&mut tx, id, &added).await?;

        tx.commit().await?;
        Ok(Some(entity_to_domain(entity, new_set)))
    }

    /// Moves a scheduled reservation into a terminal state and releases
    /// its equipment holds. The join rows stay, so the booking's history
    /// still shows what it used. Terminal reservations cannot change
    /// state again.
    pub async fn set_status(
        &self,
        id: i64,
        status: ReservationStatus,
    ) -> Result<Option<Reservation>, BookingError> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, ReservationEntity>(&format!(
            "SELECT {} FROM reservations WHERE id = $1 AND deleted_at IS NULL FOR UPDATE",
            RESERVATION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let current = match current {
            Some(current) => current,
            None => return Ok(None),
        };

        let current_status = current
            .status
            .parse::<ReservationStatus>()
            .unwrap_or(ReservationStatus::Scheduled);
        if current_status.is_terminal() && status != current_status {
            return Err(BookingError::TerminalState(current_status));
        }

        let entity = sqlx::query_as::<_, ReservationEntity>(&format!(
            "UPDATE reservations SET status = $2, updated_at = now() WHERE id = $1 RETURNING {}",
            RESERVATION_COLUMNS
        ))
        .bind(id)
        .bind(status.as_str())
        .fetch_one(&mut *tx)
        .await?;

        let attached = attached_equipment(&mut tx, id).await?;
        if status.is_terminal() {
            for &equipment_id in &attached {
                release_if_unused(&mut tx, equipment_id, id).await?;
            }
        }

        tx.commit().await?;
        Ok(Some(entity_to_domain(entity, attached)))
    }

    /// Tombstones the reservation, detaching and releasing its equipment.
    pub async fn soft_delete(&self, id: i64) -> Result<bool, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query(
            "UPDATE reservations SET deleted_at = now() \
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected()
            > 0;

        if deleted {
            let attached = attached_equipment(&mut tx, id).await?;
            for &equipment_id in &attached {
                detach_unit(&mut tx, id, equipment_id).await?;
                release_if_unused(&mut tx, equipment_id, id).await?;
            }
        }

        tx.commit().await?;
        Ok(deleted)
    }

    /// Reservations overlapping `[from, to)`, for the calendar view.
    pub async fn calendar_events(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<ReservationDetails>, sqlx::Error> {
        let entities = sqlx::query_as::<_, ReservationDetailsEntity>(&format!(
            "{} WHERE r.start_time < $2 AND r.end_time > $1 AND r.deleted_at IS NULL \
             {} ORDER BY r.start_time",
            DETAILS_SELECT, DETAILS_GROUP_BY
        ))
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(entities.into_iter().map(details_to_domain).collect())
    }

    /// The next `limit` scheduled reservations, optionally scoped to one
    /// coach and optionally capped to those starting before `until`.
    pub async fn list_upcoming(
        &self,
        coach_id: Option<i64>,
        until: Option<DateTime<Utc>>,
        limit: i64,
    ) -> Result<Vec<ReservationDetails>, sqlx::Error> {
        let mut conditions = vec![
            "r.start_time >= now()".to_string(),
            "r.status = 'scheduled'".to_string(),
            "r.deleted_at IS NULL".to_string(),
        ];
        let mut param_count = 0;

        if coach_id.is_some() {
            param_count += 1;
            conditions.push(format!("r.coach_id = ${}", param_count));
        }
        if until.is_some() {
            param_count += 1;
            conditions.push(format!("r.start_time < ${}", param_count));
        }

        let sql = format!(
            "{} WHERE {} {} ORDER BY r.start_time LIMIT ${}",
            DETAILS_SELECT,
            conditions.join(" AND "),
            DETAILS_GROUP_BY,
            param_count + 1
        );

        let mut query = sqlx::query_as::<_, ReservationDetailsEntity>(&sql);
        if let Some(coach_id) = coach_id {
            query = query.bind(coach_id);
        }
        if let Some(until) = until {
            query = query.bind(until);
        }
        let entities = query.bind(limit).fetch_all(&self.pool).await?;

        Ok(entities.into_iter().map(details_to_domain).collect())
    }

    pub async fn stats(&self) -> Result<ReservationStats, sqlx::Error> {
        let row: (i64, i64, i64, i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*),
                COUNT(*) FILTER (WHERE status = 'scheduled'),
                COUNT(*) FILTER (WHERE status = 'completed'),
                COUNT(*) FILTER (WHERE status = 'cancelled'),
                COUNT(*) FILTER (WHERE status = 'no_show'),
                COUNT(*) FILTER (WHERE start_time::date = CURRENT_DATE)
            FROM reservations
            WHERE deleted_at IS NULL
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(ReservationStats {
            total: row.0,
            scheduled: row.1,
            completed: row.2,
            cancelled: row.3,
            no_show: row.4,
            today: row.5,
        })
    }
}

/// Rejects bookings that point at missing rows: a deleted member, an
/// inactive coach account, an unknown service.
async fn check_references(
    tx: &mut Transaction<'_, Postgres>,
    input: &ReservationInput,
) -> Result<(), BookingError> {
    let member_exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM members WHERE id = $1 AND deleted_at IS NULL)",
    )
    .bind(input.member_id)
    .fetch_one(&mut **tx)
    .await?;
    if !member_exists {
        return Err(BookingError::MissingReference("member"));
    }

    if let Some(coach_id) = input.coach_id {
        // Locking the user row serializes concurrent bookings of the same
        // coach: the overlap scan alone locks nothing when the coach has no
        // existing reservations in the window.
        let coach_role = sqlx::query_scalar::<_, String>(
            "SELECT role FROM users WHERE id = $1 AND is_active AND deleted_at IS NULL FOR UPDATE",
        )
        .bind(coach_id)
        .fetch_optional(&mut **tx)
        .await?;
        match coach_role.as_deref() {
            None => return Err(BookingError::MissingReference("coach")),
            Some("coach") => {}
            Some(_) => return Err(BookingError::NotACoach),
        }
    }

    // Inactive services cannot take new bookings.
    let service_exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM services WHERE id = $1 AND is_active AND deleted_at IS NULL)",
    )
    .bind(input.service_id)
    .fetch_one(&mut **tx)
    .await?;
    if !service_exists {
        return Err(BookingError::MissingReference("service"));
    }

    Ok(())
}

/// Runs the overlap checks under row locks. Equipment serializes on the
/// unit row itself, the coach leg on the user row taken in
/// `check_references`; the overlapping reservations are locked too so a
/// concurrent cancel cannot free a slot mid-check. First failure aborts;
/// the caller rolls back the whole booking.
async fn check_availability(
    tx: &mut Transaction<'_, Postgres>,
    input: &ReservationInput,
    exclude_id: Option<i64>,
) -> Result<(), BookingError> {
    if let Some(coach_id) = input.coach_id {
        let coach_schedule = sqlx::query_as::<_, ReservationEntity>(&format!(
            r#"
            SELECT {} FROM reservations
            WHERE coach_id = $1 AND status = 'scheduled' AND deleted_at IS NULL
              AND start_time < $3 AND end_time > $2
            FOR UPDATE
            "#,
            RESERVATION_COLUMNS
        ))
        .bind(coach_id)
        .bind(input.start_time)
        .bind(input.end_time)
        .fetch_all(&mut **tx)
        .await?;

        let coach_schedule: Vec<Reservation> = coach_schedule
            .into_iter()
            .map(|e| entity_to_domain(e, Vec::new()))
            .collect();
        availability::check_coach(input.start_time, input.end_time, exclude_id, &coach_schedule)
            .map_err(BookingError::Unavailable)?;
    }

    for equipment_id in sorted_ids(&input.equipment_ids) {
        let unit = sqlx::query_as::<_, crate::entities::EquipmentEntity>(
            r#"
            SELECT id, name, description, category, serial_number, status,
                   purchase_date, purchase_price,
                   last_maintenance_date, next_maintenance_date,
                   created_at, updated_at
            FROM equipment
            WHERE id = $1 AND deleted_at IS NULL
            FOR UPDATE
            "#,
        )
        .bind(equipment_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(BookingError::MissingReference("equipment"))?;

        let unit = equipment::entity_to_domain(unit);

        let unit_schedule = sqlx::query_as::<_, ReservationEntity>(
            r#"
            SELECT r.id, r.member_id, r.coach_id, r.service_id,
                   r.start_time, r.end_time, r.status, r.notes,
                   r.created_at, r.updated_at
            FROM reservations r
            JOIN reservation_equipment re ON re.reservation_id = r.id
            WHERE re.equipment_id = $1 AND r.status = 'scheduled'
              AND r.deleted_at IS NULL
              AND r.start_time < $3 AND r.end_time > $2
            FOR UPDATE OF r
            "#,
        )
        .bind(equipment_id)
        .bind(input.start_time)
        .bind(input.end_time)
        .fetch_all(&mut **tx)
        .await?;

        let unit_schedule: Vec<Reservation> = unit_schedule
            .into_iter()
            .map(|e| entity_to_domain(e, Vec::new()))
            .collect();
        availability::check_equipment(
            &unit,
            input.start_time,
            input.end_time,
            exclude_id,
            &unit_schedule,
        )
        .map_err(BookingError::Unavailable)?;
    }

    Ok(())
}

/// Ids of the units currently attached to the reservation, ascending.
async fn attached_equipment(
    tx: &mut Transaction<'_, Postgres>,
    reservation_id: i64,
) -> Result<Vec<i64>, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT equipment_id FROM reservation_equipment \
         WHERE reservation_id = $1 ORDER BY equipment_id",
    )
    .bind(reservation_id)
    .fetch_all(&mut **tx)
    .await
}

/// Inserts the join rows and flips each unit to `in_use`.
async fn attach_equipment(
    tx: &mut Transaction<'_, Postgres>,
    reservation_id: i64,
    equipment_ids: &[i64],
) -> Result<(), sqlx::Error> {
    if equipment_ids.is_empty() {
        return Ok(());
    }

    sqlx::query(
        "INSERT INTO reservation_equipment (reservation_id, equipment_id) \
         SELECT $1, unnest($2::bigint[])",
    )
    .bind(reservation_id)
    .bind(equipment_ids)
    .execute(&mut **tx)
    .await?;

    sqlx::query(
        "UPDATE equipment SET status = 'in_use', updated_at = now() \
         WHERE id = ANY($1) AND status = 'available'",
    )
    .bind(equipment_ids)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// Join rows are hard-deleted on detach; the reservation row keeps the
/// booking history.
async fn detach_unit(
    tx: &mut Transaction<'_, Postgres>,
    reservation_id: i64,
    equipment_id: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "DELETE FROM reservation_equipment \
         WHERE reservation_id = $1 AND equipment_id = $2",
    )
    .bind(reservation_id)
    .bind(equipment_id)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// Releases the unit back to `available` unless another scheduled
/// reservation still holds it.
async fn release_if_unused(
    tx: &mut Transaction<'_, Postgres>,
    equipment_id: i64,
    current_reservation_id: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE equipment SET status = 'available', updated_at = now()
        WHERE id = $1 AND status = 'in_use'
          AND NOT EXISTS (
              SELECT 1 FROM reservation_equipment re
              JOIN reservations r ON r.id = re.reservation_id
              WHERE re.equipment_id = $1 AND r.status = 'scheduled'
                AND r.deleted_at IS NULL AND r.id <> $2
          )
        "#,
    )
    .bind(equipment_id)
    .bind(current_reservation_id)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

fn sorted_ids(ids: &[i64]) -> Vec<i64> {
    let mut ids = ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    ids
}

fn entity_to_domain(entity: ReservationEntity, equipment_ids: Vec<i64>) -> Reservation {
    Reservation {
        id: entity.id,
        member_id: entity.member_id,
        coach_id: entity.coach_id,
        service_id: entity.service_id,
        equipment_ids,
        start_time: entity.start_time,
        end_time: entity.end_time,
        status: entity
            .status
            .parse::<ReservationStatus>()
            .unwrap_or(ReservationStatus::Scheduled),
        notes: entity.notes,
        created_at: entity.created_at,
        updated_at: entity.updated_at,
    }
}

pub(crate) fn details_to_domain(entity: ReservationDetailsEntity) -> ReservationDetails {
    ReservationDetails {
        reservation: Reservation {
            id: entity.id,
            member_id: entity.member_id,
            coach_id: entity.coach_id,
            service_id: entity.service_id,
            equipment_ids: entity.equipment_ids,
            start_time: entity.start_time,
            end_time: entity.end_time,
            status: entity
                .status
                .parse::<ReservationStatus>()
                .unwrap_or(ReservationStatus::Scheduled),
            notes: entity.notes,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        },
        member_name: entity.member_name,
        coach_name: entity.coach_name,
        service_name: entity.service_name,
        equipment_names: entity.equipment_names,
    }
}
