//! Equipment repository.

use chrono::NaiveDate;
use domain::models::{Equipment, EquipmentStatus};
use rust_decimal::Decimal;
use shared::pagination::PageParams;
use sqlx::PgPool;

use crate::entities::EquipmentEntity;
use crate::repositories::sort::SortParams;

const EQUIPMENT_COLUMNS: &str = "id, name, description, category, serial_number, status, \
     purchase_date, purchase_price, last_maintenance_date, next_maintenance_date, \
     created_at, updated_at";

/// Sortable columns for the equipment list.
pub const EQUIPMENT_SORT_COLUMNS: &[&str] =
    &["name", "category", "status", "purchase_date", "next_maintenance_date", "created_at"];

/// Optional filters for the equipment list endpoint.
#[derive(Debug, Clone, Default)]
pub struct EquipmentListQuery {
    pub status: Option<EquipmentStatus>,
    pub search: Option<String>,
}

/// Column values for creating or updating a piece of equipment.
#[derive(Debug, Clone)]
pub struct EquipmentInput {
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub serial_number: Option<String>,
    pub status: EquipmentStatus,
    pub purchase_date: Option<NaiveDate>,
    pub purchase_price: Option<Decimal>,
    pub last_maintenance_date: Option<NaiveDate>,
    pub next_maintenance_date: Option<NaiveDate>,
}

/// Repository for equipment database operations.
#[derive(Clone)]
pub struct EquipmentRepository {
    pool: PgPool,
}

impl EquipmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(
        &self,
        query: &EquipmentListQuery,
        sort: &SortParams,
        page: PageParams,
    ) -> Result<(Vec<Equipment>, i64), sqlx::Error> {
        let mut conditions = vec!["deleted_at IS NULL".to_string()];
        let mut param_count = 0;

        if query.status.is_some() {
            param_count += 1;
            conditions.push(format!("status = ${}", param_count));
        }
        if query.search.is_some() {
            param_count += 1;
            conditions.push(format!(
                "(name ILIKE ${0} OR category ILIKE ${0} OR serial_number ILIKE ${0})",
                param_count
            ));
        }
        let where_clause = conditions.join(" AND ");

        macro_rules! bind_filters {
            ($builder:expr) => {{
                let mut b = $builder;
                if let Some(status) = query.status {
                    b = b.bind(status.as_str());
                }
                if let Some(search) = &query.search {
                    b = b.bind(format!("%{}%", search));
                }
                b
            }};
        }

        let count_sql = format!("SELECT COUNT(*) FROM equipment WHERE {}", where_clause);
        let total = bind_filters!(sqlx::query_scalar::<_, i64>(&count_sql))
            .fetch_one(&self.pool)
            .await?;

        let order_by = sort.order_by(EQUIPMENT_SORT_COLUMNS, "name");
        let list_sql = format!(
            "SELECT {} FROM equipment WHERE {} ORDER BY {} LIMIT ${} OFFSET ${}",
            EQUIPMENT_COLUMNS,
            where_clause,
            order_by,
            param_count + 1,
            param_count + 2
        );
        let entities = bind_filters!(sqlx::query_as::<_, EquipmentEntity>(&list_sql))
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok((entities.into_iter().map(entity_to_domain).collect(), total))
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Equipment>, sqlx::Error> {
        let entity = sqlx::query_as::<_, EquipmentEntity>(&format!(
            "SELECT {} FROM equipment WHERE id = $1 AND deleted_at IS NULL",
            EQUIPMENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(entity.map(entity_to_domain))
    }

    pub async fn create(&self, input: &EquipmentInput) -> Result<Equipment, sqlx::Error> {
        let entity = sqlx::query_as::<_, EquipmentEntity>(&format!(
            r#"
            INSERT INTO equipment (
                name, description, category, serial_number, status,
                purchase_date, purchase_price,
                last_maintenance_date, next_maintenance_date
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {}
            "#,
            EQUIPMENT_COLUMNS
        ))
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.category)
        .bind(&input.serial_number)
        .bind(input.status.as_str())
        .bind(input.purchase_date)
        .bind(input.purchase_price)
        .bind(input.last_maintenance_date)
        .bind(input.next_maintenance_date)
        .fetch_one(&self.pool)
        .await?;

        Ok(entity_to_domain(entity))
    }

    /// Updates a unit. Moving it from `maintenance` back to `available`
    /// stamps `last_maintenance_date` with today and schedules the next
    /// maintenance three months out, overriding the caller's dates.
    pub async fn update(
        &self,
        id: i64,
        input: &EquipmentInput,
    ) -> Result<Option<Equipment>, sqlx::Error> {
        // `status` on the right-hand side is the pre-update value.
        let entity = sqlx::query_as::<_, EquipmentEntity>(&format!(
            r#"
            UPDATE equipment
            SET name = $2, description = $3, category = $4, serial_number = $5,
                last_maintenance_date = CASE
                    WHEN status = 'maintenance' AND $6 = 'available' THEN CURRENT_DATE
                    ELSE $8
                END,
                next_maintenance_date = CASE
                    WHEN status = 'maintenance' AND $6 = 'available'
                        THEN (CURRENT_DATE + INTERVAL '3 months')::date
                    ELSE $9
                END,
                status = $6, purchase_date = $7, purchase_price = $10,
                updated_at = now()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING {}
            "#,
            EQUIPMENT_COLUMNS
        ))
        .bind(id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.category)
        .bind(&input.serial_number)
        .bind(input.status.as_str())
        .bind(input.purchase_date)
        .bind(input.last_maintenance_date)
        .bind(input.next_maintenance_date)
        .bind(input.purchase_price)
        .fetch_optional(&self.pool)
        .await?;

        Ok(entity.map(entity_to_domain))
    }

    pub async fn soft_delete(&self, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE equipment SET deleted_at = now() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Whether scheduled reservations still hold this unit. Such a unit
    /// cannot be deleted.
    pub async fn has_upcoming_reservations(&self, id: i64) -> Result<bool, sqlx::Error> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM reservation_equipment re
            JOIN reservations r ON r.id = re.reservation_id
            WHERE re.equipment_id = $1 AND r.status = 'scheduled'
              AND r.start_time >= now() AND r.deleted_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }

    /// Units in the `available` state, for the booking form.
    pub async fn list_available(&self) -> Result<Vec<Equipment>, sqlx::Error> {
        let entities = sqlx::query_as::<_, EquipmentEntity>(&format!(
            "SELECT {} FROM equipment WHERE status = 'available' AND deleted_at IS NULL \
             ORDER BY name",
            EQUIPMENT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(entities.into_iter().map(entity_to_domain).collect())
    }

    /// Units whose next maintenance date has passed (or is today).
    pub async fn list_maintenance_due(&self) -> Result<Vec<Equipment>, sqlx::Error> {
        let entities = sqlx::query_as::<_, EquipmentEntity>(&format!(
            "SELECT {} FROM equipment \
             WHERE next_maintenance_date <= CURRENT_DATE AND deleted_at IS NULL \
             ORDER BY next_maintenance_date",
            EQUIPMENT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(entities.into_iter().map(entity_to_domain).collect())
    }
}

pub(crate) fn entity_to_domain(entity: EquipmentEntity) -> Equipment {
    Equipment {
        id: entity.id,
        name: entity.name,
        description: entity.description,
        category: entity.category,
        serial_number: entity.serial_number,
        status: entity
            .status
            .parse::<EquipmentStatus>()
            .unwrap_or(EquipmentStatus::OutOfService),
        purchase_date: entity.purchase_date,
        purchase_price: entity.purchase_price,
        last_maintenance_date: entity.last_maintenance_date,
        next_maintenance_date: entity.next_maintenance_date,
        created_at: entity.created_at,
        updated_at: entity.updated_at,
    }
}
