//! Service catalog repository.

use domain::models::Service;
use rust_decimal::Decimal;
use shared::pagination::PageParams;
use sqlx::PgPool;

use crate::entities::ServiceEntity;
use crate::repositories::sort::SortParams;

const SERVICE_COLUMNS: &str =
    "id, name, description, duration_minutes, price, max_capacity, is_active, created_at, updated_at";

/// Sortable columns for the service list.
pub const SERVICE_SORT_COLUMNS: &[&str] =
    &["name", "duration_minutes", "price", "max_capacity", "created_at"];

/// Column values for creating or updating a service.
#[derive(Debug, Clone)]
pub struct ServiceInput {
    pub name: String,
    pub description: Option<String>,
    pub duration_minutes: i32,
    pub price: Decimal,
    pub max_capacity: i32,
    pub is_active: bool,
}

/// Repository for service database operations.
#[derive(Clone)]
pub struct ServiceRepository {
    pool: PgPool,
}

impl ServiceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(
        &self,
        search: Option<&str>,
        sort: &SortParams,
        page: PageParams,
    ) -> Result<(Vec<Service>, i64), sqlx::Error> {
        let mut conditions = vec!["deleted_at IS NULL".to_string()];
        let mut param_count = 0;

        if search.is_some() {
            param_count += 1;
            conditions.push(format!(
                "(name ILIKE ${0} OR description ILIKE ${0})",
                param_count
            ));
        }
        let where_clause = conditions.join(" AND ");
        let pattern = search.map(|s| format!("%{}%", s));

        macro_rules! bind_filters {
            ($builder:expr) => {{
                let mut b = $builder;
                if let Some(ref pattern) = pattern {
                    b = b.bind(pattern);
                }
                b
            }};
        }

        let count_sql = format!("SELECT COUNT(*) FROM services WHERE {}", where_clause);
        let total = bind_filters!(sqlx::query_scalar::<_, i64>(&count_sql))
            .fetch_one(&self.pool)
            .await?;

        let order_by = sort.order_by(SERVICE_SORT_COLUMNS, "name");
        let list_sql = format!(
            "SELECT {} FROM services WHERE {} ORDER BY {} LIMIT ${} OFFSET ${}",
            SERVICE_COLUMNS,
            where_clause,
            order_by,
            param_count + 1,
            param_count + 2
        );
        let entities = bind_filters!(sqlx::query_as::<_, ServiceEntity>(&list_sql))
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok((entities.into_iter().map(entity_to_domain).collect(), total))
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Service>, sqlx::Error> {
        let entity = sqlx::query_as::<_, ServiceEntity>(&format!(
            "SELECT {} FROM services WHERE id = $1 AND deleted_at IS NULL",
            SERVICE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(entity.map(entity_to_domain))
    }

    pub async fn create(&self, input: &ServiceInput) -> Result<Service, sqlx::Error> {
        let entity = sqlx::query_as::<_, ServiceEntity>(&format!(
            r#"
            INSERT INTO services (name, description, duration_minutes, price, max_capacity, is_active)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            SERVICE_COLUMNS
        ))
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.duration_minutes)
        .bind(input.price)
        .bind(input.max_capacity)
        .bind(input.is_active)
        .fetch_one(&self.pool)
        .await?;

        Ok(entity_to_domain(entity))
    }

    pub async fn update(
        &self,
        id: i64,
        input: &ServiceInput,
    ) -> Result<Option<Service>, sqlx::Error> {
        let entity = sqlx::query_as::<_, ServiceEntity>(&format!(
            r#"
            UPDATE services
            SET name = $2, description = $3, duration_minutes = $4, price = $5,
                max_capacity = $6, is_active = $7, updated_at = now()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING {}
            "#,
            SERVICE_COLUMNS
        ))
        .bind(id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.duration_minutes)
        .bind(input.price)
        .bind(input.max_capacity)
        .bind(input.is_active)
        .fetch_optional(&self.pool)
        .await?;

        Ok(entity.map(entity_to_domain))
    }

    pub async fn soft_delete(&self, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE services SET deleted_at = now() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Whether the service still has scheduled reservations ahead. Such a
    /// service cannot be deleted.
    pub async fn has_upcoming_reservations(&self, id: i64) -> Result<bool, sqlx::Error> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM reservations
            WHERE service_id = $1 AND status = 'scheduled'
              AND start_time >= now() AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }

    /// Active services only, for the booking form.
    pub async fn list_active(&self) -> Result<Vec<Service>, sqlx::Error> {
        let entities = sqlx::query_as::<_, ServiceEntity>(&format!(
            "SELECT {} FROM services WHERE is_active AND deleted_at IS NULL ORDER BY name",
            SERVICE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(entities.into_iter().map(entity_to_domain).collect())
    }
}

fn entity_to_domain(entity: ServiceEntity) -> Service {
    Service {
        id: entity.id,
        name: entity.name,
        description: entity.description,
        duration_minutes: entity.duration_minutes,
        price: entity.price,
        max_capacity: entity.max_capacity,
        is_active: entity.is_active,
        created_at: entity.created_at,
        updated_at: entity.updated_at,
    }
}
