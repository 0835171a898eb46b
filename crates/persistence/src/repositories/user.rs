//! Staff account repository.

use domain::models::{Role, User};
use shared::pagination::PageParams;
use sqlx::PgPool;

use crate::entities::UserEntity;
use crate::repositories::sort::SortParams;

const USER_COLUMNS: &str =
    "id, name, email, password_hash, role, phone, specialty, is_active, created_at, updated_at";

/// Sortable columns for the staff list.
pub const USER_SORT_COLUMNS: &[&str] = &["name", "email", "role", "created_at"];

/// Column values for creating a staff account.
#[derive(Debug, Clone)]
pub struct UserInput {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub phone: Option<String>,
    pub specialty: Option<String>,
    pub is_active: bool,
}

/// Mutable account fields. `password_hash` is only written when set.
#[derive(Debug, Clone)]
pub struct UserUpdate {
    pub name: String,
    pub email: String,
    pub password_hash: Option<String>,
    pub role: Role,
    pub phone: Option<String>,
    pub specialty: Option<String>,
    pub is_active: bool,
}

/// Repository for staff account database operations.
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(
        &self,
        role: Option<Role>,
        search: Option<&str>,
        sort: &SortParams,
        page: PageParams,
    ) -> Result<(Vec<User>, i64), sqlx::Error> {
        let mut conditions = vec!["deleted_at IS NULL".to_string()];
        let mut param_count = 0;

        if role.is_some() {
            param_count += 1;
            conditions.push(format!("role = ${}", param_count));
        }
        if search.is_some() {
            param_count += 1;
            conditions.push(format!(
                "(name ILIKE ${0} OR email ILIKE ${0})",
                param_count
            ));
        }
        let where_clause = conditions.join(" AND ");
        let pattern = search.map(|s| format!("%{}%", s));

        macro_rules! bind_filters {
            ($builder:expr) => {{
                let mut b = $builder;
                if let Some(role) = role {
                    b = b.bind(role.as_str());
                }
                if let Some(ref pattern) = pattern {
                    b = b.bind(pattern);
                }
                b
            }};
        }

        let count_sql = format!("SELECT COUNT(*) FROM users WHERE {}", where_clause);
        let total = bind_filters!(sqlx::query_scalar::<_, i64>(&count_sql))
            .fetch_one(&self.pool)
            .await?;

        let order_by = sort.order_by(USER_SORT_COLUMNS, "name");
        let list_sql = format!(
            "SELECT {} FROM users WHERE {} ORDER BY {} LIMIT ${} OFFSET ${}",
            USER_COLUMNS,
            where_clause,
            order_by,
            param_count + 1,
            param_count + 2
        );
        let entities = bind_filters!(sqlx::query_as::<_, UserEntity>(&list_sql))
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok((entities.into_iter().map(entity_to_domain).collect(), total))
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<User>, sqlx::Error> {
        let entity = sqlx::query_as::<_, UserEntity>(&format!(
            "SELECT {} FROM users WHERE id = $1 AND deleted_at IS NULL",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(entity.map(entity_to_domain))
    }

    /// Case-insensitive email lookup for login.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        let entity = sqlx::query_as::<_, UserEntity>(&format!(
            "SELECT {} FROM users WHERE lower(email) = lower($1) AND deleted_at IS NULL",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(entity.map(entity_to_domain))
    }

    pub async fn create(&self, input: &UserInput) -> Result<User, sqlx::Error> {
        let entity = sqlx::query_as::<_, UserEntity>(&format!(
            r#"
            INSERT INTO users (name, email, password_hash, role, phone, specialty, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(&input.name)
        .bind(&input.email)
        .bind(&input.password_hash)
        .bind(input.role.as_str())
        .bind(&input.phone)
        .bind(&input.specialty)
        .bind(input.is_active)
        .fetch_one(&self.pool)
        .await?;

        Ok(entity_to_domain(entity))
    }

    pub async fn update(&self, id: i64, update: &UserUpdate) -> Result<Option<User>, sqlx::Error> {
        let entity = sqlx::query_as::<_, UserEntity>(&format!(
            r#"
            UPDATE users
            SET name = $2, email = $3, role = $4, phone = $5, specialty = $6,
                is_active = $7, password_hash = COALESCE($8, password_hash),
                updated_at = now()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(id)
        .bind(&update.name)
        .bind(&update.email)
        .bind(update.role.as_str())
        .bind(&update.phone)
        .bind(&update.specialty)
        .bind(update.is_active)
        .bind(&update.password_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(entity.map(entity_to_domain))
    }

    pub async fn soft_delete(&self, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE users SET deleted_at = now() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Whether a coach still has scheduled reservations ahead. Such an
    /// account cannot be deleted.
    pub async fn has_upcoming_reservations(&self, id: i64) -> Result<bool, sqlx::Error> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM reservations
            WHERE coach_id = $1 AND status = 'scheduled'
              AND start_time >= now() AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }

    /// Active coaches, for the booking form.
    pub async fn list_coaches(&self) -> Result<Vec<User>, sqlx::Error> {
        let entities = sqlx::query_as::<_, UserEntity>(&format!(
            "SELECT {} FROM users \
             WHERE role = 'coach' AND is_active AND deleted_at IS NULL ORDER BY name",
            USER_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(entities.into_iter().map(entity_to_domain).collect())
    }
}

fn entity_to_domain(entity: UserEntity) -> User {
    User {
        id: entity.id,
        name: entity.name,
        email: entity.email,
        password_hash: entity.password_hash,
        role: entity.role.parse::<Role>().unwrap_or(Role::Coach),
        phone: entity.phone,
        specialty: entity.specialty,
        is_active: entity.is_active,
        created_at: entity.created_at,
        updated_at: entity.updated_at,
    }
}
