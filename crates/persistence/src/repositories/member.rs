//! Member repository.

use domain::models::{Member, MemberStats, MemberStatus};
use shared::pagination::PageParams;
use sqlx::PgPool;

use crate::entities::MemberEntity;
use crate::repositories::sort::SortParams;

const MEMBER_COLUMNS: &str = "id, first_name, last_name, email, phone, birth_date, address, \
     emergency_contact, photo, status, notes, created_at, updated_at";

/// Sortable columns for the member list.
pub const MEMBER_SORT_COLUMNS: &[&str] =
    &["first_name", "last_name", "email", "status", "created_at"];

/// Optional filters for the member list endpoint.
#[derive(Debug, Clone, Default)]
pub struct MemberListQuery {
    pub status: Option<MemberStatus>,
    /// Matches first name, last name or email, case-insensitively.
    pub search: Option<String>,
}

/// Column values for creating or updating a member.
#[derive(Debug, Clone)]
pub struct MemberInput {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub birth_date: Option<chrono::NaiveDate>,
    pub address: Option<String>,
    pub emergency_contact: Option<String>,
    pub photo: Option<String>,
    pub status: MemberStatus,
    pub notes: Option<String>,
}

/// Repository for member database operations.
#[derive(Clone)]
pub struct MemberRepository {
    pool: PgPool,
}

impl MemberRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List members with optional status/search filters, newest first.
    pub async fn list(
        &self,
        query: &MemberListQuery,
        sort: &SortParams,
        page: PageParams,
    ) -> Result<(Vec<Member>, i64), sqlx::Error> {
        let mut conditions = vec!["deleted_at IS NULL".to_string()];
        let mut param_count = 0;

        if query.status.is_some() {
            param_count += 1;
            conditions.push(format!("status = ${}", param_count));
        }
        if query.search.is_some() {
            param_count += 1;
            conditions.push(format!(
                "(first_name ILIKE ${n} OR last_name ILIKE ${n} OR email ILIKE ${n})",
                n = param_count
            ));
        }
        let where_clause = conditions.join(" AND ");

        let search_pattern = query.search.as_ref().map(|s| format!("%{}%", s));

        let count_sql = format!("SELECT COUNT(*) FROM members WHERE {}", where_clause);
        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
        if let Some(status) = query.status {
            count_query = count_query.bind(status.as_str());
        }
        if let Some(ref pattern) = search_pattern {
            count_query = count_query.bind(pattern);
        }
        let total = count_query.fetch_one(&self.pool).await?;

        let order_by = sort.order_by(MEMBER_SORT_COLUMNS, "created_at DESC, id DESC");
        let list_sql = format!(
            "SELECT {} FROM members WHERE {} ORDER BY {} LIMIT ${} OFFSET ${}",
            MEMBER_COLUMNS,
            where_clause,
            order_by,
            param_count + 1,
            param_count + 2
        );
        let mut list_query = sqlx::query_as::<_, MemberEntity>(&list_sql);
        if let Some(status) = query.status {
            list_query = list_query.bind(status.as_str());
        }
        if let Some(ref pattern) = search_pattern {
            list_query = list_query.bind(pattern);
        }
        let entities = list_query
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok((entities.into_iter().map(entity_to_domain).collect(), total))
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Member>, sqlx::Error> {
        let entity = sqlx::query_as::<_, MemberEntity>(&format!(
            "SELECT {} FROM members WHERE id = $1 AND deleted_at IS NULL",
            MEMBER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(entity.map(entity_to_domain))
    }

    pub async fn create(&self, input: &MemberInput) -> Result<Member, sqlx::Error> {
        let entity = sqlx::query_as::<_, MemberEntity>(&format!(
            r#"
            INSERT INTO members (
                first_name, last_name, email, phone, birth_date, address,
                emergency_contact, photo, status, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {}
            "#,
            MEMBER_COLUMNS
        ))
        .bind(&input.first_name)
        .bind(&input.last_name)
        .bind(&input.email)
        .bind(&input.phone)
        .bind(input.birth_date)
        .bind(&input.address)
        .bind(&input.emergency_contact)
        .bind(&input.photo)
        .bind(input.status.as_str())
        .bind(&input.notes)
        .fetch_one(&self.pool)
        .await?;

        Ok(entity_to_domain(entity))
    }

    pub async fn update(&self, id: i64, input: &MemberInput) -> Result<Option<Member>, sqlx::Error> {
        let entity = sqlx::query_as::<_, MemberEntity>(&format!(
            r#"
            UPDATE members
            SET first_name = $2, last_name = $3, email = $4, phone = $5,
                birth_date = $6, address = $7, emergency_contact = $8,
                photo = $9, status = $10, notes = $11, updated_at = now()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING {}
            "#,
            MEMBER_COLUMNS
        ))
        .bind(id)
        .bind(&input.first_name)
        .bind(&input.last_name)
        .bind(&input.email)
        .bind(&input.phone)
        .bind(input.birth_date)
        .bind(&input.address)
        .bind(&input.emergency_contact)
        .bind(&input.photo)
        .bind(input.status.as_str())
        .bind(&input.notes)
        .fetch_optional(&self.pool)
        .await?;

        Ok(entity.map(entity_to_domain))
    }

    /// Tombstones the member. Historical subscriptions, reservations and
    /// payments keep their foreign keys.
    pub async fn soft_delete(&self, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE members SET deleted_at = now() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// All active members, for pickers and dropdowns.
    pub async fn list_active(&self) -> Result<Vec<Member>, sqlx::Error> {
        let entities = sqlx::query_as::<_, MemberEntity>(&format!(
            "SELECT {} FROM members WHERE status = 'active' AND deleted_at IS NULL \
             ORDER BY last_name, first_name",
            MEMBER_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(entities.into_iter().map(entity_to_domain).collect())
    }

    pub async fn stats(&self) -> Result<MemberStats, sqlx::Error> {
        let row: (i64, i64, i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*),
                COUNT(*) FILTER (WHERE status = 'active'),
                COUNT(*) FILTER (WHERE status = 'inactive'),
                COUNT(*) FILTER (WHERE status = 'pending'),
                COUNT(*) FILTER (WHERE created_at >= date_trunc('month', now()))
            FROM members
            WHERE deleted_at IS NULL
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(MemberStats {
            total: row.0,
            active: row.1,
            inactive: row.2,
            pending: row.3,
            new_this_month: row.4,
        })
    }
}

fn entity_to_domain(entity: MemberEntity) -> Member {
    Member {
        id: entity.id,
        first_name: entity.first_name,
        last_name: entity.last_name,
        email: entity.email,
        phone: entity.phone,
        birth_date: entity.birth_date,
        address: entity.address,
        emergency_contact: entity.emergency_contact,
        photo: entity.photo,
        status: entity
            .status
            .parse::<MemberStatus>()
            .unwrap_or(MemberStatus::Pending),
        notes: entity.notes,
        created_at: entity.created_at,
        updated_at: entity.updated_at,
    }
}
