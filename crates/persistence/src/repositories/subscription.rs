//! Subscription repository.

use chrono::NaiveDate;
use domain::models::{Subscription, SubscriptionStatus, SubscriptionType};
use rust_decimal::Decimal;
use shared::pagination::PageParams;
use sqlx::PgPool;

use crate::entities::SubscriptionEntity;
use crate::repositories::sort::SortParams;

const SUBSCRIPTION_COLUMNS: &str = "id, member_id, name, subscription_type, start_date, \
     end_date, price, auto_renewal, status, created_at, updated_at";

/// Sortable columns for the subscription list.
pub const SUBSCRIPTION_SORT_COLUMNS: &[&str] =
    &["name", "start_date", "end_date", "price", "status", "created_at"];

/// Column values for creating or updating a subscription.
#[derive(Debug, Clone)]
pub struct SubscriptionInput {
    pub member_id: i64,
    pub name: String,
    pub subscription_type: SubscriptionType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub price: Decimal,
    pub auto_renewal: bool,
    pub status: SubscriptionStatus,
}

/// Repository for subscription database operations.
#[derive(Clone)]
pub struct SubscriptionRepository {
    pool: PgPool,
}

impl SubscriptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(
        &self,
        status: Option<SubscriptionStatus>,
        member_id: Option<i64>,
        sort: &SortParams,
        page: PageParams,
    ) -> Result<(Vec<Subscription>, i64), sqlx::Error> {
        let mut conditions = vec!["deleted_at IS NULL".to_string()];
        let mut param_count = 0;

        if status.is_some() {
            param_count += 1;
            conditions.push(format!("status = ${}", param_count));
        }
        if member_id.is_some() {
            param_count += 1;
            conditions.push(format!("member_id = ${}", param_count));
        }
        let where_clause = conditions.join(" AND ");

        macro_rules! bind_filters {
            ($builder:expr) => {{
                let mut b = $builder;
                if let Some(status) = status {
                    b = b.bind(status.as_str());
                }
                if let Some(member_id) = member_id {
                    b = b.bind(member_id);
                }
                b
            }};
        }

        let count_sql = format!("SELECT COUNT(*) FROM subscriptions WHERE {}", where_clause);
        let total = bind_filters!(sqlx::query_scalar::<_, i64>(&count_sql))
            .fetch_one(&self.pool)
            .await?;

        let order_by = sort.order_by(SUBSCRIPTION_SORT_COLUMNS, "end_date DESC, id DESC");
        let list_sql = format!(
            "SELECT {} FROM subscriptions WHERE {} ORDER BY {} LIMIT ${} OFFSET ${}",
            SUBSCRIPTION_COLUMNS,
            where_clause,
            order_by,
            param_count + 1,
            param_count + 2
        );
        let entities = bind_filters!(sqlx::query_as::<_, SubscriptionEntity>(&list_sql))
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok((entities.into_iter().map(entity_to_domain).collect(), total))
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Subscription>, sqlx::Error> {
        let entity = sqlx::query_as::<_, SubscriptionEntity>(&format!(
            "SELECT {} FROM subscriptions WHERE id = $1 AND deleted_at IS NULL",
            SUBSCRIPTION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(entity.map(entity_to_domain))
    }

    pub async fn create(&self, input: &SubscriptionInput) -> Result<Subscription, sqlx::Error> {
        let entity = sqlx::query_as::<_, SubscriptionEntity>(&format!(
            r#"
            INSERT INTO subscriptions (
                member_id, name, subscription_type, start_date, end_date,
                price, auto_renewal, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            SUBSCRIPTION_COLUMNS
        ))
        .bind(input.member_id)
        .bind(&input.name)
        .bind(input.subscription_type.as_str())
        .bind(input.start_date)
        .bind(input.end_date)
        .bind(input.price)
        .bind(input.auto_renewal)
        .bind(input.status.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(entity_to_domain(entity))
    }

    pub async fn update(
        &self,
        id: i64,
        input: &SubscriptionInput,
    ) -> Result<Option<Subscription>, sqlx::Error> {
        let entity = sqlx::query_as::<_, SubscriptionEntity>(&format!(
            r#"
            UPDATE subscriptions
            SET member_id = $2, name = $3, subscription_type = $4, start_date = $5,
                end_date = $6, price = $7, auto_renewal = $8, status = $9,
                updated_at = now()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING {}
            "#,
            SUBSCRIPTION_COLUMNS
        ))
        .bind(id)
        .bind(input.member_id)
        .bind(&input.name)
        .bind(input.subscription_type.as_str())
        .bind(input.start_date)
        .bind(input.end_date)
        .bind(input.price)
        .bind(input.auto_renewal)
        .bind(input.status.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(entity.map(entity_to_domain))
    }

    pub async fn soft_delete(&self, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE subscriptions SET deleted_at = now() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Active subscriptions ending within the next `days` days.
    pub async fn list_expiring(&self, days: i32) -> Result<Vec<Subscription>, sqlx::Error> {
        let entities = sqlx::query_as::<_, SubscriptionEntity>(&format!(
            r#"
            SELECT {} FROM subscriptions
            WHERE status = 'active' AND deleted_at IS NULL
              AND end_date >= CURRENT_DATE
              AND end_date <= CURRENT_DATE + make_interval(days => $1)
            ORDER BY end_date
            "#,
            SUBSCRIPTION_COLUMNS
        ))
        .bind(days)
        .fetch_all(&self.pool)
        .await?;

        Ok(entities.into_iter().map(entity_to_domain).collect())
    }

    /// Full subscription history for one member, newest first.
    pub async fn list_for_member(&self, member_id: i64) -> Result<Vec<Subscription>, sqlx::Error> {
        let entities = sqlx::query_as::<_, SubscriptionEntity>(&format!(
            "SELECT {} FROM subscriptions WHERE member_id = $1 AND deleted_at IS NULL \
             ORDER BY start_date DESC",
            SUBSCRIPTION_COLUMNS
        ))
        .bind(member_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entities.into_iter().map(entity_to_domain).collect())
    }
}

fn entity_to_domain(entity: SubscriptionEntity) -> Subscription {
    Subscription {
        id: entity.id,
        member_id: entity.member_id,
        name: entity.name,
        subscription_type: entity
            .subscription_type
            .parse::<SubscriptionType>()
            .unwrap_or(SubscriptionType::Monthly),
        start_date: entity.start_date,
        end_date: entity.end_date,
        price: entity.price,
        auto_renewal: entity.auto_renewal,
        status: entity
            .status
            .parse::<SubscriptionStatus>()
            .unwrap_or(SubscriptionStatus::Active),
        created_at: entity.created_at,
        updated_at: entity.updated_at,
    }
}
