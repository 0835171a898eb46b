//! Payment repository.
//!
//! Payment status drives the linked subscription: a payment marked `paid`
//! re-activates it, while a cancellation or refund pushes it to
//! `cancelled` only when no other paid payment still covers it. Both the
//! payment write and the subscription write happen in one transaction.

use chrono::NaiveDate;
use domain::models::{
    FinancialStats, MethodRevenue, MonthlyRevenue, Payment, PaymentInvoice, PaymentMethod,
    PaymentStatus, StatusTotal,
};
use domain::services::invoice;
use rust_decimal::Decimal;
use shared::pagination::PageParams;
use sqlx::{PgPool, Postgres, Transaction};

use crate::entities::PaymentEntity;
use crate::repositories::sort::SortParams;

const PAYMENT_COLUMNS: &str = "id, member_id, subscription_id, amount, payment_method, \
     payment_date, status, invoice_number, notes, created_at, updated_at";

/// Sortable columns for the payment list.
pub const PAYMENT_SORT_COLUMNS: &[&str] =
    &["payment_date", "amount", "status", "invoice_number", "created_at"];

/// Optional filters for the payment list endpoint.
#[derive(Debug, Clone, Default)]
pub struct PaymentListQuery {
    pub status: Option<PaymentStatus>,
    pub member_id: Option<i64>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// Column values for recording a payment. The invoice number is allocated
/// by the repository, not the caller.
#[derive(Debug, Clone)]
pub struct PaymentInput {
    pub member_id: i64,
    pub subscription_id: Option<i64>,
    pub amount: Decimal,
    pub payment_method: PaymentMethod,
    pub payment_date: NaiveDate,
    pub status: PaymentStatus,
    pub notes: Option<String>,
}

/// Mutable payment fields for the update endpoint.
#[derive(Debug, Clone)]
pub struct PaymentUpdate {
    pub amount: Decimal,
    pub payment_method: PaymentMethod,
    pub payment_date: NaiveDate,
    pub status: PaymentStatus,
    pub notes: Option<String>,
}

/// Repository for payment database operations.
#[derive(Clone)]
pub struct PaymentRepository {
    pool: PgPool,
}

impl PaymentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(
        &self,
        query: &PaymentListQuery,
        sort: &SortParams,
        page: PageParams,
    ) -> Result<(Vec<Payment>, i64), sqlx::Error> {
        let mut conditions = vec!["deleted_at IS NULL".to_string()];
        let mut param_count = 0;

        if query.status.is_some() {
            param_count += 1;
            conditions.push(format!("status = ${}", param_count));
        }
        if query.member_id.is_some() {
            param_count += 1;
            conditions.push(format!("member_id = ${}", param_count));
        }
        if query.from.is_some() {
            param_count += 1;
            conditions.push(format!("payment_date >= ${}", param_count));
        }
        if query.to.is_some() {
            param_count += 1;
            conditions.push(format!("payment_date <= ${}", param_count));
        }
        let where_clause = conditions.join(" AND ");

        macro_rules! bind_filters {
            ($builder:expr) => {{
                let mut b = $builder;
                if let Some(status) = query.status {
                    b = b.bind(status.as_str());
                }
                if let Some(member_id) = query.member_id {
                    b = b.bind(member_id);
                }
                if let Some(from) = query.from {
                    b = b.bind(from);
                }
                if let Some(to) = query.to {
                    b = b.bind(to);
                }
                b
            }};
        }

        let count_sql = format!("SELECT COUNT(*) FROM payments WHERE {}", where_clause);
        let total = bind_filters!(sqlx::query_scalar::<_, i64>(&count_sql))
            .fetch_one(&self.pool)
            .await?;

        let order_by = sort.order_by(PAYMENT_SORT_COLUMNS, "payment_date DESC, id DESC");
        let list_sql = format!(
            "SELECT {} FROM payments WHERE {} ORDER BY {} LIMIT ${} OFFSET ${}",
            PAYMENT_COLUMNS,
            where_clause,
            order_by,
            param_count + 1,
            param_count + 2
        );
        let entities = bind_filters!(sqlx::query_as::<_, PaymentEntity>(&list_sql))
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok((entities.into_iter().map(entity_to_domain).collect(), total))
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Payment>, sqlx::Error> {
        let entity = sqlx::query_as::<_, PaymentEntity>(&format!(
            "SELECT {} FROM payments WHERE id = $1 AND deleted_at IS NULL",
            PAYMENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(entity.map(entity_to_domain))
    }

    /// Records a payment, allocating the next invoice number for the
    /// month of the payment date inside the same transaction.
    pub async fn create(&self, input: &PaymentInput) -> Result<Payment, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let invoice_number = next_invoice_number(&mut tx, input.payment_date).await?;

        let entity = sqlx::query_as::<_, PaymentEntity>(&format!(
            r#"
            INSERT INTO payments (
                member_id, subscription_id, amount, payment_method,
                payment_date, status, invoice_number, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            PAYMENT_COLUMNS
        ))
        .bind(input.member_id)
        .bind(input.subscription_id)
        .bind(input.amount)
        .bind(input.payment_method.as_str())
        .bind(input.payment_date)
        .bind(input.status.as_str())
        .bind(&invoice_number)
        .bind(&input.notes)
        .fetch_one(&mut *tx)
        .await?;

        if let Some(subscription_id) = input.subscription_id {
            apply_subscription_coupling(&mut tx, subscription_id, entity.id, input.status)
                .await?;
        }

        tx.commit().await?;
        Ok(entity_to_domain(entity))
    }

    /// Updates a payment. The invoice number never changes.
    pub async fn update(
        &self,
        id: i64,
        update: &PaymentUpdate,
    ) -> Result<Option<Payment>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let entity = sqlx::query_as::<_, PaymentEntity>(&format!(
            r#"
            UPDATE payments
            SET amount = $2, payment_method = $3, payment_date = $4,
                status = $5, notes = $6, updated_at = now()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING {}
            "#,
            PAYMENT_COLUMNS
        ))
        .bind(id)
        .bind(update.amount)
        .bind(update.payment_method.as_str())
        .bind(update.payment_date)
        .bind(update.status.as_str())
        .bind(&update.notes)
        .fetch_optional(&mut *tx)
        .await?;

        let entity = match entity {
            Some(entity) => entity,
            None => return Ok(None),
        };

        if let Some(subscription_id) = entity.subscription_id {
            apply_subscription_coupling(&mut tx, subscription_id, entity.id, update.status)
                .await?;
        }

        tx.commit().await?;
        Ok(Some(entity_to_domain(entity)))
    }

    /// Full payment history for one member, newest first. Used by the
    /// member detail view.
    pub async fn list_for_member(&self, member_id: i64) -> Result<Vec<Payment>, sqlx::Error> {
        let entities = sqlx::query_as::<_, PaymentEntity>(&format!(
            "SELECT {} FROM payments WHERE member_id = $1 AND deleted_at IS NULL \
             ORDER BY payment_date DESC, id DESC",
            PAYMENT_COLUMNS
        ))
        .bind(member_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entities.into_iter().map(entity_to_domain).collect())
    }

    pub async fn soft_delete(&self, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE payments SET deleted_at = now() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Payment with joined member and plan details, for the invoice view.
    pub async fn find_invoice(&self, id: i64) -> Result<Option<PaymentInvoice>, sqlx::Error> {
        let row = sqlx::query_as::<_, InvoiceRow>(
            r#"
            SELECT p.id, p.member_id, p.subscription_id, p.amount, p.payment_method,
                   p.payment_date, p.status, p.invoice_number, p.notes,
                   p.created_at, p.updated_at,
                   m.first_name || ' ' || m.last_name AS member_name,
                   m.email AS member_email,
                   s.name AS subscription_name,
                   s.subscription_type
            FROM payments p
            JOIN members m ON m.id = p.member_id
            LEFT JOIN subscriptions s ON s.id = p.subscription_id
            WHERE p.id = $1 AND p.deleted_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| PaymentInvoice {
            payment: entity_to_domain(PaymentEntity {
                id: row.id,
                member_id: row.member_id,
                subscription_id: row.subscription_id,
                amount: row.amount,
                payment_method: row.payment_method,
                payment_date: row.payment_date,
                status: row.status,
                invoice_number: row.invoice_number,
                notes: row.notes,
                created_at: row.created_at,
                updated_at: row.updated_at,
            }),
            member_name: row.member_name,
            member_email: row.member_email,
            subscription_name: row.subscription_name,
            subscription_type: row.subscription_type,
        }))
    }

    /// Aggregates for one calendar year. Tombstoned payments stay in;
    /// historical reporting does not forget deleted rows.
    pub async fn financial_stats(&self, year: i32) -> Result<FinancialStats, sqlx::Error> {
        let total_revenue = sqlx::query_scalar::<_, Option<Decimal>>(
            "SELECT SUM(amount) FROM payments \
             WHERE status = 'paid' AND EXTRACT(YEAR FROM payment_date) = $1",
        )
        .bind(year)
        .fetch_one(&self.pool)
        .await?
        .unwrap_or(Decimal::ZERO);

        let month_rows: Vec<(i32, Option<Decimal>)> = sqlx::query_as(
            r#"
            SELECT EXTRACT(MONTH FROM payment_date)::int AS month, SUM(amount)
            FROM payments
            WHERE status = 'paid' AND EXTRACT(YEAR FROM payment_date) = $1
            GROUP BY month
            "#,
        )
        .bind(year)
        .fetch_all(&self.pool)
        .await?;

        // All twelve buckets, zero-filled.
        let mut revenue_by_month: Vec<MonthlyRevenue> = (1..=12)
            .map(|month| MonthlyRevenue {
                month,
                total: Decimal::ZERO,
            })
            .collect();
        for (month, total) in month_rows {
            if (1..=12).contains(&month) {
                revenue_by_month[month as usize - 1].total = total.unwrap_or(Decimal::ZERO);
            }
        }

        let method_rows: Vec<(String, Option<Decimal>)> = sqlx::query_as(
            r#"
            SELECT payment_method, SUM(amount)
            FROM payments
            WHERE status = 'paid' AND EXTRACT(YEAR FROM payment_date) = $1
            GROUP BY payment_method
            ORDER BY payment_method
            "#,
        )
        .bind(year)
        .fetch_all(&self.pool)
        .await?;

        let revenue_by_method = method_rows
            .into_iter()
            .map(|(method, total)| MethodRevenue {
                method: method.parse::<PaymentMethod>().unwrap_or(PaymentMethod::Other),
                total: total.unwrap_or(Decimal::ZERO),
            })
            .collect();

        let status_rows: Vec<(String, i64, Option<Decimal>)> = sqlx::query_as(
            r#"
            SELECT status, COUNT(*), SUM(amount)
            FROM payments
            WHERE EXTRACT(YEAR FROM payment_date) = $1
            GROUP BY status
            ORDER BY status
            "#,
        )
        .bind(year)
        .fetch_all(&self.pool)
        .await?;

        let by_status = status_rows
            .into_iter()
            .map(|(status, count, total)| StatusTotal {
                status: status.parse::<PaymentStatus>().unwrap_or(PaymentStatus::Pending),
                count,
                total: total.unwrap_or(Decimal::ZERO),
            })
            .collect();

        Ok(FinancialStats {
            year,
            total_revenue,
            revenue_by_month,
            revenue_by_method,
            by_status,
        })
    }
}

#[derive(sqlx::FromRow)]
struct InvoiceRow {
    id: i64,
    member_id: i64,
    subscription_id: Option<i64>,
    amount: Decimal,
    payment_method: String,
    payment_date: NaiveDate,
    status: String,
    invoice_number: String,
    notes: Option<String>,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
    member_name: String,
    member_email: String,
    subscription_name: Option<String>,
    subscription_type: Option<String>,
}

/// Next number after the highest already issued for the month. Tombstoned
/// rows keep their numbers, so they stay in the scan. Fixed-width
/// zero-padding makes the string MAX the numeric max.
async fn next_invoice_number(
    tx: &mut Transaction<'_, Postgres>,
    payment_date: NaiveDate,
) -> Result<String, sqlx::Error> {
    let prefix = invoice::month_prefix(payment_date);

    let highest = sqlx::query_scalar::<_, Option<String>>(
        "SELECT MAX(invoice_number) FROM payments WHERE invoice_number LIKE $1",
    )
    .bind(format!("{}%", prefix))
    .fetch_one(&mut **tx)
    .await?;

    let last_seq = highest
        .as_deref()
        .and_then(invoice::sequence_of)
        .unwrap_or(0);

    Ok(invoice::invoice_number(payment_date, last_seq))
}

/// Pushes the linked subscription to the state the payment implies.
/// `pending` leaves it untouched; a cancellation or refund only cancels
/// the subscription when no other paid payment still references it.
async fn apply_subscription_coupling(
    tx: &mut Transaction<'_, Postgres>,
    subscription_id: i64,
    payment_id: i64,
    status: PaymentStatus,
) -> Result<(), sqlx::Error> {
    match status {
        PaymentStatus::Paid => {
            sqlx::query(
                "UPDATE subscriptions SET status = 'active', updated_at = now() \
                 WHERE id = $1 AND deleted_at IS NULL",
            )
            .bind(subscription_id)
            .execute(&mut **tx)
            .await?;
        }
        PaymentStatus::Cancelled | PaymentStatus::Refunded => {
            sqlx::query(
                r#"
                UPDATE subscriptions SET status = 'cancelled', updated_at = now()
                WHERE id = $1 AND deleted_at IS NULL
                  AND NOT EXISTS (
                      SELECT 1 FROM payments
                      WHERE subscription_id = $1 AND status = 'paid'
                        AND deleted_at IS NULL AND id <> $2
                  )
                "#,
            )
            .bind(subscription_id)
            .bind(payment_id)
            .execute(&mut **tx)
            .await?;
        }
        PaymentStatus::Pending => {}
    }

    Ok(())
}

fn entity_to_domain(entity: PaymentEntity) -> Payment {
    Payment {
        id: entity.id,
        member_id: entity.member_id,
        subscription_id: entity.subscription_id,
        amount: entity.amount,
        payment_method: entity
            .payment_method
            .parse::<PaymentMethod>()
            .unwrap_or(PaymentMethod::Other),
        payment_date: entity.payment_date,
        status: entity
            .status
            .parse::<PaymentStatus>()
            .unwrap_or(PaymentStatus::Pending),
        invoice_number: entity.invoice_number,
        notes: entity.notes,
        created_at: entity.created_at,
        updated_at: entity.updated_at,
    }
}
