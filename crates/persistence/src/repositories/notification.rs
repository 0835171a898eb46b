//! Notification repository.
//!
//! Recipients are a tagged `(subject_kind, subject_id)` pair so the same
//! table serves staff accounts and gym members.

use domain::models::{EntityKind, Notification};
use shared::pagination::PageParams;
use sqlx::PgPool;

use crate::entities::NotificationEntity;

const NOTIFICATION_COLUMNS: &str =
    "id, subject_kind, subject_id, kind, title, body, read, read_at, created_at";

/// Column values for creating a notification.
#[derive(Debug, Clone)]
pub struct NotificationInput {
    pub subject_kind: EntityKind,
    pub subject_id: i64,
    pub kind: String,
    pub title: String,
    pub body: String,
}

/// Repository for notification database operations.
#[derive(Clone)]
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The recipient's notifications, newest first, optionally filtered
    /// by read state. Also returns the unread count for the badge.
    pub async fn list_for_subject(
        &self,
        subject_kind: EntityKind,
        subject_id: i64,
        read: Option<bool>,
        page: PageParams,
    ) -> Result<(Vec<Notification>, i64, i64), sqlx::Error> {
        let mut where_clause = "subject_kind = $1 AND subject_id = $2".to_string();
        if read.is_some() {
            where_clause.push_str(" AND read = $3");
        }

        macro_rules! bind_filters {
            ($builder:expr) => {{
                let mut b = $builder.bind(subject_kind.as_str()).bind(subject_id);
                if let Some(read) = read {
                    b = b.bind(read);
                }
                b
            }};
        }

        let count_sql = format!("SELECT COUNT(*) FROM notifications WHERE {}", where_clause);
        let total = bind_filters!(sqlx::query_scalar::<_, i64>(&count_sql))
            .fetch_one(&self.pool)
            .await?;

        let unread = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM notifications \
             WHERE subject_kind = $1 AND subject_id = $2 AND NOT read",
        )
        .bind(subject_kind.as_str())
        .bind(subject_id)
        .fetch_one(&self.pool)
        .await?;

        let param_count = if read.is_some() { 3 } else { 2 };
        let list_sql = format!(
            "SELECT {} FROM notifications WHERE {} \
             ORDER BY created_at DESC LIMIT ${} OFFSET ${}",
            NOTIFICATION_COLUMNS,
            where_clause,
            param_count + 1,
            param_count + 2
        );
        let entities = bind_filters!(sqlx::query_as::<_, NotificationEntity>(&list_sql))
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok((
            entities.into_iter().map(entity_to_domain).collect(),
            total,
            unread,
        ))
    }

    pub async fn insert(&self, input: &NotificationInput) -> Result<Notification, sqlx::Error> {
        let entity = sqlx::query_as::<_, NotificationEntity>(&format!(
            r#"
            INSERT INTO notifications (subject_kind, subject_id, kind, title, body)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            NOTIFICATION_COLUMNS
        ))
        .bind(input.subject_kind.as_str())
        .bind(input.subject_id)
        .bind(&input.kind)
        .bind(&input.title)
        .bind(&input.body)
        .fetch_one(&self.pool)
        .await?;

        Ok(entity_to_domain(entity))
    }

    /// Inserts without waiting; a failed notification never fails the
    /// request that triggered it.
    pub fn insert_async(&self, input: NotificationInput) {
        let repo = self.clone();
        tokio::spawn(async move {
            if let Err(err) = repo.insert(&input).await {
                tracing::error!(error = %err, "failed to insert notification");
            }
        });
    }

    /// Marks one notification read. Re-reading is a no-op; the original
    /// `read_at` is kept. Only the recipient can mark it.
    pub async fn mark_read(
        &self,
        subject_kind: EntityKind,
        subject_id: i64,
        id: i64,
    ) -> Result<Option<Notification>, sqlx::Error> {
        let entity = sqlx::query_as::<_, NotificationEntity>(&format!(
            r#"
            UPDATE notifications
            SET read = TRUE, read_at = COALESCE(read_at, now())
            WHERE id = $1 AND subject_kind = $2 AND subject_id = $3
            RETURNING {}
            "#,
            NOTIFICATION_COLUMNS
        ))
        .bind(id)
        .bind(subject_kind.as_str())
        .bind(subject_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(entity.map(entity_to_domain))
    }

    /// Marks all of the recipient's unread notifications read. Returns
    /// how many rows changed.
    pub async fn mark_all_read(
        &self,
        subject_kind: EntityKind,
        subject_id: i64,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE notifications SET read = TRUE, read_at = now() \
             WHERE subject_kind = $1 AND subject_id = $2 AND NOT read",
        )
        .bind(subject_kind.as_str())
        .bind(subject_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

fn entity_to_domain(entity: NotificationEntity) -> Notification {
    Notification {
        id: entity.id,
        subject_kind: entity
            .subject_kind
            .parse::<EntityKind>()
            .unwrap_or(EntityKind::User),
        subject_id: entity.subject_id,
        kind: entity.kind,
        title: entity.title,
        body: entity.body,
        read: entity.read,
        read_at: entity.read_at,
        created_at: entity.created_at,
    }
}
