//! Activity log repository.
//!
//! The log is append-only: this repository exposes insert and read
//! operations, nothing else.

use domain::models::{ActivityLog, EntityKind};
use domain::services::activity::NewActivityLog;
use shared::pagination::PageParams;
use sqlx::PgPool;

use crate::entities::ActivityLogEntity;

const ACTIVITY_COLUMNS: &str = "id, actor_id, action, entity_kind, entity_id, description, \
     details, ip_address, user_agent, created_at";

/// Repository for activity log database operations.
#[derive(Clone)]
pub struct ActivityLogRepository {
    pool: PgPool,
}

impl ActivityLogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, entry: &NewActivityLog) -> Result<ActivityLog, sqlx::Error> {
        let entity = sqlx::query_as::<_, ActivityLogEntity>(&format!(
            r#"
            INSERT INTO activity_logs (
                actor_id, action, entity_kind, entity_id, description, details,
                ip_address, user_agent
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            ACTIVITY_COLUMNS
        ))
        .bind(entry.actor_id)
        .bind(&entry.action)
        .bind(entry.entity_kind.as_str())
        .bind(entry.entity_id)
        .bind(&entry.description)
        .bind(&entry.details)
        .bind(&entry.ip_address)
        .bind(&entry.user_agent)
        .fetch_one(&self.pool)
        .await?;

        Ok(entity_to_domain(entity))
    }

    /// Inserts without blocking the request that triggered the entry.
    pub fn insert_async(&self, entry: NewActivityLog) {
        let repo = self.clone();
        tokio::spawn(async move {
            if let Err(err) = repo.insert(&entry).await {
                tracing::error!(error = %err, "failed to insert activity log entry");
            }
        });
    }

    /// Recent entries, newest first.
    pub async fn list(&self, page: PageParams) -> Result<(Vec<ActivityLog>, i64), sqlx::Error> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM activity_logs")
            .fetch_one(&self.pool)
            .await?;

        let entities = sqlx::query_as::<_, ActivityLogEntity>(&format!(
            "SELECT {} FROM activity_logs ORDER BY created_at DESC LIMIT $1 OFFSET $2",
            ACTIVITY_COLUMNS
        ))
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((entities.into_iter().map(entity_to_domain).collect(), total))
    }

    /// History for one entity, newest first.
    pub async fn list_for_entity(
        &self,
        entity_kind: EntityKind,
        entity_id: i64,
    ) -> Result<Vec<ActivityLog>, sqlx::Error> {
        let entities = sqlx::query_as::<_, ActivityLogEntity>(&format!(
            "SELECT {} FROM activity_logs \
             WHERE entity_kind = $1 AND entity_id = $2 ORDER BY created_at DESC",
            ACTIVITY_COLUMNS
        ))
        .bind(entity_kind.as_str())
        .bind(entity_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entities.into_iter().map(entity_to_domain).collect())
    }

    /// The `limit` most recent entries, for the admin dashboard.
    pub async fn recent(&self, limit: i64) -> Result<Vec<ActivityLog>, sqlx::Error> {
        let entities = sqlx::query_as::<_, ActivityLogEntity>(&format!(
            "SELECT {} FROM activity_logs ORDER BY created_at DESC LIMIT $1",
            ACTIVITY_COLUMNS
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(entities.into_iter().map(entity_to_domain).collect())
    }
}

pub(crate) fn entity_to_domain(entity: ActivityLogEntity) -> ActivityLog {
    ActivityLog {
        id: entity.id,
        actor_id: entity.actor_id,
        action: entity.action,
        entity_kind: entity
            .entity_kind
            .parse::<EntityKind>()
            .unwrap_or(EntityKind::User),
        entity_id: entity.entity_id,
        description: entity.description,
        details: entity.details,
        ip_address: entity.ip_address,
        user_agent: entity.user_agent,
        created_at: entity.created_at,
    }
}
