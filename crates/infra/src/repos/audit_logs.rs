use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, Result as SqlxResult};
use uuid::Uuid;

use crate::{models::AuditLogRow, pagination::LimitOffset};

#[derive(Debug, Clone)]
pub struct NewAuditEntry {
    pub actor_id: Option<Uuid>,
    pub actor_role: Option<String>,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Option<Uuid>,
    pub metadata: serde_json::Value,
}

#[derive(Debug, Clone, Default)]
pub struct AuditLogFilter {
    pub entity_type: Option<String>,
    pub entity_id: Option<Uuid>,
    pub actor_id: Option<Uuid>,
    pub action: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

/// Insert a new audit entry and return it.
pub async fn insert<'e>(
    executor: impl PgExecutor<'e>,
    entry: NewAuditEntry,
) -> SqlxResult<AuditLogRow> {
    sqlx::query_as::<_, AuditLogRow>(
        "INSERT INTO audit_logs
         (actor_id, actor_role, action, entity_type, entity_id, metadata)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING id, actor_id, actor_role, action, entity_type, entity_id, metadata, created_at",
    )
    .bind(entry.actor_id)
    .bind(entry.actor_role)
    .bind(entry.action)
    .bind(entry.entity_type)
    .bind(entry.entity_id)
    .bind(entry.metadata)
    .fetch_one(executor)
    .await
}

/// List audit entries, newest first.
pub async fn list<'e>(
    executor: impl PgExecutor<'e>,
    filter: AuditLogFilter,
    page: Option<LimitOffset>,
) -> SqlxResult<Vec<AuditLogRow>> {
    let p = page.unwrap_or_default();

    sqlx::query_as::<_, AuditLogRow>(
        "SELECT id, actor_id, actor_role, action, entity_type, entity_id, metadata, created_at
         FROM audit_logs
         WHERE ($1::text IS NULL OR entity_type = $1)
           AND ($2::uuid IS NULL OR entity_id = $2)
           AND ($3::uuid IS NULL OR actor_id = $3)
           AND ($4::text IS NULL OR action = $4)
           AND ($5::timestamptz IS NULL OR created_at >= $5)
           AND ($6::timestamptz IS NULL OR created_at <= $6)
         ORDER BY created_at DESC, id DESC
         LIMIT $7 OFFSET $8",
    )
    .bind(filter.entity_type)
    .bind(filter.entity_id)
    .bind(filter.actor_id)
    .bind(filter.action)
    .bind(filter.from)
    .bind(filter.to)
    .bind(p.limit)
    .bind(p.offset)
    .fetch_all(executor)
    .await
}

pub async fn count<'e>(executor: impl PgExecutor<'e>, filter: AuditLogFilter) -> SqlxResult<i64> {
    let row: (i64,) = sqlx::query_as(
        "SELECT COUNT(*)
         FROM audit_logs
         WHERE ($1::text IS NULL OR entity_type = $1)
           AND ($2::uuid IS NULL OR entity_id = $2)
           AND ($3::uuid IS NULL OR actor_id = $3)
           AND ($4::text IS NULL OR action = $4)
           AND ($5::timestamptz IS NULL OR created_at >= $5)
           AND ($6::timestamptz IS NULL OR created_at <= $6)",
    )
    .bind(filter.entity_type)
    .bind(filter.entity_id)
    .bind(filter.actor_id)
    .bind(filter.action)
    .bind(filter.from)
    .bind(filter.to)
    .fetch_one(executor)
    .await?;

    Ok(row.0)
}

/// Full history of one entity, oldest first.
pub async fn list_for_entity<'e>(
    executor: impl PgExecutor<'e>,
    entity_type: &str,
    entity_id: Uuid,
) -> SqlxResult<Vec<AuditLogRow>> {
    sqlx::query_as::<_, AuditLogRow>(
        "SELECT id, actor_id, actor_role, action, entity_type, entity_id, metadata, created_at
         FROM audit_logs
         WHERE entity_type = $1 AND entity_id = $2
         ORDER BY created_at ASC, id ASC",
    )
    .bind(entity_type)
    .bind(entity_id)
    .fetch_all(executor)
    .await
}
