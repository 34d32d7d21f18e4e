pub mod resolvers;
pub mod types;

pub use resolvers::AuditLogQuery;

use sqlx::PgExecutor;
use uuid::Uuid;

use crate::auth::permissions::Actor;
use crate::gql::subscriptions::publish_audit_entry;
use infra::models::AuditLogRow;
use infra::repos::audit_logs::{self, NewAuditEntry};
use types::AuditLogEntry;

/// Entity type names stored in `audit_logs.entity_type`.
pub mod entity {
    pub const USER: &str = "user";
    pub const FACULTY: &str = "faculty";
    pub const DEPARTMENT: &str = "department";
    pub const COURSE: &str = "course";
    pub const STAFF: &str = "staff";
    pub const STUDENT: &str = "student";
    pub const RESULT: &str = "result";
    pub const EDIT_REQUEST: &str = "edit_request";
}

/// Write an audit entry. Pass the open transaction so the entry commits
/// or rolls back together with the change it describes.
pub async fn record<'e>(
    executor: impl PgExecutor<'e>,
    actor: &Actor,
    action: &str,
    entity_type: &str,
    entity_id: Option<Uuid>,
    metadata: serde_json::Value,
) -> sqlx::Result<AuditLogRow> {
    audit_logs::insert(
        executor,
        NewAuditEntry {
            actor_id: Some(actor.id),
            actor_role: Some(actor.role.as_str().to_string()),
            action: action.to_string(),
            entity_type: entity_type.to_string(),
            entity_id,
            metadata,
        },
    )
    .await
}

/// Audit entry for changes made by the server itself, such as bootstrapping.
pub async fn record_system<'e>(
    executor: impl PgExecutor<'e>,
    action: &str,
    entity_type: &str,
    entity_id: Option<Uuid>,
    metadata: serde_json::Value,
) -> sqlx::Result<AuditLogRow> {
    audit_logs::insert(
        executor,
        NewAuditEntry {
            actor_id: None,
            actor_role: None,
            action: action.to_string(),
            entity_type: entity_type.to_string(),
            entity_id,
            metadata,
        },
    )
    .await
}

/// Broadcast committed entries to `auditLogCreated` subscribers.
/// Call only after the surrounding transaction has committed.
pub fn publish(rows: impl IntoIterator<Item = AuditLogRow>) {
    for row in rows {
        tracing::debug!(action = %row.action, entity_type = %row.entity_type, "audit entry");
        publish_audit_entry(AuditLogEntry::from(row));
    }
}
