use async_graphql::dataloader::DataLoader;
use async_graphql::{ComplexObject, Context, InputObject, Result, SimpleObject, ID};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::gql::loaders::UserLoader;
use crate::gql::types::{Role, User};
use infra::models::AuditLogRow;
use infra::repos::audit_logs::AuditLogFilter;

#[derive(SimpleObject, Clone, Debug)]
#[graphql(complex)]
pub struct AuditLogEntry {
    pub id: ID,
    pub actor_id: Option<ID>,
    pub actor_role: Option<Role>,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Option<ID>,
    pub metadata: async_graphql::Json<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl From<AuditLogRow> for AuditLogEntry {
    fn from(row: AuditLogRow) -> Self {
        Self {
            id: row.id.into(),
            actor_id: row.actor_id.map(|id| id.into()),
            actor_role: row.actor_role.map(Role::from),
            action: row.action,
            entity_type: row.entity_type,
            entity_id: row.entity_id.map(|id| id.into()),
            metadata: async_graphql::Json(row.metadata),
            created_at: row.created_at,
        }
    }
}

#[ComplexObject]
impl AuditLogEntry {
    /// The user who made the change; empty for system entries.
    async fn actor(&self, ctx: &Context<'_>) -> Result<Option<User>> {
        let Some(actor_id) = &self.actor_id else {
            return Ok(None);
        };
        let actor_id = Uuid::parse_str(actor_id.as_str())?;

        let loader = ctx.data::<DataLoader<UserLoader>>()?;
        let row = loader
            .load_one(actor_id)
            .await
            .map_err(|e| async_graphql::Error::new(e.to_string()))?;

        Ok(row.map(User::from))
    }
}

#[derive(InputObject, Default)]
pub struct AuditLogFilterInput {
    pub entity_type: Option<String>,
    pub entity_id: Option<Uuid>,
    pub actor_id: Option<Uuid>,
    pub action: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl From<AuditLogFilterInput> for AuditLogFilter {
    fn from(input: AuditLogFilterInput) -> Self {
        Self {
            entity_type: input.entity_type,
            entity_id: input.entity_id,
            actor_id: input.actor_id,
            action: input.action,
            from: input.from,
            to: input.to,
        }
    }
}
