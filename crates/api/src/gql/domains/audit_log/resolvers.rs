use async_graphql::{Context, Object, Result};

use crate::auth::permissions::require_admin;
use crate::gql::common::helpers::page;
use crate::gql::error::DbResultExt;
use crate::gql::types::{AuditLogEntry, AuditLogFilterInput, PaginatedResponse, PaginationInput};
use crate::state::AppState;
use infra::repos::audit_logs::{self, AuditLogFilter};

#[derive(Default)]
pub struct AuditLogQuery;

#[Object]
impl AuditLogQuery {
    /// Audit trail, newest first (admins only)
    async fn audit_logs(
        &self,
        ctx: &Context<'_>,
        filter: Option<AuditLogFilterInput>,
        pagination: Option<PaginationInput>,
    ) -> Result<PaginatedResponse<AuditLogEntry>> {
        let _admin = require_admin(ctx).await?;
        let state = ctx.data::<AppState>()?;

        let filter = AuditLogFilter::from(filter.unwrap_or_default());
        let limit_offset = page(pagination);

        let (rows, total_count) = tokio::try_join!(
            audit_logs::list(&state.db, filter.clone(), Some(limit_offset)),
            audit_logs::count(&state.db, filter)
        )
        .db()?;

        let items = rows.into_iter().map(AuditLogEntry::from).collect();
        Ok(PaginatedResponse::new(items, total_count, limit_offset))
    }
}
