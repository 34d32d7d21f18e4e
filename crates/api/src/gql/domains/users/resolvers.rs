use async_graphql::{Context, Object, Result};
use serde_json::json;
use uuid::Uuid;

use crate::auth::permissions::require_admin;
use crate::auth::PasswordService;
use crate::gql::common::helpers::page;
use crate::gql::domains::audit_log::{self, entity};
use crate::gql::error::{DbResultExt, GqlError, ResultExt};
use crate::gql::types::{PaginatedResponse, PaginationInput, Role, TemporaryPasswordPayload, User};
use crate::state::AppState;
use infra::repos::{departments, faculties, users, users::UserFilter};

#[derive(Default)]
pub struct UserQuery;

#[Object]
impl UserQuery {
    /// Search accounts (admins only)
    async fn users(
        &self,
        ctx: &Context<'_>,
        search: Option<String>,
        role: Option<Role>,
        is_active: Option<bool>,
        pagination: Option<PaginationInput>,
    ) -> Result<PaginatedResponse<User>> {
        let _admin = require_admin(ctx).await?;
        let state = ctx.data::<AppState>()?;

        let filter = UserFilter {
            search: search.filter(|s| !s.trim().is_empty()),
            role: role.map(String::from),
            is_active,
        };
        let limit_offset = page(pagination);

        let (rows, total_count) = tokio::try_join!(
            users::list(&state.db, filter.clone(), Some(limit_offset)),
            users::count(&state.db, filter)
        )
        .db()?;

        let items = rows.into_iter().map(User::from).collect();
        Ok(PaginatedResponse::new(items, total_count, limit_offset))
    }

    async fn user(&self, ctx: &Context<'_>, id: Uuid) -> Result<Option<User>> {
        let _admin = require_admin(ctx).await?;
        let state = ctx.data::<AppState>()?;

        let row = users::get_by_id(&state.db, id).await.db()?;
        Ok(row.map(User::from))
    }
}

#[derive(Default)]
pub struct UserMutation;

#[Object]
impl UserMutation {
    /// Change an account's role. Student accounts are managed through the
    /// student records and cannot be moved in or out of the student role.
    /// Losing the HOD or dean role also drops the matching headships.
    async fn update_user_role(&self, ctx: &Context<'_>, user_id: Uuid, role: Role) -> Result<User> {
        let admin = require_admin(ctx).await?;
        let state = ctx.data::<AppState>()?;

        if user_id == admin.id {
            return Err(GqlError::invalid("You cannot change your own role").into());
        }
        if role == Role::Student {
            return Err(GqlError::invalid("Use createStudent to create student accounts").into());
        }

        let mut tx = state.db.begin().await.db()?;

        let existing = users::get_by_id(&mut *tx, user_id)
            .await
            .db()?
            .ok_or_else(|| GqlError::not_found("User"))?;
        let previous = Role::from(existing.role.clone());
        if previous == Role::Student {
            return Err(GqlError::invalid("Student accounts cannot be given a staff role").into());
        }
        if previous == role {
            return Ok(existing.into());
        }

        let updated = users::set_role(&mut *tx, user_id, role.as_str())
            .await
            .db()?
            .ok_or_else(|| GqlError::not_found("User"))?;

        let mut cleared = 0;
        if previous == Role::Hod {
            cleared += departments::clear_hod(&mut *tx, user_id).await.db()?;
        }
        if previous == Role::Dean {
            cleared += faculties::clear_dean(&mut *tx, user_id).await.db()?;
        }

        let entry = audit_log::record(
            &mut *tx,
            &admin,
            "user.role_change",
            entity::USER,
            Some(user_id),
            json!({ "from": previous.as_str(), "to": role.as_str(), "clearedHeadships": cleared }),
        )
        .await
        .db()?;

        tx.commit().await.db()?;
        audit_log::publish([entry]);

        tracing::info!(user_id = %user_id, from = previous.as_str(), to = role.as_str(), "Role changed");
        Ok(updated.into())
    }

    /// Activate or deactivate an account. Deactivated users cannot log in.
    async fn set_user_active(
        &self,
        ctx: &Context<'_>,
        user_id: Uuid,
        is_active: bool,
    ) -> Result<User> {
        let admin = require_admin(ctx).await?;
        let state = ctx.data::<AppState>()?;

        if user_id == admin.id && !is_active {
            return Err(GqlError::invalid("You cannot deactivate your own account").into());
        }

        let mut tx = state.db.begin().await.db()?;
        let row = users::set_active(&mut *tx, user_id, is_active)
            .await
            .db()?
            .ok_or_else(|| GqlError::not_found("User"))?;

        let action = if is_active { "user.reactivate" } else { "user.deactivate" };
        let entry = audit_log::record(&mut *tx, &admin, action, entity::USER, Some(user_id), json!({}))
            .await
            .db()?;

        tx.commit().await.db()?;
        audit_log::publish([entry]);

        Ok(row.into())
    }

    /// Replace an account's password with a generated one (admins only).
    async fn reset_user_password(
        &self,
        ctx: &Context<'_>,
        user_id: Uuid,
    ) -> Result<TemporaryPasswordPayload> {
        let admin = require_admin(ctx).await?;
        let state = ctx.data::<AppState>()?;

        let temporary_password = PasswordService::generate_temporary_password();
        let hash =
            PasswordService::hash_password(&temporary_password, state.auth_config().bcrypt_cost)
                .await
                .gql_err("Failed to hash password")?;

        let mut tx = state.db.begin().await.db()?;
        let user = users::get_by_id(&mut *tx, user_id)
            .await
            .db()?
            .ok_or_else(|| GqlError::not_found("User"))?;
        users::set_password_hash(&mut *tx, user_id, &hash).await.db()?;

        let entry = audit_log::record(
            &mut *tx,
            &admin,
            "user.password_reset",
            entity::USER,
            Some(user_id),
            json!({}),
        )
        .await
        .db()?;

        tx.commit().await.db()?;
        audit_log::publish([entry]);

        Ok(TemporaryPasswordPayload {
            user: user.into(),
            temporary_password,
        })
    }
}
