use async_graphql::{Context, Object, Result};
use serde_json::json;

use crate::auth::permissions::require_auth;
use crate::auth::PasswordService;
use crate::gql::domains::audit_log::{self, entity};
use crate::gql::error::{DbResultExt, GqlError, ResultExt};
use crate::gql::types::User;
use crate::state::AppState;
use infra::repos::users;

use super::types::ChangePasswordInput;

// ── Queries ──────────────────────────────────────────────────────────

#[derive(Default)]
pub struct AuthQuery;

#[Object]
impl AuthQuery {
    /// The current authenticated user
    async fn me(&self, ctx: &Context<'_>) -> Result<User> {
        let actor = require_auth(ctx).await?;
        let state = ctx.data::<AppState>()?;

        let user = users::get_by_id(&state.db, actor.id)
            .await
            .db()?
            .ok_or_else(|| GqlError::not_found("User"))?;

        Ok(user.into())
    }
}

// ── Mutations ────────────────────────────────────────────────────────

#[derive(Default)]
pub struct AuthMutation;

#[Object]
impl AuthMutation {
    async fn change_password(&self, ctx: &Context<'_>, input: ChangePasswordInput) -> Result<bool> {
        let actor = require_auth(ctx).await?;
        let state = ctx.data::<AppState>()?;
        let config = state.auth_config();

        let credentials = users::get_credentials_by_id(&state.db, actor.id)
            .await
            .db()?
            .ok_or_else(|| GqlError::not_found("User"))?;

        let current_ok = match credentials.password_hash.as_deref() {
            Some(hash) => PasswordService::verify_password(&input.current_password, hash)
                .await
                .gql_err("Failed to verify password")?,
            None => false,
        };
        if !current_ok {
            return Err(GqlError::invalid("Current password is incorrect").into());
        }

        if input.new_password == input.current_password {
            return Err(
                GqlError::invalid("New password must differ from the current one").into(),
            );
        }
        PasswordService::validate_password_strength(&input.new_password, config.min_password_length)
            .gql_err("Weak password")?;

        let hash = PasswordService::hash_password(&input.new_password, config.bcrypt_cost)
            .await
            .gql_err("Failed to hash password")?;

        let mut tx = state.db.begin().await.db()?;
        users::set_password_hash(&mut *tx, actor.id, &hash).await.db()?;
        let entry = audit_log::record(
            &mut *tx,
            &actor,
            "user.password_change",
            entity::USER,
            Some(actor.id),
            json!({}),
        )
        .await
        .db()?;
        tx.commit().await.db()?;
        audit_log::publish([entry]);

        Ok(true)
    }
}
