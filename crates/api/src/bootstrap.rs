use anyhow::{Context, Result};
use serde_json::json;

use crate::auth::PasswordService;
use crate::gql::domains::audit_log;
use crate::gql::types::Role;
use crate::state::AppState;
use infra::repos::users::{self, CreateUserData};

/// Create the first administrator from `BOOTSTRAP_ADMIN_EMAIL` and
/// `BOOTSTRAP_ADMIN_PASSWORD` when the database has none.
pub async fn ensure_admin(state: &AppState) -> Result<()> {
    let (Ok(email), Ok(password)) = (
        std::env::var("BOOTSTRAP_ADMIN_EMAIL"),
        std::env::var("BOOTSTRAP_ADMIN_PASSWORD"),
    ) else {
        return Ok(());
    };

    if users::any_with_role(&state.db, Role::Admin.as_str()).await? {
        tracing::debug!("Admin account present; skipping bootstrap");
        return Ok(());
    }

    PasswordService::validate_password_strength(
        &password,
        state.auth_config().min_password_length,
    )
    .context("BOOTSTRAP_ADMIN_PASSWORD is too weak")?;

    let hash = PasswordService::hash_password(&password, state.auth_config().bcrypt_cost).await?;

    let mut tx = state.db.begin().await?;
    let admin = users::create(
        &mut *tx,
        CreateUserData {
            email: email.trim().to_string(),
            password_hash: Some(hash),
            first_name: "System".to_string(),
            last_name: "Administrator".to_string(),
            phone: None,
            role: Role::Admin.as_str().to_string(),
        },
    )
    .await
    .context("failed to create bootstrap admin")?;

    let entry = audit_log::record_system(
        &mut *tx,
        "user.bootstrap",
        "user",
        Some(admin.id),
        json!({ "email": admin.email }),
    )
    .await?;
    tx.commit().await?;
    audit_log::publish([entry]);

    tracing::info!(email = %admin.email, "Bootstrapped admin account");
    Ok(())
}
