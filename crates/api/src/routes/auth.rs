use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::auth::permissions::Actor;
use crate::auth::PasswordService;
use crate::error::AppError;
use crate::gql::domains::audit_log;
use crate::gql::types::Role;
use crate::state::AppState;
use infra::repos::users;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginUser {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub expires_in: u64,
    pub user: LoginUser,
}

const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Exchange email and password for a bearer token.
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let email = body.email.trim();
    if email.is_empty() || body.password.is_empty() {
        return Err(AppError::BadRequest(
            "Email and password are required".to_string(),
        ));
    }

    let credentials = users::get_credentials_by_email(&state.db, email)
        .await?
        .ok_or_else(|| AppError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

    // Accounts created without a password cannot log in
    let hash = credentials
        .password_hash
        .as_deref()
        .ok_or_else(|| AppError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

    if !PasswordService::verify_password(&body.password, hash).await? {
        tracing::info!(user_id = %credentials.id, "Rejected login with wrong password");
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    }

    if !credentials.is_active {
        return Err(AppError::Forbidden("Account is deactivated".to_string()));
    }

    let user = users::get_by_id(&state.db, credentials.id)
        .await?
        .ok_or_else(|| AppError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;
    let role = Role::from(user.role.clone());

    let token = state
        .jwt_service()
        .create_token(user.id, user.email.clone(), role)?;

    let actor = Actor { id: user.id, role };
    match audit_log::record(&state.db, &actor, "auth.login", "user", Some(user.id), json!({})).await {
        Ok(entry) => audit_log::publish([entry]),
        Err(e) => tracing::error!(user_id = %user.id, "Failed to record login: {e}"),
    }

    Ok(Json(LoginResponse {
        token,
        expires_in: state.jwt_service().expiration_minutes() * 60,
        user: LoginUser {
            id: user.id.to_string(),
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            role,
        },
    }))
}
