use sqlx::{PgExecutor, Postgres, QueryBuilder, Result};
use uuid::Uuid;

use crate::{
    models::{UserCredentialsRow, UserRow},
    pagination::LimitOffset,
};

#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub search: Option<String>,
    pub role: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct CreateUserData {
    pub email: String,
    pub password_hash: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub role: String,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateUserData {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
}

fn push_filter(query: &mut QueryBuilder<'_, Postgres>, filter: &UserFilter) {
    if let Some(search) = &filter.search {
        let search_pattern = format!("%{}%", search.to_lowercase());
        query.push(" AND (LOWER(email) LIKE ");
        query.push_bind(search_pattern.clone());
        query.push(" OR LOWER(first_name) LIKE ");
        query.push_bind(search_pattern.clone());
        query.push(" OR LOWER(last_name) LIKE ");
        query.push_bind(search_pattern);
        query.push(")");
    }

    if let Some(role) = &filter.role {
        query.push(" AND role = ");
        query.push_bind(role.clone());
    }

    if let Some(is_active) = filter.is_active {
        query.push(" AND is_active = ");
        query.push_bind(is_active);
    }
}

pub async fn list<'e>(
    executor: impl PgExecutor<'e>,
    filter: UserFilter,
    page: Option<LimitOffset>,
) -> Result<Vec<UserRow>> {
    let page = page.unwrap_or_default();

    let mut query = QueryBuilder::new(
        "SELECT id, email, first_name, last_name, phone, role, is_active, created_at, updated_at FROM users WHERE 1=1",
    );
    push_filter(&mut query, &filter);

    query.push(" ORDER BY last_name ASC, first_name ASC");
    query.push(" LIMIT ");
    query.push_bind(page.limit);
    query.push(" OFFSET ");
    query.push_bind(page.offset);

    query.build_query_as::<UserRow>().fetch_all(executor).await
}

pub async fn count<'e>(executor: impl PgExecutor<'e>, filter: UserFilter) -> Result<i64> {
    let mut query = QueryBuilder::new("SELECT COUNT(*) FROM users WHERE 1=1");
    push_filter(&mut query, &filter);

    let row: (i64,) = query.build_query_as().fetch_one(executor).await?;
    Ok(row.0)
}

pub async fn get_by_id<'e>(executor: impl PgExecutor<'e>, id: Uuid) -> Result<Option<UserRow>> {
    sqlx::query_as::<_, UserRow>(
        "SELECT id, email, first_name, last_name, phone, role, is_active, created_at, updated_at FROM users WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub async fn get_credentials_by_email<'e>(
    executor: impl PgExecutor<'e>,
    email: &str,
) -> Result<Option<UserCredentialsRow>> {
    sqlx::query_as::<_, UserCredentialsRow>(
        "SELECT id, email, password_hash, role, is_active FROM users WHERE LOWER(email) = LOWER($1)",
    )
    .bind(email)
    .fetch_optional(executor)
    .await
}

pub async fn get_credentials_by_id<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
) -> Result<Option<UserCredentialsRow>> {
    sqlx::query_as::<_, UserCredentialsRow>(
        "SELECT id, email, password_hash, role, is_active FROM users WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub async fn create<'e>(executor: impl PgExecutor<'e>, data: CreateUserData) -> Result<UserRow> {
    sqlx::query_as::<_, UserRow>(
        r#"
        INSERT INTO users (email, password_hash, first_name, last_name, phone, role, is_active)
        VALUES (LOWER($1), $2, $3, $4, $5, $6, true)
        RETURNING id, email, first_name, last_name, phone, role, is_active, created_at, updated_at
        "#,
    )
    .bind(&data.email)
    .bind(&data.password_hash)
    .bind(&data.first_name)
    .bind(&data.last_name)
    .bind(&data.phone)
    .bind(&data.role)
    .fetch_one(executor)
    .await
}

pub async fn update<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
    data: UpdateUserData,
) -> Result<Option<UserRow>> {
    sqlx::query_as::<_, UserRow>(
        r#"
        UPDATE users
        SET email = COALESCE(LOWER($2), email),
            first_name = COALESCE($3, first_name),
            last_name = COALESCE($4, last_name),
            phone = COALESCE($5, phone),
            updated_at = NOW()
        WHERE id = $1
        RETURNING id, email, first_name, last_name, phone, role, is_active, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(&data.email)
    .bind(&data.first_name)
    .bind(&data.last_name)
    .bind(&data.phone)
    .fetch_optional(executor)
    .await
}

pub async fn set_role<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
    role: &str,
) -> Result<Option<UserRow>> {
    sqlx::query_as::<_, UserRow>(
        r#"
        UPDATE users
        SET role = $2, updated_at = NOW()
        WHERE id = $1
        RETURNING id, email, first_name, last_name, phone, role, is_active, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(role)
    .fetch_optional(executor)
    .await
}

/// Deactivate or reactivate a user (soft delete).
pub async fn set_active<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
    is_active: bool,
) -> Result<Option<UserRow>> {
    sqlx::query_as::<_, UserRow>(
        r#"
        UPDATE users
        SET is_active = $2, updated_at = NOW()
        WHERE id = $1
        RETURNING id, email, first_name, last_name, phone, role, is_active, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(is_active)
    .fetch_optional(executor)
    .await
}

pub async fn set_password_hash<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
    password_hash: &str,
) -> Result<bool> {
    let result = sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
        .bind(id)
        .bind(password_hash)
        .execute(executor)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn email_taken<'e>(
    executor: impl PgExecutor<'e>,
    email: &str,
    except_id: Option<Uuid>,
) -> Result<bool> {
    let row: (bool,) = sqlx::query_as(
        "SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(email) = LOWER($1) AND ($2::uuid IS NULL OR id <> $2))",
    )
    .bind(email)
    .bind(except_id)
    .fetch_one(executor)
    .await?;

    Ok(row.0)
}

pub async fn any_with_role<'e>(executor: impl PgExecutor<'e>, role: &str) -> Result<bool> {
    let row: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM users WHERE role = $1)")
        .bind(role)
        .fetch_one(executor)
        .await?;

    Ok(row.0)
}
