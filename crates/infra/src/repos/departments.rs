use sqlx::{PgExecutor, Result as SqlxResult};
use uuid::Uuid;

use crate::models::DepartmentRow;

#[derive(Debug, Clone)]
pub struct CreateDepartmentData {
    pub faculty_id: Uuid,
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateDepartmentData {
    pub faculty_id: Option<Uuid>,
    pub code: Option<String>,
    pub name: Option<String>,
}

pub async fn list<'e>(
    executor: impl PgExecutor<'e>,
    faculty_id: Option<Uuid>,
) -> SqlxResult<Vec<DepartmentRow>> {
    sqlx::query_as::<_, DepartmentRow>(
        r#"
        SELECT id, faculty_id, code, name, hod_id, created_at, updated_at
        FROM departments
        WHERE ($1::uuid IS NULL OR faculty_id = $1)
        ORDER BY name ASC
        "#,
    )
    .bind(faculty_id)
    .fetch_all(executor)
    .await
}

pub async fn get_by_id<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
) -> SqlxResult<Option<DepartmentRow>> {
    sqlx::query_as::<_, DepartmentRow>(
        r#"
        SELECT id, faculty_id, code, name, hod_id, created_at, updated_at
        FROM departments
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub async fn create<'e>(
    executor: impl PgExecutor<'e>,
    data: CreateDepartmentData,
) -> SqlxResult<DepartmentRow> {
    sqlx::query_as::<_, DepartmentRow>(
        r#"
        INSERT INTO departments (faculty_id, code, name)
        VALUES ($1, $2, $3)
        RETURNING id, faculty_id, code, name, hod_id, created_at, updated_at
        "#,
    )
    .bind(data.faculty_id)
    .bind(&data.code)
    .bind(&data.name)
    .fetch_one(executor)
    .await
}

pub async fn update<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
    data: UpdateDepartmentData,
) -> SqlxResult<Option<DepartmentRow>> {
    sqlx::query_as::<_, DepartmentRow>(
        r#"
        UPDATE departments
        SET faculty_id = COALESCE($2, faculty_id),
            code = COALESCE($3, code),
            name = COALESCE($4, name),
            updated_at = NOW()
        WHERE id = $1
        RETURNING id, faculty_id, code, name, hod_id, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(data.faculty_id)
    .bind(&data.code)
    .bind(&data.name)
    .fetch_optional(executor)
    .await
}

pub async fn set_hod<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
    hod_id: Option<Uuid>,
) -> SqlxResult<Option<DepartmentRow>> {
    sqlx::query_as::<_, DepartmentRow>(
        r#"
        UPDATE departments
        SET hod_id = $2, updated_at = NOW()
        WHERE id = $1
        RETURNING id, faculty_id, code, name, hod_id, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(hod_id)
    .fetch_optional(executor)
    .await
}

pub async fn delete<'e>(executor: impl PgExecutor<'e>, id: Uuid) -> SqlxResult<bool> {
    let result = sqlx::query("DELETE FROM departments WHERE id = $1")
        .bind(id)
        .execute(executor)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn count<'e>(executor: impl PgExecutor<'e>) -> SqlxResult<i64> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM departments")
        .fetch_one(executor)
        .await?;
    Ok(row.0)
}

/// Drop the user from every headship; returns how many departments changed.
pub async fn clear_hod<'e>(executor: impl PgExecutor<'e>, hod_id: Uuid) -> SqlxResult<u64> {
    let result =
        sqlx::query("UPDATE departments SET hod_id = NULL, updated_at = NOW() WHERE hod_id = $1")
            .bind(hod_id)
            .execute(executor)
            .await?;

    Ok(result.rows_affected())
}
