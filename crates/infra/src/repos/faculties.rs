use sqlx::{PgExecutor, Result as SqlxResult};
use uuid::Uuid;

use crate::models::FacultyRow;

#[derive(Debug, Clone)]
pub struct CreateFacultyData {
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateFacultyData {
    pub code: Option<String>,
    pub name: Option<String>,
}

pub async fn list<'e>(executor: impl PgExecutor<'e>) -> SqlxResult<Vec<FacultyRow>> {
    sqlx::query_as::<_, FacultyRow>(
        r#"
        SELECT id, code, name, dean_id, created_at, updated_at
        FROM faculties
        ORDER BY name ASC
        "#,
    )
    .fetch_all(executor)
    .await
}

pub async fn get_by_id<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
) -> SqlxResult<Option<FacultyRow>> {
    sqlx::query_as::<_, FacultyRow>(
        r#"
        SELECT id, code, name, dean_id, created_at, updated_at
        FROM faculties
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub async fn create<'e>(
    executor: impl PgExecutor<'e>,
    data: CreateFacultyData,
) -> SqlxResult<FacultyRow> {
    sqlx::query_as::<_, FacultyRow>(
        r#"
        INSERT INTO faculties (code, name)
        VALUES ($1, $2)
        RETURNING id, code, name, dean_id, created_at, updated_at
        "#,
    )
    .bind(&data.code)
    .bind(&data.name)
    .fetch_one(executor)
    .await
}

pub async fn update<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
    data: UpdateFacultyData,
) -> SqlxResult<Option<FacultyRow>> {
    sqlx::query_as::<_, FacultyRow>(
        r#"
        UPDATE faculties
        SET code = COALESCE($2, code),
            name = COALESCE($3, name),
            updated_at = NOW()
        WHERE id = $1
        RETURNING id, code, name, dean_id, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(&data.code)
    .bind(&data.name)
    .fetch_optional(executor)
    .await
}

pub async fn set_dean<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
    dean_id: Option<Uuid>,
) -> SqlxResult<Option<FacultyRow>> {
    sqlx::query_as::<_, FacultyRow>(
        r#"
        UPDATE faculties
        SET dean_id = $2, updated_at = NOW()
        WHERE id = $1
        RETURNING id, code, name, dean_id, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(dean_id)
    .fetch_optional(executor)
    .await
}

/// Returns `false` when no faculty had that id.
pub async fn delete<'e>(executor: impl PgExecutor<'e>, id: Uuid) -> SqlxResult<bool> {
    let result = sqlx::query("DELETE FROM faculties WHERE id = $1")
        .bind(id)
        .execute(executor)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn count<'e>(executor: impl PgExecutor<'e>) -> SqlxResult<i64> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM faculties")
        .fetch_one(executor)
        .await?;
    Ok(row.0)
}

/// Drop the user from every deanship; returns how many faculties changed.
pub async fn clear_dean<'e>(executor: impl PgExecutor<'e>, dean_id: Uuid) -> SqlxResult<u64> {
    let result =
        sqlx::query("UPDATE faculties SET dean_id = NULL, updated_at = NOW() WHERE dean_id = $1")
            .bind(dean_id)
            .execute(executor)
            .await?;

    Ok(result.rows_affected())
}
