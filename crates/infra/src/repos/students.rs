use sqlx::{PgExecutor, Result as SqlxResult};
use uuid::Uuid;

use crate::{models::StudentRow, pagination::LimitOffset};

#[derive(Debug, Clone, Default)]
pub struct StudentFilter {
    pub department_id: Option<Uuid>,
    pub level: Option<i32>,
    pub search: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct CreateStudentData {
    pub user_id: Uuid,
    pub department_id: Uuid,
    pub matric_number: String,
    pub level: i32,
    pub entry_year: i32,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateStudentData {
    pub department_id: Option<Uuid>,
    pub matric_number: Option<String>,
    pub level: Option<i32>,
}

pub async fn list<'e>(
    executor: impl PgExecutor<'e>,
    filter: StudentFilter,
    page: Option<LimitOffset>,
) -> SqlxResult<Vec<StudentRow>> {
    let p = page.unwrap_or_default();
    let search = filter.search.map(|s| format!("%{}%", s.to_lowercase()));

    sqlx::query_as::<_, StudentRow>(
        r#"
        SELECT s.id, s.user_id, s.department_id, s.matric_number, s.level, s.entry_year,
               u.email, u.first_name, u.last_name, u.is_active,
               s.created_at, s.updated_at
        FROM students s
        JOIN users u ON u.id = s.user_id
        WHERE ($1::uuid IS NULL OR s.department_id = $1)
          AND ($2::int IS NULL OR s.level = $2)
          AND ($3::text IS NULL
               OR LOWER(u.first_name) LIKE $3
               OR LOWER(u.last_name) LIKE $3
               OR LOWER(s.matric_number) LIKE $3)
          AND ($4::bool IS NULL OR u.is_active = $4)
        ORDER BY s.matric_number ASC
        LIMIT $5 OFFSET $6
        "#,
    )
    .bind(filter.department_id)
    .bind(filter.level)
    .bind(search)
    .bind(filter.is_active)
    .bind(p.limit)
    .bind(p.offset)
    .fetch_all(executor)
    .await
}

pub async fn count<'e>(executor: impl PgExecutor<'e>, filter: StudentFilter) -> SqlxResult<i64> {
    let search = filter.search.map(|s| format!("%{}%", s.to_lowercase()));

    let row: (i64,) = sqlx::query_as(
        r#"
        SELECT COUNT(*)
        FROM students s
        JOIN users u ON u.id = s.user_id
        WHERE ($1::uuid IS NULL OR s.department_id = $1)
          AND ($2::int IS NULL OR s.level = $2)
          AND ($3::text IS NULL
               OR LOWER(u.first_name) LIKE $3
               OR LOWER(u.last_name) LIKE $3
               OR LOWER(s.matric_number) LIKE $3)
          AND ($4::bool IS NULL OR u.is_active = $4)
        "#,
    )
    .bind(filter.department_id)
    .bind(filter.level)
    .bind(search)
    .bind(filter.is_active)
    .fetch_one(executor)
    .await?;

    Ok(row.0)
}

pub async fn get_by_id<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
) -> SqlxResult<Option<StudentRow>> {
    sqlx::query_as::<_, StudentRow>(
        r#"
        SELECT s.id, s.user_id, s.department_id, s.matric_number, s.level, s.entry_year,
               u.email, u.first_name, u.last_name, u.is_active,
               s.created_at, s.updated_at
        FROM students s
        JOIN users u ON u.id = s.user_id
        WHERE s.id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub async fn get_by_user_id<'e>(
    executor: impl PgExecutor<'e>,
    user_id: Uuid,
) -> SqlxResult<Option<StudentRow>> {
    sqlx::query_as::<_, StudentRow>(
        r#"
        SELECT s.id, s.user_id, s.department_id, s.matric_number, s.level, s.entry_year,
               u.email, u.first_name, u.last_name, u.is_active,
               s.created_at, s.updated_at
        FROM students s
        JOIN users u ON u.id = s.user_id
        WHERE s.user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(executor)
    .await
}

/// Students with the given ids, in no particular order.
pub async fn list_by_ids<'e>(
    executor: impl PgExecutor<'e>,
    ids: &[Uuid],
) -> SqlxResult<Vec<StudentRow>> {
    sqlx::query_as::<_, StudentRow>(
        r#"
        SELECT s.id, s.user_id, s.department_id, s.matric_number, s.level, s.entry_year,
               u.email, u.first_name, u.last_name, u.is_active,
               s.created_at, s.updated_at
        FROM students s
        JOIN users u ON u.id = s.user_id
        WHERE s.id = ANY($1::uuid[])
        "#,
    )
    .bind(ids)
    .fetch_all(executor)
    .await
}

pub async fn create<'e>(
    executor: impl PgExecutor<'e>,
    data: CreateStudentData,
) -> SqlxResult<StudentRow> {
    sqlx::query_as::<_, StudentRow>(
        r#"
        WITH inserted AS (
            INSERT INTO students (user_id, department_id, matric_number, level, entry_year)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
        )
        SELECT s.id, s.user_id, s.department_id, s.matric_number, s.level, s.entry_year,
               u.email, u.first_name, u.last_name, u.is_active,
               s.created_at, s.updated_at
        FROM inserted s
        JOIN users u ON u.id = s.user_id
        "#,
    )
    .bind(data.user_id)
    .bind(data.department_id)
    .bind(&data.matric_number)
    .bind(data.level)
    .bind(data.entry_year)
    .fetch_one(executor)
    .await
}

pub async fn update<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
    data: UpdateStudentData,
) -> SqlxResult<Option<StudentRow>> {
    sqlx::query_as::<_, StudentRow>(
        r#"
        WITH updated AS (
            UPDATE students
            SET department_id = COALESCE($2, department_id),
                matric_number = COALESCE($3, matric_number),
                level = COALESCE($4, level),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
        )
        SELECT s.id, s.user_id, s.department_id, s.matric_number, s.level, s.entry_year,
               u.email, u.first_name, u.last_name, u.is_active,
               s.created_at, s.updated_at
        FROM updated s
        JOIN users u ON u.id = s.user_id
        "#,
    )
    .bind(id)
    .bind(data.department_id)
    .bind(&data.matric_number)
    .bind(data.level)
    .fetch_optional(executor)
    .await
}
