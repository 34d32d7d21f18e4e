use sqlx::{PgExecutor, Result as SqlxResult};
use uuid::Uuid;

use crate::{models::CourseRow, pagination::LimitOffset};

#[derive(Debug, Clone, Default)]
pub struct CourseFilter {
    pub department_id: Option<Uuid>,
    pub lecturer_id: Option<Uuid>,
    pub level: Option<i32>,
    pub semester: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreateCourseData {
    pub department_id: Uuid,
    pub code: String,
    pub title: String,
    pub units: i32,
    pub level: i32,
    pub semester: String,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateCourseData {
    pub department_id: Option<Uuid>,
    pub code: Option<String>,
    pub title: Option<String>,
    pub units: Option<i32>,
    pub level: Option<i32>,
    pub semester: Option<String>,
}

pub async fn list<'e>(
    executor: impl PgExecutor<'e>,
    filter: CourseFilter,
    page: Option<LimitOffset>,
) -> SqlxResult<Vec<CourseRow>> {
    let p = page.unwrap_or_default();
    let search = filter.search.map(|s| format!("%{}%", s.to_lowercase()));

    // Single prepared statement; NULL parameters disable their predicate
    sqlx::query_as::<_, CourseRow>(
        r#"
        SELECT id, department_id, code, title, units, level, semester, lecturer_id,
               created_at, updated_at
        FROM courses
        WHERE ($1::uuid IS NULL OR department_id = $1)
          AND ($2::uuid IS NULL OR lecturer_id = $2)
          AND ($3::int IS NULL OR level = $3)
          AND ($4::text IS NULL OR semester = $4)
          AND ($5::text IS NULL OR LOWER(code) LIKE $5 OR LOWER(title) LIKE $5)
        ORDER BY code ASC
        LIMIT $6 OFFSET $7
        "#,
    )
    .bind(filter.department_id)
    .bind(filter.lecturer_id)
    .bind(filter.level)
    .bind(filter.semester)
    .bind(search)
    .bind(p.limit)
    .bind(p.offset)
    .fetch_all(executor)
    .await
}

pub async fn count<'e>(executor: impl PgExecutor<'e>, filter: CourseFilter) -> SqlxResult<i64> {
    let search = filter.search.map(|s| format!("%{}%", s.to_lowercase()));

    let row: (i64,) = sqlx::query_as(
        r#"
        SELECT COUNT(*)
        FROM courses
        WHERE ($1::uuid IS NULL OR department_id = $1)
          AND ($2::uuid IS NULL OR lecturer_id = $2)
          AND ($3::int IS NULL OR level = $3)
          AND ($4::text IS NULL OR semester = $4)
          AND ($5::text IS NULL OR LOWER(code) LIKE $5 OR LOWER(title) LIKE $5)
        "#,
    )
    .bind(filter.department_id)
    .bind(filter.lecturer_id)
    .bind(filter.level)
    .bind(filter.semester)
    .bind(search)
    .fetch_one(executor)
    .await?;

    Ok(row.0)
}

pub async fn get_by_id<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
) -> SqlxResult<Option<CourseRow>> {
    sqlx::query_as::<_, CourseRow>(
        r#"
        SELECT id, department_id, code, title, units, level, semester, lecturer_id,
               created_at, updated_at
        FROM courses
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub async fn create<'e>(
    executor: impl PgExecutor<'e>,
    data: CreateCourseData,
) -> SqlxResult<CourseRow> {
    sqlx::query_as::<_, CourseRow>(
        r#"
        INSERT INTO courses (department_id, code, title, units, level, semester)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, department_id, code, title, units, level, semester, lecturer_id,
                  created_at, updated_at
        "#,
    )
    .bind(data.department_id)
    .bind(&data.code)
    .bind(&data.title)
    .bind(data.units)
    .bind(data.level)
    .bind(&data.semester)
    .fetch_one(executor)
    .await
}

pub async fn update<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
    data: UpdateCourseData,
) -> SqlxResult<Option<CourseRow>> {
    sqlx::query_as::<_, CourseRow>(
        r#"
        UPDATE courses
        SET department_id = COALESCE($2, department_id),
            code = COALESCE($3, code),
            title = COALESCE($4, title),
            units = COALESCE($5, units),
            level = COALESCE($6, level),
            semester = COALESCE($7, semester),
            updated_at = NOW()
        WHERE id = $1
        RETURNING id, department_id, code, title, units, level, semester, lecturer_id,
                  created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(data.department_id)
    .bind(&data.code)
    .bind(&data.title)
    .bind(data.units)
    .bind(data.level)
    .bind(&data.semester)
    .fetch_optional(executor)
    .await
}

pub async fn set_lecturer<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
    lecturer_id: Option<Uuid>,
) -> SqlxResult<Option<CourseRow>> {
    sqlx::query_as::<_, CourseRow>(
        r#"
        UPDATE courses
        SET lecturer_id = $2, updated_at = NOW()
        WHERE id = $1
        RETURNING id, department_id, code, title, units, level, semester, lecturer_id,
                  created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(lecturer_id)
    .fetch_optional(executor)
    .await
}

pub async fn delete<'e>(executor: impl PgExecutor<'e>, id: Uuid) -> SqlxResult<bool> {
    let result = sqlx::query("DELETE FROM courses WHERE id = $1")
        .bind(id)
        .execute(executor)
        .await?;

    Ok(result.rows_affected() > 0)
}
