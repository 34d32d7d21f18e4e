use sqlx::{PgExecutor, Result as SqlxResult};
use uuid::Uuid;

use crate::{models::StaffRow, pagination::LimitOffset};

#[derive(Debug, Clone, Default)]
pub struct StaffFilter {
    pub department_id: Option<Uuid>,
    pub role: Option<String>,
    pub search: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct CreateStaffData {
    pub user_id: Uuid,
    pub department_id: Uuid,
    pub staff_number: String,
    pub designation: String,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateStaffData {
    pub department_id: Option<Uuid>,
    pub staff_number: Option<String>,
    pub designation: Option<String>,
}

pub async fn list<'e>(
    executor: impl PgExecutor<'e>,
    filter: StaffFilter,
    page: Option<LimitOffset>,
) -> SqlxResult<Vec<StaffRow>> {
    let p = page.unwrap_or_default();
    let search = filter.search.map(|s| format!("%{}%", s.to_lowercase()));

    sqlx::query_as::<_, StaffRow>(
        r#"
        SELECT s.id, s.user_id, s.department_id, s.staff_number, s.designation,
               u.email, u.first_name, u.last_name, u.role, u.is_active,
               s.created_at, s.updated_at
        FROM staff s
        JOIN users u ON u.id = s.user_id
        WHERE ($1::uuid IS NULL OR s.department_id = $1)
          AND ($2::text IS NULL OR u.role = $2)
          AND ($3::text IS NULL
               OR LOWER(u.first_name) LIKE $3
               OR LOWER(u.last_name) LIKE $3
               OR LOWER(s.staff_number) LIKE $3)
          AND ($4::bool IS NULL OR u.is_active = $4)
        ORDER BY u.last_name ASC, u.first_name ASC
        LIMIT $5 OFFSET $6
        "#,
    )
    .bind(filter.department_id)
    .bind(filter.role)
    .bind(search)
    .bind(filter.is_active)
    .bind(p.limit)
    .bind(p.offset)
    .fetch_all(executor)
    .await
}

pub async fn count<'e>(executor: impl PgExecutor<'e>, filter: StaffFilter) -> SqlxResult<i64> {
    let search = filter.search.map(|s| format!("%{}%", s.to_lowercase()));

    let row: (i64,) = sqlx::query_as(
        r#"
        SELECT COUNT(*)
        FROM staff s
        JOIN users u ON u.id = s.user_id
        WHERE ($1::uuid IS NULL OR s.department_id = $1)
          AND ($2::text IS NULL OR u.role = $2)
          AND ($3::text IS NULL
               OR LOWER(u.first_name) LIKE $3
               OR LOWER(u.last_name) LIKE $3
               OR LOWER(s.staff_number) LIKE $3)
          AND ($4::bool IS NULL OR u.is_active = $4)
        "#,
    )
    .bind(filter.department_id)
    .bind(filter.role)
    .bind(search)
    .bind(filter.is_active)
    .fetch_one(executor)
    .await?;

    Ok(row.0)
}

pub async fn get_by_id<'e>(executor: impl PgExecutor<'e>, id: Uuid) -> SqlxResult<Option<StaffRow>> {
    sqlx::query_as::<_, StaffRow>(
        r#"
        SELECT s.id, s.user_id, s.department_id, s.staff_number, s.designation,
               u.email, u.first_name, u.last_name, u.role, u.is_active,
               s.created_at, s.updated_at
        FROM staff s
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
) -> SqlxResult<Option<StaffRow>> {
    sqlx::query_as::<_, StaffRow>(
        r#"
        SELECT s.id, s.user_id, s.department_id, s.staff_number, s.designation,
               u.email, u.first_name, u.last_name, u.role, u.is_active,
               s.created_at, s.updated_at
        FROM staff s
        JOIN users u ON u.id = s.user_id
        WHERE s.user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(executor)
    .await
}

pub async fn create<'e>(executor: impl PgExecutor<'e>, data: CreateStaffData) -> SqlxResult<StaffRow> {
    sqlx::query_as::<_, StaffRow>(
        r#"
        WITH inserted AS (
            INSERT INTO staff (user_id, department_id, staff_number, designation)
            VALUES ($1, $2, $3, $4)
            RETURNING *
        )
        SELECT s.id, s.user_id, s.department_id, s.staff_number, s.designation,
               u.email, u.first_name, u.last_name, u.role, u.is_active,
               s.created_at, s.updated_at
        FROM inserted s
        JOIN users u ON u.id = s.user_id
        "#,
    )
    .bind(data.user_id)
    .bind(data.department_id)
    .bind(&data.staff_number)
    .bind(&data.designation)
    .fetch_one(executor)
    .await
}

pub async fn update<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
    data: UpdateStaffData,
) -> SqlxResult<Option<StaffRow>> {
    sqlx::query_as::<_, StaffRow>(
        r#"
        WITH updated AS (
            UPDATE staff
            SET department_id = COALESCE($2, department_id),
                staff_number = COALESCE($3, staff_number),
                designation = COALESCE($4, designation),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
        )
        SELECT s.id, s.user_id, s.department_id, s.staff_number, s.designation,
               u.email, u.first_name, u.last_name, u.role, u.is_active,
               s.created_at, s.updated_at
        FROM updated s
        JOIN users u ON u.id = s.user_id
        "#,
    )
    .bind(id)
    .bind(data.department_id)
    .bind(&data.staff_number)
    .bind(&data.designation)
    .fetch_optional(executor)
    .await
}
