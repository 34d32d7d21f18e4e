use async_graphql::dataloader::Loader;
use infra::{
    db::Db,
    models::{CourseRow, DepartmentRow, FacultyRow, ResultRow, StudentRow, UserRow},
};
use std::{collections::HashMap, future::Future, sync::Arc};
use uuid::Uuid;

// UserLoader - batch load users by ID
#[derive(Clone)]
pub struct UserLoader {
    pool: Db,
}

impl UserLoader {
    pub fn new(pool: Db) -> Self {
        Self { pool }
    }
}

impl Loader<Uuid> for UserLoader {
    type Value = UserRow;
    type Error = Arc<sqlx::Error>;

    fn load(
        &self,
        keys: &[Uuid],
    ) -> impl Future<Output = std::result::Result<HashMap<Uuid, Self::Value>, Self::Error>> + Send
    {
        let pool = self.pool.clone();
        let ids: Vec<Uuid> = keys.to_vec();

        async move {
            if ids.is_empty() {
                return Ok(HashMap::new());
            }

            let rows: Vec<UserRow> = sqlx::query_as::<_, UserRow>(
                r#"
                SELECT id, email, first_name, last_name, phone, role, is_active,
                       created_at, updated_at
                FROM users
                WHERE id = ANY($1::uuid[])
                "#,
            )
            .bind(&ids)
            .fetch_all(&pool)
            .await
            .map_err(Arc::new)?;

            Ok(rows.into_iter().map(|r| (r.id, r)).collect())
        }
    }
}

// FacultyLoader - batch load faculties by ID
#[derive(Clone)]
pub struct FacultyLoader {
    pool: Db,
}

impl FacultyLoader {
    pub fn new(pool: Db) -> Self {
        Self { pool }
    }
}

impl Loader<Uuid> for FacultyLoader {
    type Value = FacultyRow;
    type Error = Arc<sqlx::Error>;

    fn load(
        &self,
        keys: &[Uuid],
    ) -> impl Future<Output = std::result::Result<HashMap<Uuid, Self::Value>, Self::Error>> + Send
    {
        let pool = self.pool.clone();
        let ids: Vec<Uuid> = keys.to_vec();

        async move {
            if ids.is_empty() {
                return Ok(HashMap::new());
            }

            let rows: Vec<FacultyRow> = sqlx::query_as::<_, FacultyRow>(
                r#"
                SELECT id, code, name, dean_id, created_at, updated_at
                FROM faculties
                WHERE id = ANY($1::uuid[])
                "#,
            )
            .bind(&ids)
            .fetch_all(&pool)
            .await
            .map_err(Arc::new)?;

            Ok(rows.into_iter().map(|r| (r.id, r)).collect())
        }
    }
}

// DepartmentLoader - batch load departments by ID
#[derive(Clone)]
pub struct DepartmentLoader {
    pool: Db,
}

impl DepartmentLoader {
    pub fn new(pool: Db) -> Self {
        Self { pool }
    }
}

impl Loader<Uuid> for DepartmentLoader {
    type Value = DepartmentRow;
    type Error = Arc<sqlx::Error>;

    fn load(
        &self,
        keys: &[Uuid],
    ) -> impl Future<Output = std::result::Result<HashMap<Uuid, Self::Value>, Self::Error>> + Send
    {
        let pool = self.pool.clone();
        let ids: Vec<Uuid> = keys.to_vec();

        async move {
            if ids.is_empty() {
                return Ok(HashMap::new());
            }

            let rows: Vec<DepartmentRow> = sqlx::query_as::<_, DepartmentRow>(
                r#"
                SELECT id, faculty_id, code, name, hod_id, created_at, updated_at
                FROM departments
                WHERE id = ANY($1::uuid[])
                "#,
            )
            .bind(&ids)
            .fetch_all(&pool)
            .await
            .map_err(Arc::new)?;

            Ok(rows.into_iter().map(|r| (r.id, r)).collect())
        }
    }
}

// CourseLoader - batch load courses by ID
#[derive(Clone)]
pub struct CourseLoader {
    pool: Db,
}

impl CourseLoader {
    pub fn new(pool: Db) -> Self {
        Self { pool }
    }
}

impl Loader<Uuid> for CourseLoader {
    type Value = CourseRow;
    type Error = Arc<sqlx::Error>;

    fn load(
        &self,
        keys: &[Uuid],
    ) -> impl Future<Output = std::result::Result<HashMap<Uuid, Self::Value>, Self::Error>> + Send
    {
        let pool = self.pool.clone();
        let ids: Vec<Uuid> = keys.to_vec();

        async move {
            if ids.is_empty() {
                return Ok(HashMap::new());
            }

            let rows: Vec<CourseRow> = sqlx::query_as::<_, CourseRow>(
                r#"
                SELECT id, department_id, code, title, units, level, semester, lecturer_id,
                       created_at, updated_at
                FROM courses
                WHERE id = ANY($1::uuid[])
                "#,
            )
            .bind(&ids)
            .fetch_all(&pool)
            .await
            .map_err(Arc::new)?;

            Ok(rows.into_iter().map(|r| (r.id, r)).collect())
        }
    }
}

// StudentLoader - batch load students (joined with their accounts) by student ID
#[derive(Clone)]
pub struct StudentLoader {
    pool: Db,
}

impl StudentLoader {
    pub fn new(pool: Db) -> Self {
        Self { pool }
    }
}

impl Loader<Uuid> for StudentLoader {
    type Value = StudentRow;
    type Error = Arc<sqlx::Error>;

    fn load(
        &self,
        keys: &[Uuid],
    ) -> impl Future<Output = std::result::Result<HashMap<Uuid, Self::Value>, Self::Error>> + Send
    {
        let pool = self.pool.clone();
        let ids: Vec<Uuid> = keys.to_vec();

        async move {
            if ids.is_empty() {
                return Ok(HashMap::new());
            }

            let rows = infra::repos::students::list_by_ids(&pool, &ids)
                .await
                .map_err(Arc::new)?;

            Ok(rows.into_iter().map(|r| (r.id, r)).collect())
        }
    }
}

// ResultLoader - batch load results by ID (edit requests point at them)
#[derive(Clone)]
pub struct ResultLoader {
    pool: Db,
}

impl ResultLoader {
    pub fn new(pool: Db) -> Self {
        Self { pool }
    }
}

impl Loader<Uuid> for ResultLoader {
    type Value = ResultRow;
    type Error = Arc<sqlx::Error>;

    fn load(
        &self,
        keys: &[Uuid],
    ) -> impl Future<Output = std::result::Result<HashMap<Uuid, Self::Value>, Self::Error>> + Send
    {
        let pool = self.pool.clone();
        let ids: Vec<Uuid> = keys.to_vec();

        async move {
            if ids.is_empty() {
                return Ok(HashMap::new());
            }

            let rows: Vec<ResultRow> = sqlx::query_as::<_, ResultRow>(
                r#"
                SELECT id, student_id, course_id, session, ca_score, exam_score, total_score,
                       grade, status, uploaded_by, rejection_reason, created_at, updated_at
                FROM results
                WHERE id = ANY($1::uuid[])
                "#,
            )
            .bind(&ids)
            .fetch_all(&pool)
            .await
            .map_err(Arc::new)?;

            Ok(rows.into_iter().map(|r| (r.id, r)).collect())
        }
    }
}
