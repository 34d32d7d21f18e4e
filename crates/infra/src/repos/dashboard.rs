use sqlx::{FromRow, PgExecutor, Result as SqlxResult};

#[derive(Debug, Clone, FromRow)]
pub struct EntityCounts {
    pub faculties: i64,
    pub departments: i64,
    pub courses: i64,
    pub staff: i64,
    pub students: i64,
    pub active_users: i64,
}

/// Headline counts for the admin portal, in one round-trip.
pub async fn entity_counts<'e>(executor: impl PgExecutor<'e>) -> SqlxResult<EntityCounts> {
    sqlx::query_as::<_, EntityCounts>(
        r#"
        SELECT
            (SELECT COUNT(*) FROM faculties) AS faculties,
            (SELECT COUNT(*) FROM departments) AS departments,
            (SELECT COUNT(*) FROM courses) AS courses,
            (SELECT COUNT(*) FROM staff) AS staff,
            (SELECT COUNT(*) FROM students) AS students,
            (SELECT COUNT(*) FROM users WHERE is_active) AS active_users
        "#,
    )
    .fetch_one(executor)
    .await
}
