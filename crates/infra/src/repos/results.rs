use sqlx::{PgExecutor, Result as SqlxResult};
use uuid::Uuid;

use crate::{
    models::{ResultRow, ResultScopeRow, TranscriptLineRow},
    pagination::LimitOffset,
    workflow::ResultStatus,
};

#[derive(Debug, Clone)]
pub struct UpsertDraftData {
    pub student_id: Uuid,
    pub course_id: Uuid,
    pub session: String,
    pub ca_score: i32,
    pub exam_score: i32,
    pub total_score: i32,
    pub grade: String,
    pub uploaded_by: Uuid,
}

/// Restricts pending-approval listings to one stage's queue and scope.
#[derive(Debug, Clone)]
pub struct PendingFilter {
    pub status: ResultStatus,
    /// Only results of departments headed by this user.
    pub hod_id: Option<Uuid>,
    /// Only results of faculties led by this user.
    pub dean_id: Option<Uuid>,
    pub session: Option<String>,
}

pub async fn get_by_id<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
) -> SqlxResult<Option<ResultRow>> {
    sqlx::query_as::<_, ResultRow>(
        r#"
        SELECT id, student_id, course_id, session, ca_score, exam_score, total_score, grade,
               status, uploaded_by, rejection_reason, created_at, updated_at
        FROM results
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub async fn list_for_course<'e>(
    executor: impl PgExecutor<'e>,
    course_id: Uuid,
    session: &str,
    status: Option<ResultStatus>,
) -> SqlxResult<Vec<ResultRow>> {
    sqlx::query_as::<_, ResultRow>(
        r#"
        SELECT r.id, r.student_id, r.course_id, r.session, r.ca_score, r.exam_score,
               r.total_score, r.grade, r.status, r.uploaded_by, r.rejection_reason,
               r.created_at, r.updated_at
        FROM results r
        JOIN students s ON s.id = r.student_id
        WHERE r.course_id = $1
          AND r.session = $2
          AND ($3::result_status IS NULL OR r.status = $3)
        ORDER BY s.matric_number ASC
        "#,
    )
    .bind(course_id)
    .bind(session)
    .bind(status)
    .fetch_all(executor)
    .await
}

/// Load results with their ownership chain and lock them for the rest of the transaction.
/// Rows come back ordered by id so concurrent batches lock in the same order.
pub async fn lock_scopes<'e>(
    executor: impl PgExecutor<'e>,
    ids: &[Uuid],
) -> SqlxResult<Vec<ResultScopeRow>> {
    sqlx::query_as::<_, ResultScopeRow>(
        r#"
        SELECT r.id, r.course_id, r.session, r.status, c.lecturer_id,
               d.id AS department_id, d.hod_id, f.id AS faculty_id, f.dean_id
        FROM results r
        JOIN courses c ON c.id = r.course_id
        JOIN departments d ON d.id = c.department_id
        JOIN faculties f ON f.id = d.faculty_id
        WHERE r.id = ANY($1::uuid[])
        ORDER BY r.id
        FOR UPDATE OF r
        "#,
    )
    .bind(ids)
    .fetch_all(executor)
    .await
}

/// Same as [`lock_scopes`] for every result of a course in a session.
pub async fn lock_scopes_for_course<'e>(
    executor: impl PgExecutor<'e>,
    course_id: Uuid,
    session: &str,
) -> SqlxResult<Vec<ResultScopeRow>> {
    sqlx::query_as::<_, ResultScopeRow>(
        r#"
        SELECT r.id, r.course_id, r.session, r.status, c.lecturer_id,
               d.id AS department_id, d.hod_id, f.id AS faculty_id, f.dean_id
        FROM results r
        JOIN courses c ON c.id = r.course_id
        JOIN departments d ON d.id = c.department_id
        JOIN faculties f ON f.id = d.faculty_id
        WHERE r.course_id = $1 AND r.session = $2
        ORDER BY r.id
        FOR UPDATE OF r
        "#,
    )
    .bind(course_id)
    .bind(session)
    .fetch_all(executor)
    .await
}

pub async fn set_status<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
    status: ResultStatus,
    rejection_reason: Option<&str>,
) -> SqlxResult<ResultRow> {
    sqlx::query_as::<_, ResultRow>(
        r#"
        UPDATE results
        SET status = $2,
            rejection_reason = $3,
            updated_at = NOW()
        WHERE id = $1
        RETURNING id, student_id, course_id, session, ca_score, exam_score, total_score, grade,
                  status, uploaded_by, rejection_reason, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(status)
    .bind(rejection_reason)
    .fetch_one(executor)
    .await
}

/// Insert a draft or overwrite the scores of an existing editable result.
/// Returns `None` when the existing result is locked in the approval chain.
pub async fn upsert_draft<'e>(
    executor: impl PgExecutor<'e>,
    data: UpsertDraftData,
) -> SqlxResult<Option<ResultRow>> {
    sqlx::query_as::<_, ResultRow>(
        r#"
        INSERT INTO results (student_id, course_id, session, ca_score, exam_score, total_score,
                             grade, status, uploaded_by)
        VALUES ($1, $2, $3, $4, $5, $6, $7, 'draft', $8)
        ON CONFLICT (student_id, course_id, session) DO UPDATE
        SET ca_score = EXCLUDED.ca_score,
            exam_score = EXCLUDED.exam_score,
            total_score = EXCLUDED.total_score,
            grade = EXCLUDED.grade,
            uploaded_by = EXCLUDED.uploaded_by,
            updated_at = NOW()
        WHERE results.status IN ('draft', 'rejected')
        RETURNING id, student_id, course_id, session, ca_score, exam_score, total_score, grade,
                  status, uploaded_by, rejection_reason, created_at, updated_at
        "#,
    )
    .bind(data.student_id)
    .bind(data.course_id)
    .bind(&data.session)
    .bind(data.ca_score)
    .bind(data.exam_score)
    .bind(data.total_score)
    .bind(&data.grade)
    .bind(data.uploaded_by)
    .fetch_optional(executor)
    .await
}

/// Apply corrected scores from an approved edit request and send the result back to draft.
pub async fn apply_correction<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
    ca_score: i32,
    exam_score: i32,
    total_score: i32,
    grade: &str,
) -> SqlxResult<ResultRow> {
    sqlx::query_as::<_, ResultRow>(
        r#"
        UPDATE results
        SET ca_score = $2,
            exam_score = $3,
            total_score = $4,
            grade = $5,
            status = 'draft',
            rejection_reason = NULL,
            updated_at = NOW()
        WHERE id = $1
        RETURNING id, student_id, course_id, session, ca_score, exam_score, total_score, grade,
                  status, uploaded_by, rejection_reason, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(ca_score)
    .bind(exam_score)
    .bind(total_score)
    .bind(grade)
    .fetch_one(executor)
    .await
}

pub async fn list_pending<'e>(
    executor: impl PgExecutor<'e>,
    filter: PendingFilter,
    page: Option<LimitOffset>,
) -> SqlxResult<Vec<ResultRow>> {
    let p = page.unwrap_or_default();

    sqlx::query_as::<_, ResultRow>(
        r#"
        SELECT r.id, r.student_id, r.course_id, r.session, r.ca_score, r.exam_score,
               r.total_score, r.grade, r.status, r.uploaded_by, r.rejection_reason,
               r.created_at, r.updated_at
        FROM results r
        JOIN courses c ON c.id = r.course_id
        JOIN departments d ON d.id = c.department_id
        JOIN faculties f ON f.id = d.faculty_id
        WHERE r.status = $1
          AND ($2::uuid IS NULL OR d.hod_id = $2)
          AND ($3::uuid IS NULL OR f.dean_id = $3)
          AND ($4::text IS NULL OR r.session = $4)
        ORDER BY r.updated_at ASC, r.id ASC
        LIMIT $5 OFFSET $6
        "#,
    )
    .bind(filter.status)
    .bind(filter.hod_id)
    .bind(filter.dean_id)
    .bind(filter.session)
    .bind(p.limit)
    .bind(p.offset)
    .fetch_all(executor)
    .await
}

pub async fn count_pending<'e>(
    executor: impl PgExecutor<'e>,
    filter: PendingFilter,
) -> SqlxResult<i64> {
    let row: (i64,) = sqlx::query_as(
        r#"
        SELECT COUNT(*)
        FROM results r
        JOIN courses c ON c.id = r.course_id
        JOIN departments d ON d.id = c.department_id
        JOIN faculties f ON f.id = d.faculty_id
        WHERE r.status = $1
          AND ($2::uuid IS NULL OR d.hod_id = $2)
          AND ($3::uuid IS NULL OR f.dean_id = $3)
          AND ($4::text IS NULL OR r.session = $4)
        "#,
    )
    .bind(filter.status)
    .bind(filter.hod_id)
    .bind(filter.dean_id)
    .bind(filter.session)
    .fetch_one(executor)
    .await?;

    Ok(row.0)
}

/// Approved results of a student, joined with the course facts.
pub async fn list_published_for_student<'e>(
    executor: impl PgExecutor<'e>,
    student_id: Uuid,
    session: Option<&str>,
) -> SqlxResult<Vec<TranscriptLineRow>> {
    sqlx::query_as::<_, TranscriptLineRow>(
        r#"
        SELECT r.id AS result_id, c.id AS course_id, c.code AS course_code,
               c.title AS course_title, c.units, c.semester, r.session,
               r.ca_score, r.exam_score, r.total_score, r.grade
        FROM results r
        JOIN courses c ON c.id = r.course_id
        WHERE r.student_id = $1
          AND r.status = 'approved'
          AND ($2::text IS NULL OR r.session = $2)
        ORDER BY r.session ASC, c.semester ASC, c.code ASC
        "#,
    )
    .bind(student_id)
    .bind(session)
    .fetch_all(executor)
    .await
}

pub async fn count_by_status<'e>(
    executor: impl PgExecutor<'e>,
) -> SqlxResult<Vec<(ResultStatus, i64)>> {
    sqlx::query_as::<_, (ResultStatus, i64)>(
        "SELECT status, COUNT(*) FROM results GROUP BY status ORDER BY status",
    )
    .fetch_all(executor)
    .await
}

/// Draft or rejected results on courses taught by the lecturer.
pub async fn count_editable_for_lecturer<'e>(
    executor: impl PgExecutor<'e>,
    lecturer_id: Uuid,
) -> SqlxResult<i64> {
    let row: (i64,) = sqlx::query_as(
        r#"
        SELECT COUNT(*)
        FROM results r
        JOIN courses c ON c.id = r.course_id
        WHERE c.lecturer_id = $1
          AND r.status IN ('draft', 'rejected')
        "#,
    )
    .bind(lecturer_id)
    .fetch_one(executor)
    .await?;

    Ok(row.0)
}
