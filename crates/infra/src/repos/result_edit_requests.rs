use sqlx::{PgExecutor, Result as SqlxResult};
use uuid::Uuid;

use crate::{
    models::{EditRequestRow, EditRequestStatus},
    pagination::LimitOffset,
};

#[derive(Debug, Clone)]
pub struct CreateEditRequestData {
    pub result_id: Uuid,
    pub requested_by: Uuid,
    pub reason: String,
    pub proposed_ca_score: i32,
    pub proposed_exam_score: i32,
    pub reviewer_role: String,
}

/// Scopes a reviewer's queue: requests routed to `reviewer_role`, limited to the
/// departments (`hod_id`) or faculties (`dean_id`) the reviewer leads.
#[derive(Debug, Clone)]
pub struct ReviewerFilter {
    pub reviewer_role: String,
    pub hod_id: Option<Uuid>,
    pub dean_id: Option<Uuid>,
    pub status: Option<EditRequestStatus>,
}

pub async fn create<'e>(
    executor: impl PgExecutor<'e>,
    data: CreateEditRequestData,
) -> SqlxResult<EditRequestRow> {
    sqlx::query_as::<_, EditRequestRow>(
        r#"
        INSERT INTO result_edit_requests
            (result_id, requested_by, reason, proposed_ca_score, proposed_exam_score, reviewer_role)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, result_id, requested_by, reason, proposed_ca_score, proposed_exam_score,
                  status, reviewer_role, reviewed_by, review_comment, created_at, reviewed_at
        "#,
    )
    .bind(data.result_id)
    .bind(data.requested_by)
    .bind(&data.reason)
    .bind(data.proposed_ca_score)
    .bind(data.proposed_exam_score)
    .bind(&data.reviewer_role)
    .fetch_one(executor)
    .await
}

/// Fetch a request and lock it for the rest of the transaction.
pub async fn lock_by_id<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
) -> SqlxResult<Option<EditRequestRow>> {
    sqlx::query_as::<_, EditRequestRow>(
        r#"
        SELECT id, result_id, requested_by, reason, proposed_ca_score, proposed_exam_score,
               status, reviewer_role, reviewed_by, review_comment, created_at, reviewed_at
        FROM result_edit_requests
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub async fn has_pending<'e>(executor: impl PgExecutor<'e>, result_id: Uuid) -> SqlxResult<bool> {
    let row: (bool,) = sqlx::query_as(
        "SELECT EXISTS(SELECT 1 FROM result_edit_requests WHERE result_id = $1 AND status = 'pending')",
    )
    .bind(result_id)
    .fetch_one(executor)
    .await?;

    Ok(row.0)
}

/// Ids among `result_ids` that have a pending edit request.
pub async fn pending_result_ids<'e>(
    executor: impl PgExecutor<'e>,
    result_ids: &[Uuid],
) -> SqlxResult<Vec<Uuid>> {
    let rows: Vec<(Uuid,)> = sqlx::query_as(
        "SELECT result_id FROM result_edit_requests WHERE result_id = ANY($1) AND status = 'pending'",
    )
    .bind(result_ids)
    .fetch_all(executor)
    .await?;

    Ok(rows.into_iter().map(|(id,)| id).collect())
}

/// Close a pending request. `reviewed_by` is `None` when the requester withdraws it.
pub async fn resolve<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
    status: EditRequestStatus,
    reviewed_by: Option<Uuid>,
    review_comment: Option<&str>,
) -> SqlxResult<EditRequestRow> {
    sqlx::query_as::<_, EditRequestRow>(
        r#"
        UPDATE result_edit_requests
        SET status = $2,
            reviewed_by = $3,
            review_comment = $4,
            reviewed_at = NOW()
        WHERE id = $1
        RETURNING id, result_id, requested_by, reason, proposed_ca_score, proposed_exam_score,
                  status, reviewer_role, reviewed_by, review_comment, created_at, reviewed_at
        "#,
    )
    .bind(id)
    .bind(status)
    .bind(reviewed_by)
    .bind(review_comment)
    .fetch_one(executor)
    .await
}

pub async fn list_for_reviewer<'e>(
    executor: impl PgExecutor<'e>,
    filter: ReviewerFilter,
    page: Option<LimitOffset>,
) -> SqlxResult<Vec<EditRequestRow>> {
    let p = page.unwrap_or_default();

    sqlx::query_as::<_, EditRequestRow>(
        r#"
        SELECT e.id, e.result_id, e.requested_by, e.reason, e.proposed_ca_score,
               e.proposed_exam_score, e.status, e.reviewer_role, e.reviewed_by,
               e.review_comment, e.created_at, e.reviewed_at
        FROM result_edit_requests e
        JOIN results r ON r.id = e.result_id
        JOIN courses c ON c.id = r.course_id
        JOIN departments d ON d.id = c.department_id
        JOIN faculties f ON f.id = d.faculty_id
        WHERE e.reviewer_role = $1
          AND ($2::uuid IS NULL OR d.hod_id = $2)
          AND ($3::uuid IS NULL OR f.dean_id = $3)
          AND ($4::edit_request_status IS NULL OR e.status = $4)
        ORDER BY e.created_at DESC
        LIMIT $5 OFFSET $6
        "#,
    )
    .bind(&filter.reviewer_role)
    .bind(filter.hod_id)
    .bind(filter.dean_id)
    .bind(filter.status)
    .bind(p.limit)
    .bind(p.offset)
    .fetch_all(executor)
    .await
}

pub async fn count_for_reviewer<'e>(
    executor: impl PgExecutor<'e>,
    filter: ReviewerFilter,
) -> SqlxResult<i64> {
    let row: (i64,) = sqlx::query_as(
        r#"
        SELECT COUNT(*)
        FROM result_edit_requests e
        JOIN results r ON r.id = e.result_id
        JOIN courses c ON c.id = r.course_id
        JOIN departments d ON d.id = c.department_id
        JOIN faculties f ON f.id = d.faculty_id
        WHERE e.reviewer_role = $1
          AND ($2::uuid IS NULL OR d.hod_id = $2)
          AND ($3::uuid IS NULL OR f.dean_id = $3)
          AND ($4::edit_request_status IS NULL OR e.status = $4)
        "#,
    )
    .bind(&filter.reviewer_role)
    .bind(filter.hod_id)
    .bind(filter.dean_id)
    .bind(filter.status)
    .fetch_one(executor)
    .await?;

    Ok(row.0)
}

pub async fn list_by_requester<'e>(
    executor: impl PgExecutor<'e>,
    requested_by: Uuid,
) -> SqlxResult<Vec<EditRequestRow>> {
    sqlx::query_as::<_, EditRequestRow>(
        r#"
        SELECT id, result_id, requested_by, reason, proposed_ca_score, proposed_exam_score,
               status, reviewer_role, reviewed_by, review_comment, created_at, reviewed_at
        FROM result_edit_requests
        WHERE requested_by = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(requested_by)
    .fetch_all(executor)
    .await
}
