//! Result workflow operations.
//!
//! Each operation locks the affected results, validates the whole batch and
//! only then writes, so a batch either fully applies or leaves every row as
//! it was. Audit entries and status events go out after commit.
//!
//! The caller (resolver) is responsible for authentication and for
//! converting the output to GraphQL types.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::Utc;
use serde_json::json;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::auth::permissions::{in_scope, Actor};
use crate::gql::common::validation;
use crate::gql::domains::audit_log::{self, entity};
use crate::gql::error::{DbResultExt, GqlError};
use crate::gql::subscriptions::publish_result_status;
use crate::gql::types::{ResultEntryInput, ResultStatusEvent, SessionGpa, Student, StudentResults, TranscriptLine};
use infra::db::Db;
use infra::grading::{self, Grade};
use infra::models::{AuditLogRow, ResultRow, ResultScopeRow};
use infra::repos::{courses, result_edit_requests, results, results::UpsertDraftData, students};
use infra::workflow::{self, ResultStatus, Stage, WorkflowAction};

/// Parameters for recording draft scores for a course.
pub struct UpsertResultsParams {
    pub course_id: Uuid,
    pub session: String,
    pub entries: Vec<ResultEntryInput>,
}

/// Write or overwrite draft scores for the course the actor teaches.
pub async fn upsert_results(
    db: &Db,
    actor: &Actor,
    params: UpsertResultsParams,
) -> Result<Vec<ResultRow>, GqlError> {
    let session = validation::session(&params.session)
        .map_err(|e| GqlError::invalid(e.to_string()))?;
    if params.entries.is_empty() {
        return Err(GqlError::invalid("At least one result entry is required"));
    }

    let mut seen = HashSet::new();
    let mut scored = Vec::with_capacity(params.entries.len());
    for entry in &params.entries {
        if !seen.insert(entry.student_id) {
            return Err(GqlError::invalid(format!(
                "Student {} appears more than once",
                entry.student_id
            )));
        }
        scored.push((entry.student_id, grading::validate_scores(entry.ca_score, entry.exam_score)?));
    }

    let course = courses::get_by_id(db, params.course_id)
        .await
        .db()?
        .ok_or_else(|| GqlError::not_found("Course"))?;
    if course.lecturer_id != Some(actor.id) {
        return Err(GqlError::forbidden(format!(
            "only the lecturer of {} can record its results",
            course.code
        )));
    }

    let student_ids: Vec<Uuid> = scored.iter().map(|(id, _)| *id).collect();
    let known = students::list_by_ids(db, &student_ids).await.db()?;
    let known: HashMap<Uuid, bool> = known.into_iter().map(|s| (s.id, s.is_active)).collect();
    for id in &student_ids {
        match known.get(id) {
            None => return Err(GqlError::not_found(&format!("Student {id}"))),
            Some(false) => {
                return Err(GqlError::invalid(format!("Student {id} is deactivated")));
            }
            Some(true) => {}
        }
    }

    let mut tx = db.begin().await.db()?;

    // Lock the course's existing rows so a concurrent submit cannot slip in
    results::lock_scopes_for_course(&mut *tx, course.id, &session)
        .await
        .db()?;
    let existing: HashMap<Uuid, ResultStatus> =
        results::list_for_course(&mut *tx, course.id, &session, None)
            .await
            .db()?
            .into_iter()
            .map(|r| (r.student_id, r.status))
            .collect();
    for (student_id, _) in &scored {
        if let Some(status) = existing.get(student_id) {
            workflow::ensure_editable(*status)?;
        }
    }

    let mut rows = Vec::with_capacity(scored.len());
    let mut entries = Vec::with_capacity(scored.len());
    let mut events = Vec::new();
    for (student_id, s) in scored {
        let row = results::upsert_draft(
            &mut *tx,
            UpsertDraftData {
                student_id,
                course_id: course.id,
                session: session.clone(),
                ca_score: s.ca_score,
                exam_score: s.exam_score,
                total_score: s.total_score,
                grade: s.grade.as_str().to_string(),
                uploaded_by: actor.id,
            },
        )
        .await
        .db()?
        .ok_or_else(|| {
            GqlError::invalid(format!(
                "The result of student {student_id} was locked while saving; reload and retry"
            ))
        })?;

        let created = !existing.contains_key(&student_id);
        let entry = audit_log::record(
            &mut *tx,
            actor,
            if created { "result.create" } else { "result.update" },
            entity::RESULT,
            Some(row.id),
            json!({
                "caScore": row.ca_score,
                "examScore": row.exam_score,
                "totalScore": row.total_score,
                "grade": row.grade,
            }),
        )
        .await
        .db()?;

        if created {
            events.push(status_event(&row, None, actor));
        }
        entries.push(entry);
        rows.push(row);
    }

    tx.commit().await.db()?;
    publish(entries, events);

    tracing::info!(
        course_id = %course.id,
        session = %session,
        count = rows.len(),
        "Draft results saved"
    );
    Ok(rows)
}

/// Move every listed result one step. `stage` is where the actor sits in the
/// chain; lecturers submit, approvers approve or reject.
pub async fn transition_results(
    db: &Db,
    actor: &Actor,
    result_ids: &[Uuid],
    action: WorkflowAction,
    stage: Stage,
    note: Option<&str>,
) -> Result<Vec<ResultRow>, GqlError> {
    let ids = dedup(result_ids);
    if ids.is_empty() {
        return Err(GqlError::invalid("At least one result is required"));
    }

    let mut tx = db.begin().await.db()?;
    let scopes = results::lock_scopes(&mut *tx, &ids).await.db()?;
    if scopes.len() != ids.len() {
        let found: HashSet<Uuid> = scopes.iter().map(|s| s.id).collect();
        let missing = ids.iter().find(|id| !found.contains(id)).copied().unwrap_or_default();
        return Err(GqlError::not_found(&format!("Result {missing}")));
    }

    let (rows, entries, events) = apply(&mut *tx, actor, &scopes, action, stage, note).await?;
    tx.commit().await.db()?;
    publish(entries, events);

    Ok(rows)
}

/// Submit every draft or rejected result of a course in one session.
pub async fn submit_course_results(
    db: &Db,
    actor: &Actor,
    course_id: Uuid,
    session: &str,
) -> Result<Vec<ResultRow>, GqlError> {
    let session = validation::session(session).map_err(|e| GqlError::invalid(e.to_string()))?;

    let mut tx = db.begin().await.db()?;
    let scopes: Vec<ResultScopeRow> = results::lock_scopes_for_course(&mut *tx, course_id, &session)
        .await
        .db()?
        .into_iter()
        .filter(|s| workflow::is_editable(s.status))
        .collect();
    if scopes.is_empty() {
        return Err(GqlError::invalid(format!(
            "No draft or rejected results to submit for session {session}"
        )));
    }

    let (rows, entries, events) =
        apply(&mut *tx, actor, &scopes, WorkflowAction::Submit, Stage::Lecturer, None).await?;
    tx.commit().await.db()?;
    publish(entries, events);

    Ok(rows)
}

/// Check the whole batch before the first write, then write.
async fn apply(
    conn: &mut PgConnection,
    actor: &Actor,
    scopes: &[ResultScopeRow],
    action: WorkflowAction,
    stage: Stage,
    note: Option<&str>,
) -> Result<(Vec<ResultRow>, Vec<AuditLogRow>, Vec<ResultStatusEvent>), GqlError> {
    // A pending edit request freezes the result until it is reviewed
    let ids: Vec<Uuid> = scopes.iter().map(|s| s.id).collect();
    let frozen: HashSet<Uuid> = result_edit_requests::pending_result_ids(&mut *conn, &ids)
        .await
        .db()?
        .into_iter()
        .collect();

    let mut planned = Vec::with_capacity(scopes.len());
    for scope in scopes {
        if !in_scope(stage, actor.id, scope) {
            return Err(GqlError::forbidden(format!(
                "result {} is outside your {} scope",
                scope.id,
                stage.as_str()
            )));
        }
        if frozen.contains(&scope.id) {
            return Err(GqlError::invalid(format!(
                "Result {} has a pending edit request; it must be reviewed first",
                scope.id
            )));
        }
        let next = workflow::transition(scope.status, action, stage)?;
        planned.push((scope, next));
    }

    let rejection_reason = match action {
        WorkflowAction::Reject => note,
        _ => None,
    };

    let mut rows = Vec::with_capacity(planned.len());
    let mut entries = Vec::with_capacity(planned.len());
    let mut events = Vec::with_capacity(planned.len());
    for (scope, next) in planned {
        let row = results::set_status(&mut *conn, scope.id, next, rejection_reason)
            .await
            .db()?;

        let entry = audit_log::record(
            &mut *conn,
            actor,
            &format!("result.{}", action.as_str()),
            entity::RESULT,
            Some(row.id),
            json!({
                "from": scope.status.as_str(),
                "to": next.as_str(),
                "stage": stage.as_str(),
                "note": note,
            }),
        )
        .await
        .db()?;

        events.push(status_event(&row, Some(scope.status), actor));
        entries.push(entry);
        rows.push(row);
    }

    tracing::info!(
        actor_id = %actor.id,
        action = action.as_str(),
        stage = stage.as_str(),
        count = rows.len(),
        "Results transitioned"
    );
    Ok((rows, entries, events))
}

fn dedup(ids: &[Uuid]) -> Vec<Uuid> {
    let mut seen = HashSet::new();
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

pub(crate) fn status_event(
    row: &ResultRow,
    previous: Option<ResultStatus>,
    actor: &Actor,
) -> ResultStatusEvent {
    ResultStatusEvent {
        result_id: row.id.into(),
        course_id: row.course_id.into(),
        session: row.session.clone(),
        previous_status: previous.map(Into::into),
        status: row.status.into(),
        actor_id: actor.id.into(),
        changed_at: Utc::now(),
    }
}

pub(crate) fn publish(entries: Vec<AuditLogRow>, events: Vec<ResultStatusEvent>) {
    audit_log::publish(entries);
    for event in events {
        publish_result_status(event);
    }
}

/// Build the transcript view. `all` is every published line of the student
/// and feeds the cumulative figures; `shown` is what the caller asked for.
pub fn summarize(student: Student, shown: Vec<TranscriptLine>, all: &[TranscriptLine]) -> StudentResults {
    let weights = |lines: &[TranscriptLine]| -> Vec<(i32, i32)> {
        lines.iter().map(|l| (l.units, l.grade_points)).collect()
    };

    let mut by_session: BTreeMap<&str, Vec<(i32, i32)>> = BTreeMap::new();
    for line in all {
        by_session
            .entry(line.session.as_str())
            .or_default()
            .push((line.units, line.grade_points));
    }
    let sessions = by_session
        .into_iter()
        .map(|(session, entries)| SessionGpa {
            session: session.to_string(),
            units: entries.iter().map(|(u, _)| u).sum(),
            gpa: grading::gpa(&entries),
        })
        .collect();

    let cgpa = grading::gpa(&weights(all));
    StudentResults {
        student,
        gpa: grading::gpa(&weights(&shown)),
        results: shown,
        sessions,
        cgpa,
        total_units: all.iter().map(|l| l.units).sum(),
        degree_class: grading::classify(cgpa).into(),
    }
}

/// Points for a stored grade letter; unknown letters count as F.
pub fn grade_points(grade: &str) -> i32 {
    grade.parse::<Grade>().map(|g| g.points()).unwrap_or(0)
}
