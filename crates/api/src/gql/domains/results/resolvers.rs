use async_graphql::{Context, Object, Result};
use uuid::Uuid;

use crate::auth::permissions::{
    approver_stage, can_view_course, require_any_role, require_auth, require_role, Actor,
    APPROVER_ROLES, STAFF_ROLES,
};
use crate::gql::common::helpers::{load_course_chain, page};
use crate::gql::common::validation;
use crate::gql::domains::audit_log::entity;
use crate::gql::error::{DbResultExt, GqlError};
use crate::gql::types::{
    AuditLogEntry, CourseResult, PaginatedResponse, PaginationInput, ResultEntryInput,
    ResultStatus, Role, StudentResults, TranscriptLine,
};
use crate::state::AppState;
use infra::repos::{audit_logs, results, results::PendingFilter, students};
use infra::workflow::{self, Stage, WorkflowAction};

use super::service::{self, UpsertResultsParams};

#[derive(Default)]
pub struct ResultQuery;

#[Object]
impl ResultQuery {
    /// Results of one course in one session, ordered by matric number.
    async fn course_results(
        &self,
        ctx: &Context<'_>,
        course_id: Uuid,
        session: String,
        status: Option<ResultStatus>,
    ) -> Result<Vec<CourseResult>> {
        let actor = require_auth(ctx).await?;
        let state = ctx.data::<AppState>()?;

        let chain = load_course_chain(&state.db, course_id).await?;
        if !can_view_course(
            &actor,
            chain.course.lecturer_id,
            chain.department.hod_id,
            chain.faculty.dean_id,
        ) {
            return Err(GqlError::forbidden(format!(
                "you cannot view results of {}",
                chain.course.code
            ))
            .into());
        }

        let rows = results::list_for_course(
            &state.db,
            course_id,
            session.trim(),
            status.map(Into::into),
        )
        .await
        .db()?;

        Ok(rows.into_iter().map(CourseResult::from).collect())
    }

    /// Results waiting for the caller's approval stage, within the
    /// departments or faculties they lead. Oldest first.
    async fn pending_approvals(
        &self,
        ctx: &Context<'_>,
        session: Option<String>,
        pagination: Option<PaginationInput>,
    ) -> Result<PaginatedResponse<CourseResult>> {
        let actor = require_any_role(ctx, &APPROVER_ROLES).await?;
        let state = ctx.data::<AppState>()?;

        let filter = pending_filter(&actor, session)?;
        let limit_offset = page(pagination);

        let (rows, total_count) = tokio::try_join!(
            results::list_pending(&state.db, filter.clone(), Some(limit_offset)),
            results::count_pending(&state.db, filter)
        )
        .db()?;

        let items = rows.into_iter().map(CourseResult::from).collect();
        Ok(PaginatedResponse::new(items, total_count, limit_offset))
    }

    /// The caller's published results. CGPA always covers every session.
    async fn my_results(
        &self,
        ctx: &Context<'_>,
        session: Option<String>,
    ) -> Result<StudentResults> {
        let actor = require_role(ctx, Role::Student).await?;
        let state = ctx.data::<AppState>()?;

        let student = students::get_by_user_id(&state.db, actor.id)
            .await
            .db()?
            .ok_or_else(|| GqlError::not_found("Student record"))?;

        let all: Vec<TranscriptLine> = results::list_published_for_student(&state.db, student.id, None)
            .await
            .db()?
            .into_iter()
            .map(TranscriptLine::from)
            .collect();

        let shown = match session.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(session) => all.iter().filter(|l| l.session == session).cloned().collect(),
            None => all.clone(),
        };

        Ok(service::summarize(student.into(), shown, &all))
    }

    /// Audit trail of one result, oldest first.
    async fn result_history(
        &self,
        ctx: &Context<'_>,
        result_id: Uuid,
    ) -> Result<Vec<AuditLogEntry>> {
        let actor = require_auth(ctx).await?;
        let state = ctx.data::<AppState>()?;

        let result = results::get_by_id(&state.db, result_id)
            .await
            .db()?
            .ok_or_else(|| GqlError::not_found("Result"))?;

        let visible = if actor.role == Role::Student {
            let own = students::get_by_user_id(&state.db, actor.id).await.db()?;
            own.is_some_and(|s| s.id == result.student_id) && workflow::is_published(result.status)
        } else {
            let chain = load_course_chain(&state.db, result.course_id).await?;
            can_view_course(
                &actor,
                chain.course.lecturer_id,
                chain.department.hod_id,
                chain.faculty.dean_id,
            )
        };
        if !visible {
            return Err(GqlError::forbidden("you cannot view this result").into());
        }

        let rows = audit_logs::list_for_entity(&state.db, entity::RESULT, result_id)
            .await
            .db()?;
        Ok(rows.into_iter().map(AuditLogEntry::from).collect())
    }
}

fn pending_filter(actor: &Actor, session: Option<String>) -> Result<PendingFilter> {
    let stage = approver_stage(actor)?;
    let status = workflow::status_awaiting(stage)
        .first()
        .copied()
        .ok_or_else(|| GqlError::new("No status awaits this stage"))?;

    Ok(PendingFilter {
        status,
        hod_id: (stage == Stage::Hod).then_some(actor.id),
        dean_id: (stage == Stage::Dean).then_some(actor.id),
        session: session
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()),
    })
}

#[derive(Default)]
pub struct ResultMutation;

#[Object]
impl ResultMutation {
    /// Record CA and exam scores for students of a course the caller
    /// teaches. Existing results are overwritten while still editable.
    async fn upsert_results(
        &self,
        ctx: &Context<'_>,
        course_id: Uuid,
        session: String,
        entries: Vec<ResultEntryInput>,
    ) -> Result<Vec<CourseResult>> {
        let actor = require_any_role(ctx, &STAFF_ROLES).await?;
        let state = ctx.data::<AppState>()?;

        let rows = service::upsert_results(
            &state.db,
            &actor,
            UpsertResultsParams {
                course_id,
                session,
                entries,
            },
        )
        .await?;

        Ok(rows.into_iter().map(CourseResult::from).collect())
    }

    async fn submit_results(
        &self,
        ctx: &Context<'_>,
        result_ids: Vec<Uuid>,
    ) -> Result<Vec<CourseResult>> {
        let actor = require_any_role(ctx, &STAFF_ROLES).await?;
        let state = ctx.data::<AppState>()?;

        let rows = service::transition_results(
            &state.db,
            &actor,
            &result_ids,
            WorkflowAction::Submit,
            Stage::Lecturer,
            None,
        )
        .await?;

        Ok(rows.into_iter().map(CourseResult::from).collect())
    }

    /// Submit every draft or rejected result of the course for the session.
    async fn submit_course_results(
        &self,
        ctx: &Context<'_>,
        course_id: Uuid,
        session: String,
    ) -> Result<Vec<CourseResult>> {
        let actor = require_any_role(ctx, &STAFF_ROLES).await?;
        let state = ctx.data::<AppState>()?;

        let rows = service::submit_course_results(&state.db, &actor, course_id, &session).await?;
        Ok(rows.into_iter().map(CourseResult::from).collect())
    }

    /// Approve at the caller's stage: HOD, then dean, then senate.
    async fn approve_results(
        &self,
        ctx: &Context<'_>,
        result_ids: Vec<Uuid>,
        comment: Option<String>,
    ) -> Result<Vec<CourseResult>> {
        let actor = require_any_role(ctx, &APPROVER_ROLES).await?;
        let stage = approver_stage(&actor)?;
        let state = ctx.data::<AppState>()?;

        let comment = validation::optional(comment);
        let rows = service::transition_results(
            &state.db,
            &actor,
            &result_ids,
            WorkflowAction::Approve,
            stage,
            comment.as_deref(),
        )
        .await?;

        Ok(rows.into_iter().map(CourseResult::from).collect())
    }

    /// Send results back to the lecturer. The reason is stored on each result.
    async fn reject_results(
        &self,
        ctx: &Context<'_>,
        result_ids: Vec<Uuid>,
        reason: String,
    ) -> Result<Vec<CourseResult>> {
        let actor = require_any_role(ctx, &APPROVER_ROLES).await?;
        let stage = approver_stage(&actor)?;
        let state = ctx.data::<AppState>()?;

        let reason = validation::required("reason", &reason)?;
        let rows = service::transition_results(
            &state.db,
            &actor,
            &result_ids,
            WorkflowAction::Reject,
            stage,
            Some(&reason),
        )
        .await?;

        Ok(rows.into_iter().map(CourseResult::from).collect())
    }
}
