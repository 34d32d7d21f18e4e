use async_graphql::{Context, Object, Result};

use crate::auth::permissions::{approver_stage, require_admin, require_any_role, require_role, STAFF_ROLES};
use crate::gql::domains::results::service;
use crate::gql::error::{DbResultExt, GqlError};
use crate::gql::types::{
    AdminDashboard, AuditLogEntry, Course, Role, StaffDashboard, StatusCount, StudentDashboard,
    TranscriptLine,
};
use crate::state::AppState;
use infra::models::EditRequestStatus;
use infra::pagination::LimitOffset;
use infra::repos::{
    audit_logs, courses, dashboard, result_edit_requests, result_edit_requests::ReviewerFilter,
    results, results::PendingFilter, students, AuditLogFilter, CourseFilter,
};
use infra::workflow::{self, ResultStatus, Stage};

const RECENT_ACTIVITY: i64 = 10;

#[derive(Default)]
pub struct DashboardQuery;

#[Object]
impl DashboardQuery {
    async fn admin_dashboard(&self, ctx: &Context<'_>) -> Result<AdminDashboard> {
        let _admin = require_admin(ctx).await?;
        let state = ctx.data::<AppState>()?;

        let (counts, by_status, recent) = tokio::try_join!(
            dashboard::entity_counts(&state.db),
            results::count_by_status(&state.db),
            audit_logs::list(
                &state.db,
                AuditLogFilter::default(),
                Some(LimitOffset::new(Some(RECENT_ACTIVITY), None)),
            )
        )
        .db()?;

        let results_by_status = ResultStatus::ALL
            .into_iter()
            .map(|status| StatusCount {
                status: status.into(),
                count: by_status
                    .iter()
                    .find(|(s, _)| *s == status)
                    .map(|(_, n)| *n as i32)
                    .unwrap_or(0),
            })
            .collect();

        Ok(AdminDashboard {
            faculties: counts.faculties as i32,
            departments: counts.departments as i32,
            courses: counts.courses as i32,
            staff: counts.staff as i32,
            students: counts.students as i32,
            active_users: counts.active_users as i32,
            results_by_status,
            recent_activity: recent.into_iter().map(AuditLogEntry::from).collect(),
        })
    }

    async fn staff_dashboard(&self, ctx: &Context<'_>) -> Result<StaffDashboard> {
        let actor = require_any_role(ctx, &STAFF_ROLES).await?;
        let state = ctx.data::<AppState>()?;

        let taught = CourseFilter {
            lecturer_id: Some(actor.id),
            ..Default::default()
        };
        let (course_rows, editable) = tokio::try_join!(
            courses::list(&state.db, taught, None),
            results::count_editable_for_lecturer(&state.db, actor.id)
        )
        .db()?;

        let (pending_approvals, pending_edit_reviews) = match approver_stage(&actor) {
            Ok(stage) => {
                let hod_id = (stage == Stage::Hod).then_some(actor.id);
                let dean_id = (stage == Stage::Dean).then_some(actor.id);
                let status = workflow::status_awaiting(stage)
                    .first()
                    .copied()
                    .ok_or_else(|| GqlError::new("No status awaits this stage"))?;

                tokio::try_join!(
                    results::count_pending(
                        &state.db,
                        PendingFilter {
                            status,
                            hod_id,
                            dean_id,
                            session: None,
                        },
                    ),
                    result_edit_requests::count_for_reviewer(
                        &state.db,
                        ReviewerFilter {
                            reviewer_role: stage.as_str().to_string(),
                            hod_id,
                            dean_id,
                            status: Some(EditRequestStatus::Pending),
                        },
                    )
                )
                .db()?
            }
            Err(_) => (0, 0),
        };

        Ok(StaffDashboard {
            courses: course_rows.into_iter().map(Course::from).collect(),
            editable_results: editable as i32,
            pending_approvals: pending_approvals as i32,
            pending_edit_reviews: pending_edit_reviews as i32,
        })
    }

    async fn student_dashboard(&self, ctx: &Context<'_>) -> Result<StudentDashboard> {
        let actor = require_role(ctx, Role::Student).await?;
        let state = ctx.data::<AppState>()?;

        let student = students::get_by_user_id(&state.db, actor.id)
            .await
            .db()?
            .ok_or_else(|| GqlError::not_found("Student record"))?;
        let lines: Vec<TranscriptLine> = results::list_published_for_student(&state.db, student.id, None)
            .await
            .db()?
            .into_iter()
            .map(TranscriptLine::from)
            .collect();

        let summary = service::summarize(student.into(), Vec::new(), &lines);
        Ok(StudentDashboard {
            student: summary.student,
            published_courses: lines.len() as i32,
            total_units: summary.total_units,
            cgpa: summary.cgpa,
            degree_class: summary.degree_class,
        })
    }
}
