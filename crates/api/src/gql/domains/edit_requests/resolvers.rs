use async_graphql::{Context, Object, Result};
use serde_json::json;
use uuid::Uuid;

use crate::auth::permissions::{
    approver_stage, in_scope, require_any_role, require_auth, APPROVER_ROLES, STAFF_ROLES,
};
use crate::gql::common::helpers::page;
use crate::gql::common::validation;
use crate::gql::domains::audit_log::{self, entity};
use crate::gql::domains::results::service;
use crate::gql::error::{DbResultExt, GqlError};
use crate::gql::types::{EditRequest, EditRequestStatus, PaginatedResponse, PaginationInput};
use crate::state::AppState;
use infra::db::is_unique_violation;
use infra::grading;
use infra::models::{self, ResultScopeRow};
use infra::repos::{
    result_edit_requests::{self, CreateEditRequestData, ReviewerFilter},
    results,
};
use infra::workflow::{self, Stage};

const CANCELLED_COMMENT: &str = "cancelled by requester";

#[derive(Default)]
pub struct EditRequestQuery;

#[Object]
impl EditRequestQuery {
    /// Requests routed to the caller's stage, within the departments or
    /// faculties they lead. Newest first.
    async fn edit_requests(
        &self,
        ctx: &Context<'_>,
        status: Option<EditRequestStatus>,
        pagination: Option<PaginationInput>,
    ) -> Result<PaginatedResponse<EditRequest>> {
        let actor = require_any_role(ctx, &APPROVER_ROLES).await?;
        let stage = approver_stage(&actor)?;
        let state = ctx.data::<AppState>()?;

        let filter = ReviewerFilter {
            reviewer_role: stage.as_str().to_string(),
            hod_id: (stage == Stage::Hod).then_some(actor.id),
            dean_id: (stage == Stage::Dean).then_some(actor.id),
            status: status.map(Into::into),
        };
        let limit_offset = page(pagination);

        let (rows, total_count) = tokio::try_join!(
            result_edit_requests::list_for_reviewer(&state.db, filter.clone(), Some(limit_offset)),
            result_edit_requests::count_for_reviewer(&state.db, filter)
        )
        .db()?;

        let items = rows.into_iter().map(EditRequest::from).collect();
        Ok(PaginatedResponse::new(items, total_count, limit_offset))
    }

    async fn my_edit_requests(&self, ctx: &Context<'_>) -> Result<Vec<EditRequest>> {
        let actor = require_auth(ctx).await?;
        let state = ctx.data::<AppState>()?;

        let rows = result_edit_requests::list_by_requester(&state.db, actor.id)
            .await
            .db()?;
        Ok(rows.into_iter().map(EditRequest::from).collect())
    }
}

async fn lock_result_scope(
    conn: &mut sqlx::PgConnection,
    result_id: Uuid,
) -> Result<ResultScopeRow, GqlError> {
    results::lock_scopes(&mut *conn, &[result_id])
        .await
        .db()?
        .into_iter()
        .next()
        .ok_or_else(|| GqlError::not_found("Result"))
}

#[derive(Default)]
pub struct EditRequestMutation;

#[Object]
impl EditRequestMutation {
    /// Ask for a score correction on a result that has left the lecturer's
    /// hands. The reviewer is decided by how far the result has progressed.
    async fn request_result_edit(
        &self,
        ctx: &Context<'_>,
        result_id: Uuid,
        proposed_ca_score: i32,
        proposed_exam_score: i32,
        reason: String,
    ) -> Result<EditRequest> {
        let actor = require_any_role(ctx, &STAFF_ROLES).await?;
        let state = ctx.data::<AppState>()?;

        let reason = validation::required("reason", &reason)?;
        let scored = grading::validate_scores(proposed_ca_score, proposed_exam_score)
            .map_err(GqlError::from)?;

        let mut tx = state.db.begin().await.db()?;
        let scope = lock_result_scope(&mut *tx, result_id).await?;
        if !in_scope(Stage::Lecturer, actor.id, &scope) {
            return Err(
                GqlError::forbidden("only the course lecturer can request an edit").into(),
            );
        }
        let reviewer = workflow::ensure_edit_request_allowed(scope.status).map_err(GqlError::from)?;

        if result_edit_requests::has_pending(&mut *tx, result_id).await.db()? {
            return Err(GqlError::invalid("A pending edit request already exists for this result").into());
        }

        let row = result_edit_requests::create(
            &mut *tx,
            CreateEditRequestData {
                result_id,
                requested_by: actor.id,
                reason,
                proposed_ca_score: scored.ca_score,
                proposed_exam_score: scored.exam_score,
                reviewer_role: reviewer.as_str().to_string(),
            },
        )
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                GqlError::invalid("A pending edit request already exists for this result")
            } else {
                GqlError::from(e)
            }
        })?;

        let entry = audit_log::record(
            &mut *tx,
            &actor,
            "edit_request.create",
            entity::EDIT_REQUEST,
            Some(row.id),
            json!({
                "resultId": result_id,
                "resultStatus": scope.status.as_str(),
                "reviewerRole": row.reviewer_role,
                "proposedCaScore": row.proposed_ca_score,
                "proposedExamScore": row.proposed_exam_score,
            }),
        )
        .await
        .db()?;
        tx.commit().await.db()?;
        audit_log::publish([entry]);

        tracing::info!(edit_request_id = %row.id, result_id = %result_id, reviewer = reviewer.as_str(), "Edit request filed");
        Ok(row.into())
    }

    /// Approve or reject a pending request. The reviewer is the stage the
    /// result's current status calls for. Approval writes the proposed
    /// scores and returns the result to draft for resubmission.
    async fn review_edit_request(
        &self,
        ctx: &Context<'_>,
        id: Uuid,
        approve: bool,
        comment: Option<String>,
    ) -> Result<EditRequest> {
        let actor = require_any_role(ctx, &APPROVER_ROLES).await?;
        let stage = approver_stage(&actor)?;
        let state = ctx.data::<AppState>()?;
        let comment = validation::optional(comment);

        let mut tx = state.db.begin().await.db()?;
        let request = result_edit_requests::lock_by_id(&mut *tx, id)
            .await
            .db()?
            .ok_or_else(|| GqlError::not_found("Edit request"))?;
        if request.status != models::EditRequestStatus::Pending {
            return Err(GqlError::invalid(format!(
                "Edit request is already {}",
                request.status.as_str()
            ))
            .into());
        }

        let scope = lock_result_scope(&mut *tx, request.result_id).await?;
        workflow::ensure_edit_reviewer(scope.status, stage).map_err(GqlError::from)?;
        if !in_scope(stage, actor.id, &scope) {
            return Err(GqlError::forbidden("this result is outside your scope").into());
        }

        let mut entries = Vec::with_capacity(2);
        let mut events = Vec::with_capacity(1);

        let status = if approve {
            let scored = grading::validate_scores(request.proposed_ca_score, request.proposed_exam_score)
                .map_err(GqlError::from)?;
            let before = results::get_by_id(&mut *tx, request.result_id)
                .await
                .db()?
                .ok_or_else(|| GqlError::not_found("Result"))?;
            let corrected = results::apply_correction(
                &mut *tx,
                request.result_id,
                scored.ca_score,
                scored.exam_score,
                scored.total_score,
                scored.grade.as_str(),
            )
            .await
            .db()?;

            entries.push(
                audit_log::record(
                    &mut *tx,
                    &actor,
                    "result.correct",
                    entity::RESULT,
                    Some(corrected.id),
                    json!({
                        "editRequestId": request.id,
                        "from": { "caScore": before.ca_score, "examScore": before.exam_score, "grade": before.grade, "status": before.status.as_str() },
                        "to": { "caScore": corrected.ca_score, "examScore": corrected.exam_score, "grade": corrected.grade, "status": corrected.status.as_str() },
                    }),
                )
                .await
                .db()?,
            );
            events.push(service::status_event(&corrected, Some(scope.status), &actor));
            models::EditRequestStatus::Approved
        } else {
            models::EditRequestStatus::Rejected
        };

        let row = result_edit_requests::resolve(&mut *tx, id, status, Some(actor.id), comment.as_deref())
            .await
            .db()?;
        let action = if approve { "edit_request.approve" } else { "edit_request.reject" };
        entries.push(
            audit_log::record(
                &mut *tx,
                &actor,
                action,
                entity::EDIT_REQUEST,
                Some(id),
                json!({ "resultId": request.result_id, "comment": comment }),
            )
            .await
            .db()?,
        );

        tx.commit().await.db()?;
        service::publish(entries, events);

        tracing::info!(edit_request_id = %id, approved = approve, stage = stage.as_str(), "Edit request reviewed");
        Ok(row.into())
    }

    /// Withdraw a pending request the caller filed.
    async fn cancel_edit_request(&self, ctx: &Context<'_>, id: Uuid) -> Result<EditRequest> {
        let actor = require_auth(ctx).await?;
        let state = ctx.data::<AppState>()?;

        let mut tx = state.db.begin().await.db()?;
        let request = result_edit_requests::lock_by_id(&mut *tx, id)
            .await
            .db()?
            .ok_or_else(|| GqlError::not_found("Edit request"))?;
        if request.requested_by != actor.id {
            return Err(GqlError::forbidden("only the requester can cancel an edit request").into());
        }
        if request.status != models::EditRequestStatus::Pending {
            return Err(GqlError::invalid(format!(
                "Edit request is already {}",
                request.status.as_str()
            ))
            .into());
        }

        let row = result_edit_requests::resolve(
            &mut *tx,
            id,
            models::EditRequestStatus::Rejected,
            None,
            Some(CANCELLED_COMMENT),
        )
        .await
        .db()?;
        let entry = audit_log::record(
            &mut *tx,
            &actor,
            "edit_request.cancel",
            entity::EDIT_REQUEST,
            Some(id),
            json!({ "resultId": request.result_id }),
        )
        .await
        .db()?;
        tx.commit().await.db()?;
        audit_log::publish([entry]);

        Ok(row.into())
    }
}
