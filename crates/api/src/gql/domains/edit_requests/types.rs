use async_graphql::dataloader::DataLoader;
use async_graphql::{ComplexObject, Context, Result, SimpleObject, ID};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::gql::loaders::{ResultLoader, UserLoader};
use crate::gql::types::{CourseResult, EditRequestStatus, Role, User};
use infra::models::EditRequestRow;

/// A lecturer's request to correct scores on a result that is locked in
/// the approval chain.
#[derive(SimpleObject, Clone)]
#[graphql(complex)]
pub struct EditRequest {
    pub id: ID,
    pub result_id: ID,
    pub requested_by: ID,
    pub reason: String,
    pub proposed_ca_score: i32,
    pub proposed_exam_score: i32,
    pub status: EditRequestStatus,
    /// Fixed when the request is filed.
    pub reviewer_role: Role,
    pub reviewed_by: Option<ID>,
    pub review_comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
}

impl From<EditRequestRow> for EditRequest {
    fn from(row: EditRequestRow) -> Self {
        Self {
            id: row.id.into(),
            result_id: row.result_id.into(),
            requested_by: row.requested_by.into(),
            reason: row.reason,
            proposed_ca_score: row.proposed_ca_score,
            proposed_exam_score: row.proposed_exam_score,
            status: row.status.into(),
            reviewer_role: Role::from(row.reviewer_role),
            reviewed_by: row.reviewed_by.map(|id| id.into()),
            review_comment: row.review_comment,
            created_at: row.created_at,
            reviewed_at: row.reviewed_at,
        }
    }
}

#[ComplexObject]
impl EditRequest {
    async fn result(&self, ctx: &Context<'_>) -> Result<CourseResult> {
        let result_id = Uuid::parse_str(self.result_id.as_str())?;
        let loader = ctx.data::<DataLoader<ResultLoader>>()?;

        match loader
            .load_one(result_id)
            .await
            .map_err(|e| async_graphql::Error::new(e.to_string()))?
        {
            Some(row) => Ok(row.into()),
            None => Err(async_graphql::Error::new("Result not found")),
        }
    }

    async fn requester(&self, ctx: &Context<'_>) -> Result<Option<User>> {
        let user_id = Uuid::parse_str(self.requested_by.as_str())?;
        load_user(ctx, user_id).await
    }

    async fn reviewer(&self, ctx: &Context<'_>) -> Result<Option<User>> {
        let Some(reviewed_by) = &self.reviewed_by else {
            return Ok(None);
        };
        let user_id = Uuid::parse_str(reviewed_by.as_str())?;
        load_user(ctx, user_id).await
    }
}

async fn load_user(ctx: &Context<'_>, user_id: Uuid) -> Result<Option<User>> {
    let loader = ctx.data::<DataLoader<UserLoader>>()?;
    let row = loader
        .load_one(user_id)
        .await
        .map_err(|e| async_graphql::Error::new(e.to_string()))?;

    Ok(row.map(User::from))
}
