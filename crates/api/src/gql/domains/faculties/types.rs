use async_graphql::dataloader::DataLoader;
use async_graphql::{ComplexObject, Context, InputObject, Result, SimpleObject, ID};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::gql::error::DbResultExt;
use crate::gql::loaders::UserLoader;
use crate::gql::types::{Department, User};
use crate::state::AppState;
use infra::models::FacultyRow;

#[derive(SimpleObject, Clone)]
#[graphql(complex)]
pub struct Faculty {
    pub id: ID,
    pub code: String,
    pub name: String,
    pub dean_id: Option<ID>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<FacultyRow> for Faculty {
    fn from(row: FacultyRow) -> Self {
        Self {
            id: row.id.into(),
            code: row.code,
            name: row.name,
            dean_id: row.dean_id.map(|id| id.into()),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[ComplexObject]
impl Faculty {
    async fn dean(&self, ctx: &Context<'_>) -> Result<Option<User>> {
        let Some(dean_id) = &self.dean_id else {
            return Ok(None);
        };
        let dean_id = Uuid::parse_str(dean_id.as_str())?;

        let loader = ctx.data::<DataLoader<UserLoader>>()?;
        let row = loader
            .load_one(dean_id)
            .await
            .map_err(|e| async_graphql::Error::new(e.to_string()))?;

        Ok(row.map(User::from))
    }

    async fn departments(&self, ctx: &Context<'_>) -> Result<Vec<Department>> {
        let state = ctx.data::<AppState>()?;
        let faculty_id = Uuid::parse_str(self.id.as_str())?;

        let rows = infra::repos::departments::list(&state.db, Some(faculty_id))
            .await
            .db()?;
        Ok(rows.into_iter().map(Department::from).collect())
    }
}

#[derive(InputObject)]
pub struct CreateFacultyInput {
    pub code: String,
    pub name: String,
}

#[derive(InputObject, Default)]
pub struct UpdateFacultyInput {
    pub code: Option<String>,
    pub name: Option<String>,
}
