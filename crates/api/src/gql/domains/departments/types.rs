use async_graphql::dataloader::DataLoader;
use async_graphql::{ComplexObject, Context, InputObject, Result, SimpleObject, ID};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::gql::loaders::{FacultyLoader, UserLoader};
use crate::gql::types::{Faculty, User};
use infra::models::DepartmentRow;

#[derive(SimpleObject, Clone)]
#[graphql(complex)]
pub struct Department {
    pub id: ID,
    pub faculty_id: ID,
    pub code: String,
    pub name: String,
    pub hod_id: Option<ID>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DepartmentRow> for Department {
    fn from(row: DepartmentRow) -> Self {
        Self {
            id: row.id.into(),
            faculty_id: row.faculty_id.into(),
            code: row.code,
            name: row.name,
            hod_id: row.hod_id.map(|id| id.into()),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[ComplexObject]
impl Department {
    async fn faculty(&self, ctx: &Context<'_>) -> Result<Faculty> {
        let faculty_id = Uuid::parse_str(self.faculty_id.as_str())?;
        let loader = ctx.data::<DataLoader<FacultyLoader>>()?;

        match loader
            .load_one(faculty_id)
            .await
            .map_err(|e| async_graphql::Error::new(e.to_string()))?
        {
            Some(row) => Ok(row.into()),
            None => Err(async_graphql::Error::new("Faculty not found")),
        }
    }

    async fn hod(&self, ctx: &Context<'_>) -> Result<Option<User>> {
        let Some(hod_id) = &self.hod_id else {
            return Ok(None);
        };
        let hod_id = Uuid::parse_str(hod_id.as_str())?;

        let loader = ctx.data::<DataLoader<UserLoader>>()?;
        let row = loader
            .load_one(hod_id)
            .await
            .map_err(|e| async_graphql::Error::new(e.to_string()))?;

        Ok(row.map(User::from))
    }
}

#[derive(InputObject)]
pub struct CreateDepartmentInput {
    pub faculty_id: Uuid,
    pub code: String,
    pub name: String,
}

#[derive(InputObject, Default)]
pub struct UpdateDepartmentInput {
    pub faculty_id: Option<Uuid>,
    pub code: Option<String>,
    pub name: Option<String>,
}
