use async_graphql::dataloader::DataLoader;
use async_graphql::{ComplexObject, Context, InputObject, Result, SimpleObject, ID};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::gql::loaders::DepartmentLoader;
use crate::gql::types::Department;
use infra::models::StudentRow;
use infra::repos::students::StudentFilter;

#[derive(SimpleObject, Clone, Debug)]
#[graphql(complex)]
pub struct Student {
    pub id: ID,
    pub user_id: ID,
    pub department_id: ID,
    pub matric_number: String,
    pub level: i32,
    pub entry_year: i32,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<StudentRow> for Student {
    fn from(row: StudentRow) -> Self {
        Self {
            id: row.id.into(),
            user_id: row.user_id.into(),
            department_id: row.department_id.into(),
            matric_number: row.matric_number,
            level: row.level,
            entry_year: row.entry_year,
            email: row.email,
            first_name: row.first_name,
            last_name: row.last_name,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[ComplexObject]
impl Student {
    async fn department(&self, ctx: &Context<'_>) -> Result<Department> {
        let department_id = Uuid::parse_str(self.department_id.as_str())?;
        let loader = ctx.data::<DataLoader<DepartmentLoader>>()?;

        match loader
            .load_one(department_id)
            .await
            .map_err(|e| async_graphql::Error::new(e.to_string()))?
        {
            Some(row) => Ok(row.into()),
            None => Err(async_graphql::Error::new("Department not found")),
        }
    }

    async fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(InputObject, Default)]
pub struct StudentFilterInput {
    pub department_id: Option<Uuid>,
    pub level: Option<i32>,
    pub search: Option<String>,
    pub is_active: Option<bool>,
}

impl From<StudentFilterInput> for StudentFilter {
    fn from(input: StudentFilterInput) -> Self {
        Self {
            department_id: input.department_id,
            level: input.level,
            search: input.search.filter(|s| !s.trim().is_empty()),
            is_active: input.is_active,
        }
    }
}

#[derive(InputObject)]
pub struct CreateStudentInput {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub department_id: Uuid,
    pub matric_number: String,
    pub level: i32,
    pub entry_year: i32,
}

#[derive(InputObject, Default)]
pub struct UpdateStudentInput {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub department_id: Option<Uuid>,
    pub matric_number: Option<String>,
    pub level: Option<i32>,
}

#[derive(SimpleObject)]
pub struct CreateStudentPayload {
    pub student: Student,
    pub temporary_password: String,
}
