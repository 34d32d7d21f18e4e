use async_graphql::dataloader::DataLoader;
use async_graphql::{ComplexObject, Context, Enum, InputObject, Result, SimpleObject, ID};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::gql::loaders::{DepartmentLoader, UserLoader};
use crate::gql::types::{Department, User};
use infra::models::CourseRow;
use infra::repos::courses::CourseFilter;

#[derive(Enum, Copy, Clone, Eq, PartialEq, Debug)]
pub enum Semester {
    First,
    Second,
}

impl Semester {
    pub fn as_str(&self) -> &'static str {
        match self {
            Semester::First => "first",
            Semester::Second => "second",
        }
    }
}

impl From<String> for Semester {
    fn from(s: String) -> Self {
        match s.as_str() {
            "second" => Semester::Second,
            _ => Semester::First,
        }
    }
}

#[derive(SimpleObject, Clone)]
#[graphql(complex)]
pub struct Course {
    pub id: ID,
    pub department_id: ID,
    pub code: String,
    pub title: String,
    pub units: i32,
    pub level: i32,
    pub semester: Semester,
    pub lecturer_id: Option<ID>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CourseRow> for Course {
    fn from(row: CourseRow) -> Self {
        Self {
            id: row.id.into(),
            department_id: row.department_id.into(),
            code: row.code,
            title: row.title,
            units: row.units,
            level: row.level,
            semester: Semester::from(row.semester),
            lecturer_id: row.lecturer_id.map(|id| id.into()),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[ComplexObject]
impl Course {
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

    async fn lecturer(&self, ctx: &Context<'_>) -> Result<Option<User>> {
        let Some(lecturer_id) = &self.lecturer_id else {
            return Ok(None);
        };
        let lecturer_id = Uuid::parse_str(lecturer_id.as_str())?;

        let loader = ctx.data::<DataLoader<UserLoader>>()?;
        let row = loader
            .load_one(lecturer_id)
            .await
            .map_err(|e| async_graphql::Error::new(e.to_string()))?;

        Ok(row.map(User::from))
    }
}

#[derive(InputObject, Default)]
pub struct CourseFilterInput {
    pub department_id: Option<Uuid>,
    pub lecturer_id: Option<Uuid>,
    pub level: Option<i32>,
    pub semester: Option<Semester>,
    pub search: Option<String>,
}

impl From<CourseFilterInput> for CourseFilter {
    fn from(input: CourseFilterInput) -> Self {
        Self {
            department_id: input.department_id,
            lecturer_id: input.lecturer_id,
            level: input.level,
            semester: input.semester.map(|s| s.as_str().to_string()),
            search: input.search.filter(|s| !s.trim().is_empty()),
        }
    }
}

#[derive(InputObject)]
pub struct CreateCourseInput {
    pub department_id: Uuid,
    pub code: String,
    pub title: String,
    pub units: i32,
    pub level: i32,
    pub semester: Semester,
}

#[derive(InputObject, Default)]
pub struct UpdateCourseInput {
    pub department_id: Option<Uuid>,
    pub code: Option<String>,
    pub title: Option<String>,
    pub units: Option<i32>,
    pub level: Option<i32>,
    pub semester: Option<Semester>,
}
