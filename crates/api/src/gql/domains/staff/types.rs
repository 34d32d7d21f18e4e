use async_graphql::dataloader::DataLoader;
use async_graphql::{ComplexObject, Context, InputObject, Result, SimpleObject, ID};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::gql::loaders::DepartmentLoader;
use crate::gql::types::{Department, Role};
use infra::models::StaffRow;
use infra::repos::staff::StaffFilter;

/// A staff record with its account details.
#[derive(SimpleObject, Clone)]
#[graphql(complex)]
pub struct Staff {
    pub id: ID,
    pub user_id: ID,
    pub department_id: ID,
    pub staff_number: String,
    pub designation: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<StaffRow> for Staff {
    fn from(row: StaffRow) -> Self {
        Self {
            id: row.id.into(),
            user_id: row.user_id.into(),
            department_id: row.department_id.into(),
            staff_number: row.staff_number,
            designation: row.designation,
            email: row.email,
            first_name: row.first_name,
            last_name: row.last_name,
            role: Role::from(row.role),
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[ComplexObject]
impl Staff {
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
}

#[derive(InputObject, Default)]
pub struct StaffFilterInput {
    pub department_id: Option<Uuid>,
    pub role: Option<Role>,
    pub search: Option<String>,
    pub is_active: Option<bool>,
}

impl From<StaffFilterInput> for StaffFilter {
    fn from(input: StaffFilterInput) -> Self {
        Self {
            department_id: input.department_id,
            role: input.role.map(String::from),
            search: input.search.filter(|s| !s.trim().is_empty()),
            is_active: input.is_active,
        }
    }
}

#[derive(InputObject)]
pub struct CreateStaffInput {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    /// One of lecturer, hod, dean or senate
    pub role: Role,
    pub department_id: Uuid,
    pub staff_number: String,
    pub designation: String,
}

#[derive(InputObject, Default)]
pub struct UpdateStaffInput {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub department_id: Option<Uuid>,
    pub staff_number: Option<String>,
    pub designation: Option<String>,
}

/// A new staff member and the one-time password to hand over.
#[derive(SimpleObject)]
pub struct CreateStaffPayload {
    pub staff: Staff,
    pub temporary_password: String,
}
