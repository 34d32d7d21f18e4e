use async_graphql::{Enum, InputObject, OutputType, SimpleObject, ID};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use infra::models::UserRow;
use infra::pagination::LimitOffset;

pub use crate::gql::domains::audit_log::types::*;
pub use crate::gql::domains::courses::types::*;
pub use crate::gql::domains::dashboards::types::*;
pub use crate::gql::domains::departments::types::*;
pub use crate::gql::domains::edit_requests::types::*;
pub use crate::gql::domains::faculties::types::*;
pub use crate::gql::domains::results::types::*;
pub use crate::gql::domains::staff::types::*;
pub use crate::gql::domains::students::types::*;
pub use crate::gql::domains::users::types::*;

#[derive(Enum, Copy, Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Lecturer,
    Hod,
    Dean,
    Senate,
    Student,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Lecturer => "lecturer",
            Role::Hod => "hod",
            Role::Dean => "dean",
            Role::Senate => "senate",
            Role::Student => "student",
        }
    }

    pub fn is_staff(&self) -> bool {
        matches!(self, Role::Lecturer | Role::Hod | Role::Dean | Role::Senate)
    }
}

impl From<String> for Role {
    fn from(role: String) -> Self {
        match role.as_str() {
            "admin" => Role::Admin,
            "lecturer" => Role::Lecturer,
            "hod" => Role::Hod,
            "dean" => Role::Dean,
            "senate" => Role::Senate,
            _ => Role::Student, // least privileged
        }
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

#[derive(SimpleObject, Clone, Debug, Serialize)]
pub struct User {
    pub id: ID,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id.into(),
            email: row.email,
            first_name: row.first_name,
            last_name: row.last_name,
            phone: row.phone,
            role: Role::from(row.role),
            is_active: row.is_active,
            created_at: row.created_at,
        }
    }
}

#[derive(Enum, Copy, Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub enum ResultStatus {
    Draft,
    Submitted,
    HodApproved,
    DeanApproved,
    Approved,
    Rejected,
}

impl From<infra::workflow::ResultStatus> for ResultStatus {
    fn from(status: infra::workflow::ResultStatus) -> Self {
        use infra::workflow::ResultStatus as S;
        match status {
            S::Draft => ResultStatus::Draft,
            S::Submitted => ResultStatus::Submitted,
            S::HodApproved => ResultStatus::HodApproved,
            S::DeanApproved => ResultStatus::DeanApproved,
            S::Approved => ResultStatus::Approved,
            S::Rejected => ResultStatus::Rejected,
        }
    }
}

impl From<ResultStatus> for infra::workflow::ResultStatus {
    fn from(status: ResultStatus) -> Self {
        use infra::workflow::ResultStatus as S;
        match status {
            ResultStatus::Draft => S::Draft,
            ResultStatus::Submitted => S::Submitted,
            ResultStatus::HodApproved => S::HodApproved,
            ResultStatus::DeanApproved => S::DeanApproved,
            ResultStatus::Approved => S::Approved,
            ResultStatus::Rejected => S::Rejected,
        }
    }
}

#[derive(Enum, Copy, Clone, Eq, PartialEq, Debug)]
pub enum EditRequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl From<infra::models::EditRequestStatus> for EditRequestStatus {
    fn from(status: infra::models::EditRequestStatus) -> Self {
        use infra::models::EditRequestStatus as S;
        match status {
            S::Pending => EditRequestStatus::Pending,
            S::Approved => EditRequestStatus::Approved,
            S::Rejected => EditRequestStatus::Rejected,
        }
    }
}

impl From<EditRequestStatus> for infra::models::EditRequestStatus {
    fn from(status: EditRequestStatus) -> Self {
        use infra::models::EditRequestStatus as S;
        match status {
            EditRequestStatus::Pending => S::Pending,
            EditRequestStatus::Approved => S::Approved,
            EditRequestStatus::Rejected => S::Rejected,
        }
    }
}

#[derive(InputObject, Clone, Copy, Default)]
pub struct PaginationInput {
    pub limit: Option<i32>,
    pub offset: Option<i32>,
}

impl PaginationInput {
    pub fn to_limit_offset(&self) -> LimitOffset {
        LimitOffset::new(self.limit.map(i64::from), self.offset.map(i64::from))
    }
}

#[derive(SimpleObject)]
#[graphql(concrete(name = "PaginatedUsers", params(User)))]
#[graphql(concrete(name = "PaginatedStaff", params(Staff)))]
#[graphql(concrete(name = "PaginatedStudents", params(Student)))]
#[graphql(concrete(name = "PaginatedCourses", params(Course)))]
#[graphql(concrete(name = "PaginatedResults", params(CourseResult)))]
#[graphql(concrete(name = "PaginatedEditRequests", params(EditRequest)))]
#[graphql(concrete(name = "PaginatedAuditLogs", params(AuditLogEntry)))]
pub struct PaginatedResponse<T: OutputType> {
    pub items: Vec<T>,
    pub total_count: i32,
    pub page_size: i32,
    pub offset: i32,
    pub has_next_page: bool,
}

impl<T: OutputType> PaginatedResponse<T> {
    pub fn new(items: Vec<T>, total_count: i64, page: LimitOffset) -> Self {
        let page_size = items.len() as i32;
        let offset = page.offset as i32;
        let total_count = total_count as i32;
        Self {
            items,
            total_count,
            page_size,
            offset,
            has_next_page: (offset + page_size) < total_count,
        }
    }
}
