use async_graphql::MergedObject;

use crate::gql::domains::audit_log::AuditLogQuery;
use crate::gql::domains::auth::AuthQuery;
use crate::gql::domains::courses::CourseQuery;
use crate::gql::domains::dashboards::DashboardQuery;
use crate::gql::domains::departments::DepartmentQuery;
use crate::gql::domains::edit_requests::EditRequestQuery;
use crate::gql::domains::faculties::FacultyQuery;
use crate::gql::domains::results::ResultQuery;
use crate::gql::domains::staff::StaffQuery;
use crate::gql::domains::students::StudentQuery;
use crate::gql::domains::users::UserQuery;

#[derive(MergedObject, Default)]
pub struct QueryRoot(
    AuditLogQuery,
    AuthQuery,
    CourseQuery,
    DashboardQuery,
    DepartmentQuery,
    EditRequestQuery,
    FacultyQuery,
    ResultQuery,
    StaffQuery,
    StudentQuery,
    UserQuery,
);
