use async_graphql::MergedObject;

use crate::gql::domains::auth::AuthMutation;
use crate::gql::domains::courses::CourseMutation;
use crate::gql::domains::departments::DepartmentMutation;
use crate::gql::domains::edit_requests::EditRequestMutation;
use crate::gql::domains::faculties::FacultyMutation;
use crate::gql::domains::results::ResultMutation;
use crate::gql::domains::staff::StaffMutation;
use crate::gql::domains::students::StudentMutation;
use crate::gql::domains::users::UserMutation;

#[derive(MergedObject, Default)]
pub struct MutationRoot(
    AuthMutation,
    CourseMutation,
    DepartmentMutation,
    EditRequestMutation,
    FacultyMutation,
    ResultMutation,
    StaffMutation,
    StudentMutation,
    UserMutation,
);
