use uuid::Uuid;

use crate::gql::error::{DbResultExt, GqlError};
use crate::gql::types::{PaginationInput, Role};
use infra::models::{CourseRow, DepartmentRow, FacultyRow, UserRow};
use infra::pagination::LimitOffset;
use infra::repos::{courses, departments, faculties, users, users::CreateUserData};

/// A course with the department and faculty that own it.
pub struct CourseChain {
    pub course: CourseRow,
    pub department: DepartmentRow,
    pub faculty: FacultyRow,
}

pub async fn load_course_chain(db: &infra::db::Db, course_id: Uuid) -> Result<CourseChain, GqlError> {
    let course = courses::get_by_id(db, course_id)
        .await
        .db()?
        .ok_or_else(|| GqlError::not_found("Course"))?;
    let department = departments::get_by_id(db, course.department_id)
        .await
        .db()?
        .ok_or_else(|| GqlError::not_found("Department"))?;
    let faculty = faculties::get_by_id(db, department.faculty_id)
        .await
        .db()?
        .ok_or_else(|| GqlError::not_found("Faculty"))?;

    Ok(CourseChain {
        course,
        department,
        faculty,
    })
}

pub fn page(pagination: Option<PaginationInput>) -> LimitOffset {
    pagination.unwrap_or_default().to_limit_offset()
}

/// Load an active account and check it holds `role`, for head-of-unit assignments.
pub async fn ensure_user_role<'e>(
    executor: impl sqlx::PgExecutor<'e>,
    user_id: Uuid,
    role: Role,
) -> Result<UserRow, GqlError> {
    let user = users::get_by_id(executor, user_id)
        .await
        .db()?
        .ok_or_else(|| GqlError::not_found("User"))?;

    if !user.is_active {
        return Err(GqlError::invalid(format!(
            "{} {} is deactivated",
            user.first_name, user.last_name
        )));
    }
    if user.role != role.as_str() {
        return Err(GqlError::invalid(format!(
            "{} {} must have the {} role, not {}",
            user.first_name,
            user.last_name,
            role.as_str(),
            user.role
        )));
    }

    Ok(user)
}

/// Create a login account after checking the email is free.
/// Runs two statements, so pass the open transaction.
pub async fn create_account(
    conn: &mut sqlx::PgConnection,
    data: CreateUserData,
) -> Result<UserRow, GqlError> {
    if users::email_taken(&mut *conn, &data.email, None)
        .await
        .db()?
    {
        return Err(GqlError::invalid(format!(
            "An account with email {} already exists",
            data.email
        )));
    }

    users::create(&mut *conn, data).await.db()
}
