use async_graphql::{Context, Object, Result};
use serde_json::json;
use uuid::Uuid;

use crate::auth::permissions::{require_admin, require_any_role, STAFF_ROLES};
use crate::auth::PasswordService;
use crate::gql::common::helpers::{create_account, page};
use crate::gql::common::validation;
use crate::gql::domains::audit_log::{self, entity};
use crate::gql::error::{DbResultExt, GqlError, ResultExt};
use crate::gql::types::{
    CreateStudentInput, CreateStudentPayload, PaginatedResponse, PaginationInput, Role, Student,
    StudentFilterInput, UpdateStudentInput,
};
use crate::state::AppState;
use infra::repos::{
    students::{self, CreateStudentData, StudentFilter, UpdateStudentData},
    users::{self, CreateUserData, UpdateUserData},
};

fn student_viewers() -> Vec<Role> {
    let mut roles = STAFF_ROLES.to_vec();
    roles.push(Role::Admin);
    roles
}

#[derive(Default)]
pub struct StudentQuery;

#[Object]
impl StudentQuery {
    /// Student register, for admins and staff
    async fn students(
        &self,
        ctx: &Context<'_>,
        filter: Option<StudentFilterInput>,
        pagination: Option<PaginationInput>,
    ) -> Result<PaginatedResponse<Student>> {
        let _viewer = require_any_role(ctx, &student_viewers()).await?;
        let state = ctx.data::<AppState>()?;

        let filter = StudentFilter::from(filter.unwrap_or_default());
        let limit_offset = page(pagination);

        let (rows, total_count) = tokio::try_join!(
            students::list(&state.db, filter.clone(), Some(limit_offset)),
            students::count(&state.db, filter)
        )
        .db()?;

        let items = rows.into_iter().map(Student::from).collect();
        Ok(PaginatedResponse::new(items, total_count, limit_offset))
    }

    async fn student(&self, ctx: &Context<'_>, id: Uuid) -> Result<Option<Student>> {
        let _viewer = require_any_role(ctx, &student_viewers()).await?;
        let state = ctx.data::<AppState>()?;

        let row = students::get_by_id(&state.db, id).await.db()?;
        Ok(row.map(Student::from))
    }
}

#[derive(Default)]
pub struct StudentMutation;

#[Object]
impl StudentMutation {
    /// Enrol a student: creates the login account and the student record in
    /// one transaction and returns a one-time password.
    async fn create_student(
        &self,
        ctx: &Context<'_>,
        input: CreateStudentInput,
    ) -> Result<CreateStudentPayload> {
        let admin = require_admin(ctx).await?;
        let state = ctx.data::<AppState>()?;

        let user_data = CreateUserData {
            email: validation::email(&input.email)?,
            password_hash: None,
            first_name: validation::required("firstName", &input.first_name)?,
            last_name: validation::required("lastName", &input.last_name)?,
            phone: validation::optional(input.phone),
            role: Role::Student.as_str().to_string(),
        };
        let matric_number = validation::required("matricNumber", &input.matric_number)?
            .to_uppercase();
        let level = validation::level(input.level)?;
        let entry_year = validation::entry_year(input.entry_year)?;

        let temporary_password = PasswordService::generate_temporary_password();
        let hash =
            PasswordService::hash_password(&temporary_password, state.auth_config().bcrypt_cost)
                .await
                .gql_err("Failed to hash password")?;

        let mut tx = state.db.begin().await.db()?;
        let user = create_account(
            &mut *tx,
            CreateUserData {
                password_hash: Some(hash),
                ..user_data
            },
        )
        .await?;
        let row = students::create(
            &mut *tx,
            CreateStudentData {
                user_id: user.id,
                department_id: input.department_id,
                matric_number,
                level,
                entry_year,
            },
        )
        .await
        .db()?;

        let entry = audit_log::record(
            &mut *tx,
            &admin,
            "student.create",
            entity::STUDENT,
            Some(row.id),
            json!({ "userId": user.id, "matricNumber": row.matric_number }),
        )
        .await
        .db()?;
        tx.commit().await.db()?;
        audit_log::publish([entry]);

        Ok(CreateStudentPayload {
            student: row.into(),
            temporary_password,
        })
    }

    async fn update_student(
        &self,
        ctx: &Context<'_>,
        id: Uuid,
        input: UpdateStudentInput,
    ) -> Result<Student> {
        let admin = require_admin(ctx).await?;
        let state = ctx.data::<AppState>()?;

        let user_data = UpdateUserData {
            email: input.email.as_deref().map(validation::email).transpose()?,
            first_name: input
                .first_name
                .as_deref()
                .map(|v| validation::required("firstName", v))
                .transpose()?,
            last_name: input
                .last_name
                .as_deref()
                .map(|v| validation::required("lastName", v))
                .transpose()?,
            phone: validation::optional(input.phone),
        };
        let student_data = UpdateStudentData {
            department_id: input.department_id,
            matric_number: input
                .matric_number
                .as_deref()
                .map(|v| validation::required("matricNumber", v).map(|m| m.to_uppercase()))
                .transpose()?,
            level: input.level.map(validation::level).transpose()?,
        };
        let changes = json!({
            "email": user_data.email,
            "firstName": user_data.first_name,
            "lastName": user_data.last_name,
            "departmentId": student_data.department_id,
            "matricNumber": student_data.matric_number,
            "level": student_data.level,
        });

        let mut tx = state.db.begin().await.db()?;
        let existing = students::get_by_id(&mut *tx, id)
            .await
            .db()?
            .ok_or_else(|| GqlError::not_found("Student"))?;

        if let Some(email) = &user_data.email {
            if users::email_taken(&mut *tx, email, Some(existing.user_id)).await.db()? {
                return Err(
                    GqlError::invalid(format!("An account with email {} already exists", email))
                        .into(),
                );
            }
        }

        users::update(&mut *tx, existing.user_id, user_data).await.db()?;
        let row = students::update(&mut *tx, id, student_data)
            .await
            .db()?
            .ok_or_else(|| GqlError::not_found("Student"))?;

        let entry = audit_log::record(&mut *tx, &admin, "student.update", entity::STUDENT, Some(id), changes)
            .await
            .db()?;
        tx.commit().await.db()?;
        audit_log::publish([entry]);

        Ok(row.into())
    }

    /// Block the student from logging in. Results are kept.
    async fn deactivate_student(&self, ctx: &Context<'_>, id: Uuid) -> Result<Student> {
        set_student_active(ctx, id, false).await
    }

    async fn reactivate_student(&self, ctx: &Context<'_>, id: Uuid) -> Result<Student> {
        set_student_active(ctx, id, true).await
    }
}

async fn set_student_active(ctx: &Context<'_>, id: Uuid, is_active: bool) -> Result<Student> {
    let admin = require_admin(ctx).await?;
    let state = ctx.data::<AppState>()?;

    let mut tx = state.db.begin().await.db()?;
    let existing = students::get_by_id(&mut *tx, id)
        .await
        .db()?
        .ok_or_else(|| GqlError::not_found("Student"))?;

    users::set_active(&mut *tx, existing.user_id, is_active).await.db()?;
    let row = students::get_by_id(&mut *tx, id)
        .await
        .db()?
        .ok_or_else(|| GqlError::not_found("Student"))?;

    let action = if is_active { "student.reactivate" } else { "student.deactivate" };
    let entry = audit_log::record(
        &mut *tx,
        &admin,
        action,
        entity::STUDENT,
        Some(id),
        json!({ "userId": existing.user_id }),
    )
    .await
    .db()?;
    tx.commit().await.db()?;
    audit_log::publish([entry]);

    Ok(row.into())
}
