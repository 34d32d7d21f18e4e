use async_graphql::{Context, Object, Result};
use serde_json::json;
use uuid::Uuid;

use crate::auth::permissions::{require_admin, require_auth};
use crate::gql::common::helpers::ensure_user_role;
use crate::gql::common::validation;
use crate::gql::domains::audit_log::{self, entity};
use crate::gql::error::{DbResultExt, GqlError};
use crate::gql::types::{CreateDepartmentInput, Department, Role, UpdateDepartmentInput};
use crate::state::AppState;
use infra::repos::departments::{self, CreateDepartmentData, UpdateDepartmentData};

#[derive(Default)]
pub struct DepartmentQuery;

#[Object]
impl DepartmentQuery {
    async fn departments(
        &self,
        ctx: &Context<'_>,
        faculty_id: Option<Uuid>,
    ) -> Result<Vec<Department>> {
        let _user = require_auth(ctx).await?;
        let state = ctx.data::<AppState>()?;

        let rows = departments::list(&state.db, faculty_id).await.db()?;
        Ok(rows.into_iter().map(Department::from).collect())
    }

    async fn department(&self, ctx: &Context<'_>, id: Uuid) -> Result<Option<Department>> {
        let _user = require_auth(ctx).await?;
        let state = ctx.data::<AppState>()?;

        let row = departments::get_by_id(&state.db, id).await.db()?;
        Ok(row.map(Department::from))
    }
}

#[derive(Default)]
pub struct DepartmentMutation;

#[Object]
impl DepartmentMutation {
    async fn create_department(
        &self,
        ctx: &Context<'_>,
        input: CreateDepartmentInput,
    ) -> Result<Department> {
        let admin = require_admin(ctx).await?;
        let state = ctx.data::<AppState>()?;

        let data = CreateDepartmentData {
            faculty_id: input.faculty_id,
            code: validation::code("code", &input.code)?,
            name: validation::required("name", &input.name)?,
        };

        let mut tx = state.db.begin().await.db()?;
        let row = departments::create(&mut *tx, data).await.db()?;
        let entry = audit_log::record(
            &mut *tx,
            &admin,
            "department.create",
            entity::DEPARTMENT,
            Some(row.id),
            json!({ "code": row.code, "name": row.name, "facultyId": row.faculty_id }),
        )
        .await
        .db()?;
        tx.commit().await.db()?;
        audit_log::publish([entry]);

        Ok(row.into())
    }

    async fn update_department(
        &self,
        ctx: &Context<'_>,
        id: Uuid,
        input: UpdateDepartmentInput,
    ) -> Result<Department> {
        let admin = require_admin(ctx).await?;
        let state = ctx.data::<AppState>()?;

        let data = UpdateDepartmentData {
            faculty_id: input.faculty_id,
            code: input.code.as_deref().map(|c| validation::code("code", c)).transpose()?,
            name: input.name.as_deref().map(|n| validation::required("name", n)).transpose()?,
        };
        let changes = json!({ "facultyId": data.faculty_id, "code": data.code, "name": data.name });

        let mut tx = state.db.begin().await.db()?;
        let row = departments::update(&mut *tx, id, data)
            .await
            .db()?
            .ok_or_else(|| GqlError::not_found("Department"))?;
        let entry = audit_log::record(
            &mut *tx,
            &admin,
            "department.update",
            entity::DEPARTMENT,
            Some(id),
            changes,
        )
        .await
        .db()?;
        tx.commit().await.db()?;
        audit_log::publish([entry]);

        Ok(row.into())
    }

    /// Fails while courses, staff or students still belong to the department.
    async fn delete_department(&self, ctx: &Context<'_>, id: Uuid) -> Result<bool> {
        let admin = require_admin(ctx).await?;
        let state = ctx.data::<AppState>()?;

        let mut tx = state.db.begin().await.db()?;
        let existing = departments::get_by_id(&mut *tx, id)
            .await
            .db()?
            .ok_or_else(|| GqlError::not_found("Department"))?;
        departments::delete(&mut *tx, id).await.db()?;
        let entry = audit_log::record(
            &mut *tx,
            &admin,
            "department.delete",
            entity::DEPARTMENT,
            Some(id),
            json!({ "code": existing.code }),
        )
        .await
        .db()?;
        tx.commit().await.db()?;
        audit_log::publish([entry]);

        Ok(true)
    }

    /// Set or clear (`userId: null`) the head of a department.
    async fn assign_hod(
        &self,
        ctx: &Context<'_>,
        department_id: Uuid,
        user_id: Option<Uuid>,
    ) -> Result<Department> {
        let admin = require_admin(ctx).await?;
        let state = ctx.data::<AppState>()?;

        let mut tx = state.db.begin().await.db()?;
        if let Some(user_id) = user_id {
            ensure_user_role(&mut *tx, user_id, Role::Hod).await?;
        }

        let row = departments::set_hod(&mut *tx, department_id, user_id)
            .await
            .db()?
            .ok_or_else(|| GqlError::not_found("Department"))?;
        let entry = audit_log::record(
            &mut *tx,
            &admin,
            "department.assign_hod",
            entity::DEPARTMENT,
            Some(department_id),
            json!({ "hodId": user_id }),
        )
        .await
        .db()?;
        tx.commit().await.db()?;
        audit_log::publish([entry]);

        Ok(row.into())
    }
}
