use async_graphql::{Context, Object, Result};
use serde_json::json;
use uuid::Uuid;

use crate::auth::permissions::{require_admin, require_auth};
use crate::gql::common::helpers::ensure_user_role;
use crate::gql::common::validation;
use crate::gql::domains::audit_log::{self, entity};
use crate::gql::error::{DbResultExt, GqlError};
use crate::gql::types::{CreateFacultyInput, Faculty, Role, UpdateFacultyInput};
use crate::state::AppState;
use infra::repos::faculties::{self, CreateFacultyData, UpdateFacultyData};

#[derive(Default)]
pub struct FacultyQuery;

#[Object]
impl FacultyQuery {
    async fn faculties(&self, ctx: &Context<'_>) -> Result<Vec<Faculty>> {
        let _user = require_auth(ctx).await?;
        let state = ctx.data::<AppState>()?;

        let rows = faculties::list(&state.db).await.db()?;
        Ok(rows.into_iter().map(Faculty::from).collect())
    }

    async fn faculty(&self, ctx: &Context<'_>, id: Uuid) -> Result<Option<Faculty>> {
        let _user = require_auth(ctx).await?;
        let state = ctx.data::<AppState>()?;

        let row = faculties::get_by_id(&state.db, id).await.db()?;
        Ok(row.map(Faculty::from))
    }
}

#[derive(Default)]
pub struct FacultyMutation;

#[Object]
impl FacultyMutation {
    async fn create_faculty(&self, ctx: &Context<'_>, input: CreateFacultyInput) -> Result<Faculty> {
        let admin = require_admin(ctx).await?;
        let state = ctx.data::<AppState>()?;

        let data = CreateFacultyData {
            code: validation::code("code", &input.code)?,
            name: validation::required("name", &input.name)?,
        };

        let mut tx = state.db.begin().await.db()?;
        let row = faculties::create(&mut *tx, data).await.db()?;
        let entry = audit_log::record(
            &mut *tx,
            &admin,
            "faculty.create",
            entity::FACULTY,
            Some(row.id),
            json!({ "code": row.code, "name": row.name }),
        )
        .await
        .db()?;
        tx.commit().await.db()?;
        audit_log::publish([entry]);

        Ok(row.into())
    }

    async fn update_faculty(
        &self,
        ctx: &Context<'_>,
        id: Uuid,
        input: UpdateFacultyInput,
    ) -> Result<Faculty> {
        let admin = require_admin(ctx).await?;
        let state = ctx.data::<AppState>()?;

        let data = UpdateFacultyData {
            code: input.code.as_deref().map(|c| validation::code("code", c)).transpose()?,
            name: input.name.as_deref().map(|n| validation::required("name", n)).transpose()?,
        };
        let changes = json!({ "code": data.code, "name": data.name });

        let mut tx = state.db.begin().await.db()?;
        let row = faculties::update(&mut *tx, id, data)
            .await
            .db()?
            .ok_or_else(|| GqlError::not_found("Faculty"))?;
        let entry = audit_log::record(&mut *tx, &admin, "faculty.update", entity::FACULTY, Some(id), changes)
            .await
            .db()?;
        tx.commit().await.db()?;
        audit_log::publish([entry]);

        Ok(row.into())
    }

    /// Fails while departments still belong to the faculty.
    async fn delete_faculty(&self, ctx: &Context<'_>, id: Uuid) -> Result<bool> {
        let admin = require_admin(ctx).await?;
        let state = ctx.data::<AppState>()?;

        let mut tx = state.db.begin().await.db()?;
        let existing = faculties::get_by_id(&mut *tx, id)
            .await
            .db()?
            .ok_or_else(|| GqlError::not_found("Faculty"))?;
        faculties::delete(&mut *tx, id).await.db()?;
        let entry = audit_log::record(
            &mut *tx,
            &admin,
            "faculty.delete",
            entity::FACULTY,
            Some(id),
            json!({ "code": existing.code }),
        )
        .await
        .db()?;
        tx.commit().await.db()?;
        audit_log::publish([entry]);

        Ok(true)
    }

    /// Set or clear (`userId: null`) the dean of a faculty.
    async fn assign_dean(
        &self,
        ctx: &Context<'_>,
        faculty_id: Uuid,
        user_id: Option<Uuid>,
    ) -> Result<Faculty> {
        let admin = require_admin(ctx).await?;
        let state = ctx.data::<AppState>()?;

        let mut tx = state.db.begin().await.db()?;
        if let Some(user_id) = user_id {
            ensure_user_role(&mut *tx, user_id, Role::Dean).await?;
        }

        let row = faculties::set_dean(&mut *tx, faculty_id, user_id)
            .await
            .db()?
            .ok_or_else(|| GqlError::not_found("Faculty"))?;
        let entry = audit_log::record(
            &mut *tx,
            &admin,
            "faculty.assign_dean",
            entity::FACULTY,
            Some(faculty_id),
            json!({ "deanId": user_id }),
        )
        .await
        .db()?;
        tx.commit().await.db()?;
        audit_log::publish([entry]);

        Ok(row.into())
    }
}
