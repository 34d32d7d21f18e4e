use async_graphql::{Context, Object, Result};
use serde_json::json;
use uuid::Uuid;

use crate::auth::permissions::{require_admin, require_auth};
use crate::gql::common::helpers::page;
use crate::gql::common::validation;
use crate::gql::domains::audit_log::{self, entity};
use crate::gql::error::{DbResultExt, GqlError};
use crate::gql::types::{
    Course, CourseFilterInput, CreateCourseInput, PaginatedResponse, PaginationInput,
    UpdateCourseInput,
};
use crate::state::AppState;
use infra::repos::{
    courses::{self, CourseFilter, CreateCourseData, UpdateCourseData},
    staff,
};

#[derive(Default)]
pub struct CourseQuery;

#[Object]
impl CourseQuery {
    async fn courses(
        &self,
        ctx: &Context<'_>,
        filter: Option<CourseFilterInput>,
        pagination: Option<PaginationInput>,
    ) -> Result<PaginatedResponse<Course>> {
        let _user = require_auth(ctx).await?;
        let state = ctx.data::<AppState>()?;

        let filter = CourseFilter::from(filter.unwrap_or_default());
        let limit_offset = page(pagination);

        let (rows, total_count) = tokio::try_join!(
            courses::list(&state.db, filter.clone(), Some(limit_offset)),
            courses::count(&state.db, filter)
        )
        .db()?;

        let items = rows.into_iter().map(Course::from).collect();
        Ok(PaginatedResponse::new(items, total_count, limit_offset))
    }

    async fn course(&self, ctx: &Context<'_>, id: Uuid) -> Result<Option<Course>> {
        let _user = require_auth(ctx).await?;
        let state = ctx.data::<AppState>()?;

        let row = courses::get_by_id(&state.db, id).await.db()?;
        Ok(row.map(Course::from))
    }

    /// Courses the caller teaches
    async fn my_courses(&self, ctx: &Context<'_>) -> Result<Vec<Course>> {
        let actor = require_auth(ctx).await?;
        let state = ctx.data::<AppState>()?;

        let filter = CourseFilter {
            lecturer_id: Some(actor.id),
            ..Default::default()
        };
        let rows = courses::list(&state.db, filter, None).await.db()?;
        Ok(rows.into_iter().map(Course::from).collect())
    }
}

#[derive(Default)]
pub struct CourseMutation;

#[Object]
impl CourseMutation {
    async fn create_course(&self, ctx: &Context<'_>, input: CreateCourseInput) -> Result<Course> {
        let admin = require_admin(ctx).await?;
        let state = ctx.data::<AppState>()?;

        let data = CreateCourseData {
            department_id: input.department_id,
            code: validation::code("code", &input.code)?,
            title: validation::required("title", &input.title)?,
            units: validation::units(input.units)?,
            level: validation::level(input.level)?,
            semester: input.semester.as_str().to_string(),
        };

        let mut tx = state.db.begin().await.db()?;
        let row = courses::create(&mut *tx, data).await.db()?;
        let entry = audit_log::record(
            &mut *tx,
            &admin,
            "course.create",
            entity::COURSE,
            Some(row.id),
            json!({ "code": row.code, "departmentId": row.department_id }),
        )
        .await
        .db()?;
        tx.commit().await.db()?;
        audit_log::publish([entry]);

        Ok(row.into())
    }

    async fn update_course(
        &self,
        ctx: &Context<'_>,
        id: Uuid,
        input: UpdateCourseInput,
    ) -> Result<Course> {
        let admin = require_admin(ctx).await?;
        let state = ctx.data::<AppState>()?;

        let data = UpdateCourseData {
            department_id: input.department_id,
            code: input.code.as_deref().map(|c| validation::code("code", c)).transpose()?,
            title: input
                .title
                .as_deref()
                .map(|t| validation::required("title", t))
                .transpose()?,
            units: input.units.map(validation::units).transpose()?,
            level: input.level.map(validation::level).transpose()?,
            semester: input.semester.map(|s| s.as_str().to_string()),
        };
        let changes = json!({
            "departmentId": data.department_id,
            "code": data.code,
            "title": data.title,
            "units": data.units,
            "level": data.level,
            "semester": data.semester,
        });

        let mut tx = state.db.begin().await.db()?;
        let row = courses::update(&mut *tx, id, data)
            .await
            .db()?
            .ok_or_else(|| GqlError::not_found("Course"))?;
        let entry = audit_log::record(&mut *tx, &admin, "course.update", entity::COURSE, Some(id), changes)
            .await
            .db()?;
        tx.commit().await.db()?;
        audit_log::publish([entry]);

        Ok(row.into())
    }

    /// Fails once results have been recorded for the course.
    async fn delete_course(&self, ctx: &Context<'_>, id: Uuid) -> Result<bool> {
        let admin = require_admin(ctx).await?;
        let state = ctx.data::<AppState>()?;

        let mut tx = state.db.begin().await.db()?;
        let existing = courses::get_by_id(&mut *tx, id)
            .await
            .db()?
            .ok_or_else(|| GqlError::not_found("Course"))?;
        courses::delete(&mut *tx, id).await.db()?;
        let entry = audit_log::record(
            &mut *tx,
            &admin,
            "course.delete",
            entity::COURSE,
            Some(id),
            json!({ "code": existing.code }),
        )
        .await
        .db()?;
        tx.commit().await.db()?;
        audit_log::publish([entry]);

        Ok(true)
    }

    /// Set or clear (`userId: null`) the lecturer of a course. The lecturer
    /// must be an active staff member; any staff role may teach.
    async fn assign_lecturer(
        &self,
        ctx: &Context<'_>,
        course_id: Uuid,
        user_id: Option<Uuid>,
    ) -> Result<Course> {
        let admin = require_admin(ctx).await?;
        let state = ctx.data::<AppState>()?;

        let mut tx = state.db.begin().await.db()?;
        if let Some(user_id) = user_id {
            let member = staff::get_by_user_id(&mut *tx, user_id)
                .await
                .db()?
                .ok_or_else(|| GqlError::invalid("Lecturer must be a staff member"))?;
            if !member.is_active {
                return Err(GqlError::invalid(format!(
                    "{} {} is deactivated",
                    member.first_name, member.last_name
                ))
                .into());
            }
        }

        let row = courses::set_lecturer(&mut *tx, course_id, user_id)
            .await
            .db()?
            .ok_or_else(|| GqlError::not_found("Course"))?;
        let entry = audit_log::record(
            &mut *tx,
            &admin,
            "course.assign_lecturer",
            entity::COURSE,
            Some(course_id),
            json!({ "lecturerId": user_id }),
        )
        .await
        .db()?;
        tx.commit().await.db()?;
        audit_log::publish([entry]);

        Ok(row.into())
    }
}
