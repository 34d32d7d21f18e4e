use async_graphql::{Context, Object, Result};
use serde_json::json;
use uuid::Uuid;

use crate::auth::permissions::require_admin;
use crate::auth::PasswordService;
use crate::gql::common::helpers::{create_account, page};
use crate::gql::common::validation;
use crate::gql::domains::audit_log::{self, entity};
use crate::gql::error::{DbResultExt, GqlError, ResultExt};
use crate::gql::types::{
    CreateStaffInput, CreateStaffPayload, PaginatedResponse, PaginationInput, Staff,
    StaffFilterInput, UpdateStaffInput,
};
use crate::state::AppState;
use infra::repos::{
    staff::{self, CreateStaffData, StaffFilter, UpdateStaffData},
    users::{self, CreateUserData, UpdateUserData},
};

#[derive(Default)]
pub struct StaffQuery;

#[Object]
impl StaffQuery {
    /// Staff directory (admins only)
    async fn staff(
        &self,
        ctx: &Context<'_>,
        filter: Option<StaffFilterInput>,
        pagination: Option<PaginationInput>,
    ) -> Result<PaginatedResponse<Staff>> {
        let _admin = require_admin(ctx).await?;
        let state = ctx.data::<AppState>()?;

        let filter = StaffFilter::from(filter.unwrap_or_default());
        let limit_offset = page(pagination);

        let (rows, total_count) = tokio::try_join!(
            staff::list(&state.db, filter.clone(), Some(limit_offset)),
            staff::count(&state.db, filter)
        )
        .db()?;

        let items = rows.into_iter().map(Staff::from).collect();
        Ok(PaginatedResponse::new(items, total_count, limit_offset))
    }

    async fn staff_member(&self, ctx: &Context<'_>, id: Uuid) -> Result<Option<Staff>> {
        let _admin = require_admin(ctx).await?;
        let state = ctx.data::<AppState>()?;

        let row = staff::get_by_id(&state.db, id).await.db()?;
        Ok(row.map(Staff::from))
    }
}

#[derive(Default)]
pub struct StaffMutation;

#[Object]
impl StaffMutation {
    /// Create the account and staff record together. The temporary password
    /// is returned once and never stored in clear.
    async fn create_staff(
        &self,
        ctx: &Context<'_>,
        input: CreateStaffInput,
    ) -> Result<CreateStaffPayload> {
        let admin = require_admin(ctx).await?;
        let state = ctx.data::<AppState>()?;

        if !input.role.is_staff() {
            return Err(GqlError::invalid(format!(
                "Staff role must be lecturer, hod, dean or senate, not {}",
                input.role.as_str()
            ))
            .into());
        }

        let user_data = CreateUserData {
            email: validation::email(&input.email)?,
            password_hash: None,
            first_name: validation::required("firstName", &input.first_name)?,
            last_name: validation::required("lastName", &input.last_name)?,
            phone: validation::optional(input.phone),
            role: input.role.as_str().to_string(),
        };
        let staff_number = validation::code("staffNumber", &input.staff_number)?;
        let designation = validation::required("designation", &input.designation)?;

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
        let row = staff::create(
            &mut *tx,
            CreateStaffData {
                user_id: user.id,
                department_id: input.department_id,
                staff_number,
                designation,
            },
        )
        .await
        .db()?;

        let entry = audit_log::record(
            &mut *tx,
            &admin,
            "staff.create",
            entity::STAFF,
            Some(row.id),
            json!({ "userId": user.id, "staffNumber": row.staff_number, "role": row.role }),
        )
        .await
        .db()?;
        tx.commit().await.db()?;
        audit_log::publish([entry]);

        tracing::info!(staff_id = %row.id, role = %row.role, "Staff member created");
        Ok(CreateStaffPayload {
            staff: row.into(),
            temporary_password,
        })
    }

    async fn update_staff(
        &self,
        ctx: &Context<'_>,
        id: Uuid,
        input: UpdateStaffInput,
    ) -> Result<Staff> {
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
        let staff_data = UpdateStaffData {
            department_id: input.department_id,
            staff_number: input
                .staff_number
                .as_deref()
                .map(|v| validation::code("staffNumber", v))
                .transpose()?,
            designation: input
                .designation
                .as_deref()
                .map(|v| validation::required("designation", v))
                .transpose()?,
        };
        let changes = json!({
            "email": user_data.email,
            "firstName": user_data.first_name,
            "lastName": user_data.last_name,
            "departmentId": staff_data.department_id,
            "staffNumber": staff_data.staff_number,
            "designation": staff_data.designation,
        });

        let mut tx = state.db.begin().await.db()?;
        let existing = staff::get_by_id(&mut *tx, id)
            .await
            .db()?
            .ok_or_else(|| GqlError::not_found("Staff member"))?;

        if let Some(email) = &user_data.email {
            if users::email_taken(&mut *tx, email, Some(existing.user_id)).await.db()? {
                return Err(
                    GqlError::invalid(format!("An account with email {} already exists", email))
                        .into(),
                );
            }
        }

        users::update(&mut *tx, existing.user_id, user_data).await.db()?;
        let row = staff::update(&mut *tx, id, staff_data)
            .await
            .db()?
            .ok_or_else(|| GqlError::not_found("Staff member"))?;

        let entry = audit_log::record(&mut *tx, &admin, "staff.update", entity::STAFF, Some(id), changes)
            .await
            .db()?;
        tx.commit().await.db()?;
        audit_log::publish([entry]);

        Ok(row.into())
    }

    /// Block the staff member from logging in. Course and headship
    /// assignments are kept so history stays readable.
    async fn deactivate_staff(&self, ctx: &Context<'_>, id: Uuid) -> Result<Staff> {
        set_staff_active(ctx, id, false).await
    }

    async fn reactivate_staff(&self, ctx: &Context<'_>, id: Uuid) -> Result<Staff> {
        set_staff_active(ctx, id, true).await
    }
}

async fn set_staff_active(ctx: &Context<'_>, id: Uuid, is_active: bool) -> Result<Staff> {
    let admin = require_admin(ctx).await?;
    let state = ctx.data::<AppState>()?;

    let mut tx = state.db.begin().await.db()?;
    let existing = staff::get_by_id(&mut *tx, id)
        .await
        .db()?
        .ok_or_else(|| GqlError::not_found("Staff member"))?;
    if existing.user_id == admin.id && !is_active {
        return Err(GqlError::invalid("You cannot deactivate your own account").into());
    }

    users::set_active(&mut *tx, existing.user_id, is_active).await.db()?;
    let row = staff::get_by_id(&mut *tx, id)
        .await
        .db()?
        .ok_or_else(|| GqlError::not_found("Staff member"))?;

    let action = if is_active { "staff.reactivate" } else { "staff.deactivate" };
    let entry = audit_log::record(
        &mut *tx,
        &admin,
        action,
        entity::STAFF,
        Some(id),
        json!({ "userId": existing.user_id }),
    )
    .await
    .db()?;
    tx.commit().await.db()?;
    audit_log::publish([entry]);

    Ok(row.into())
}
