use async_graphql::{Context, Error, Result};
use uuid::Uuid;

use crate::auth::Claims;
use crate::gql::error::DbResultExt;
use crate::gql::types::Role;
use crate::state::AppState;
use infra::models::ResultScopeRow;
use infra::workflow::Stage;

/// The authenticated caller, as stored in the database at request time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: Uuid,
    pub role: Role,
}

pub const STAFF_ROLES: [Role; 4] = [Role::Lecturer, Role::Hod, Role::Dean, Role::Senate];
pub const APPROVER_ROLES: [Role; 3] = [Role::Hod, Role::Dean, Role::Senate];

fn claims<'a>(ctx: &'a Context<'_>) -> Result<&'a Claims> {
    ctx.data::<Claims>()
        .map_err(|_| Error::new("You must be logged in to perform this action"))
}

/// Any logged-in, active user.
pub async fn require_auth(ctx: &Context<'_>) -> Result<Actor> {
    let claims = claims(ctx)?;
    let user_id =
        Uuid::parse_str(&claims.sub).map_err(|e| Error::new(format!("Invalid user ID: {}", e)))?;

    let state = ctx.data::<AppState>()?;
    let user = infra::repos::users::get_by_id(&state.db, user_id)
        .await
        .db()?
        .ok_or_else(|| Error::new("You must be logged in to perform this action"))?;

    if !user.is_active {
        return Err(Error::new("Access denied: account is deactivated"));
    }

    Ok(Actor {
        id: user.id,
        role: Role::from(user.role),
    })
}

pub async fn require_role(ctx: &Context<'_>, required_role: Role) -> Result<Actor> {
    require_any_role(ctx, &[required_role]).await
}

/// Caller must hold one of `roles`. The token's role is checked first to skip
/// the lookup on an obvious mismatch; the stored role is authoritative.
pub async fn require_any_role(ctx: &Context<'_>, roles: &[Role]) -> Result<Actor> {
    let claims_role = claims(ctx)?.role();
    if !roles.contains(&claims_role) {
        return Err(access_denied(roles, claims_role));
    }

    let actor = require_auth(ctx).await?;
    if !roles.contains(&actor.role) {
        return Err(access_denied(roles, actor.role));
    }

    Ok(actor)
}

pub async fn require_admin(ctx: &Context<'_>) -> Result<Actor> {
    require_role(ctx, Role::Admin).await
}

fn access_denied(roles: &[Role], actual: Role) -> Error {
    let wanted: Vec<&str> = roles.iter().map(|r| r.as_str()).collect();
    Error::new(format!(
        "Access denied: requires role {}. Your current role is {}",
        wanted.join(" or "),
        actual.as_str()
    ))
}

/// The approval stage the actor's role acts at.
pub fn approver_stage(actor: &Actor) -> Result<Stage> {
    Stage::approver_for_role(actor.role.as_str()).ok_or_else(|| {
        Error::new(format!(
            "Access denied: only HOD, dean or senate can review results. Your current role is {}",
            actor.role.as_str()
        ))
    })
}

/// Whether `user_id`, acting at `stage`, owns the result described by `scope`.
pub fn in_scope(stage: Stage, user_id: Uuid, scope: &ResultScopeRow) -> bool {
    match stage {
        Stage::Lecturer => scope.lecturer_id == Some(user_id),
        Stage::Hod => scope.hod_id == Some(user_id),
        Stage::Dean => scope.dean_id == Some(user_id),
        Stage::Senate => true,
    }
}

/// Read access to a course's results: admin and senate see everything,
/// others only what they teach, head or lead.
pub fn can_view_course(
    actor: &Actor,
    lecturer_id: Option<Uuid>,
    hod_id: Option<Uuid>,
    dean_id: Option<Uuid>,
) -> bool {
    match actor.role {
        Role::Admin | Role::Senate => true,
        Role::Student => false,
        Role::Lecturer => lecturer_id == Some(actor.id),
        Role::Hod => lecturer_id == Some(actor.id) || hod_id == Some(actor.id),
        Role::Dean => lecturer_id == Some(actor.id) || dean_id == Some(actor.id),
    }
}
