//! Team operations: creation, joining and leaving, roles and access keys.

use crate::errors::AppError;
use crate::models::{
    AccessKeyRequest, MembershipRemoval, RemoveMemberRequest, Role, SetRoleRequest, Team,
    TeamMembers, TeamMembership, TeamNameRequest,
};
use crate::policy;
use crate::store::RequestContext;

/// Teams the actor belongs to, with the actor's role in each.
pub async fn list(ctx: &RequestContext) -> Result<Vec<TeamMembership>, AppError> {
    let actor = ctx.require_actor()?;
    ctx.stores.teams.find_memberships_for_user(actor.id).await
}

pub async fn create(ctx: &RequestContext, request: TeamNameRequest) -> Result<Team, AppError> {
    let actor = ctx.require_actor()?;
    request.validate()?;
    ctx.stores.teams.store(request.name.trim(), actor).await
}

pub async fn join(ctx: &RequestContext, request: AccessKeyRequest) -> Result<(), AppError> {
    let actor = ctx.require_actor()?;
    request.validate()?;

    let team = ctx.stores.teams.find_team_by_name(&request.name).await?;
    if !policy::access_keys_match(&team, &request.access_key) {
        return Err(AppError::Forbidden("Invalid access key".to_string()));
    }
    if actor.membership_in(team.id).is_some() {
        return Err(AppError::Conflict(
            "You are already a member of this team".to_string(),
        ));
    }

    ctx.stores
        .teams
        .add_membership(&team, actor, Role::Member)
        .await?;
    tracing::info!(team = %team.name, username = %actor.username, "Joined team");
    Ok(())
}

/// Leave a team, deleting the actor's entries shared with it.
///
/// The owner may only leave once every other member is gone, which also
/// deletes the team.
pub async fn leave(
    ctx: &RequestContext,
    request: TeamNameRequest,
) -> Result<MembershipRemoval, AppError> {
    let actor = ctx.require_actor()?;
    request.validate()?;

    let team = ctx.stores.teams.find_team_by_name(&request.name).await?;
    if actor.membership_in(team.id).is_none() {
        return Err(AppError::NotFound(
            "You are not a member of this team".to_string(),
        ));
    }
    if team.owner_id == actor.id {
        let members = ctx.stores.teams.find_memberships_for_team(&team).await?;
        if members.len() > 1 {
            return Err(AppError::Policy(
                "The owner cannot leave a team that still has other members".to_string(),
            ));
        }
    }

    ctx.stores.teams.remove_membership(&team, actor.id).await
}

pub async fn set_role(ctx: &RequestContext, request: SetRoleRequest) -> Result<(), AppError> {
    let actor = ctx.require_actor()?;
    request.validate()?;
    let role = policy::assignable_role(&request.role)?;

    let team = ctx.stores.teams.find_team_by_name(&request.name).await?;
    policy::require_owner(actor, &team)?;
    let target = ctx.stores.users.find_by_username(&request.username).await?;
    policy::require_not_owner(&team, &target)?;

    ctx.stores
        .teams
        .update_membership(&team, target.id, role)
        .await
}

pub async fn remove_member(
    ctx: &RequestContext,
    request: RemoveMemberRequest,
) -> Result<MembershipRemoval, AppError> {
    let actor = ctx.require_actor()?;
    request.validate()?;

    let team = ctx.stores.teams.find_team_by_name(&request.name).await?;
    policy::require_owner(actor, &team)?;
    let target = ctx.stores.users.find_by_username(&request.username).await?;
    policy::require_not_owner(&team, &target)?;

    ctx.stores.teams.remove_membership(&team, target.id).await
}

/// Set or clear (with an empty key) the key required to join.
pub async fn set_access_key(
    ctx: &RequestContext,
    request: AccessKeyRequest,
) -> Result<(), AppError> {
    let actor = ctx.require_actor()?;
    request.validate()?;

    let team = ctx.stores.teams.find_team_by_name(&request.name).await?;
    policy::require_owner(actor, &team)?;

    let encrypted = policy::encrypt_access_key(&request.access_key)?;
    ctx.stores.teams.update_access_key(&team, &encrypted).await
}

pub async fn list_members(
    ctx: &RequestContext,
    request: TeamNameRequest,
) -> Result<TeamMembers, AppError> {
    let actor = ctx.require_actor()?;
    request.validate()?;

    let team = ctx.stores.teams.find_team_by_name(&request.name).await?;
    policy::require_owner(actor, &team)?;

    Ok(TeamMembers {
        members: ctx.stores.teams.find_memberships_for_team(&team).await?,
        has_access_key: !team.encrypted_access_key.is_empty(),
    })
}
