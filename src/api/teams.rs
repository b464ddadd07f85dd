//! Team endpoints. Teams are addressed by name.

use super::{success, ApiJson, ApiResult};
use crate::models::{
    AccessKeyRequest, MembershipRemoval, RemoveMemberRequest, Role, SetRoleRequest, TeamMembers,
    TeamMembership, TeamNameRequest,
};
use crate::service::teams;
use crate::store::RequestContext;

/// POST /api/teams/list - The actor's teams and roles.
pub async fn list(ctx: RequestContext) -> ApiResult<Vec<TeamMembership>> {
    success(teams::list(&ctx).await?)
}

/// POST /api/teams/create
pub async fn create(
    ctx: RequestContext,
    ApiJson(request): ApiJson<TeamNameRequest>,
) -> ApiResult<TeamMembership> {
    let team = teams::create(&ctx, request).await?;
    success(TeamMembership {
        team_id: team.id,
        team_name: team.name,
        role: Role::Owner,
        user_id: team.owner_id,
    })
}

/// POST /api/teams/join
pub async fn join(
    ctx: RequestContext,
    ApiJson(request): ApiJson<AccessKeyRequest>,
) -> ApiResult<()> {
    teams::join(&ctx, request).await?;
    success(())
}

/// POST /api/teams/leave
pub async fn leave(
    ctx: RequestContext,
    ApiJson(request): ApiJson<TeamNameRequest>,
) -> ApiResult<MembershipRemoval> {
    success(teams::leave(&ctx, request).await?)
}

/// POST /api/teams/set_role
pub async fn set_role(
    ctx: RequestContext,
    ApiJson(request): ApiJson<SetRoleRequest>,
) -> ApiResult<()> {
    teams::set_role(&ctx, request).await?;
    success(())
}

/// POST /api/teams/remove_member
pub async fn remove_member(
    ctx: RequestContext,
    ApiJson(request): ApiJson<RemoveMemberRequest>,
) -> ApiResult<MembershipRemoval> {
    success(teams::remove_member(&ctx, request).await?)
}

/// POST /api/teams/set_access_key
pub async fn set_access_key(
    ctx: RequestContext,
    ApiJson(request): ApiJson<AccessKeyRequest>,
) -> ApiResult<()> {
    teams::set_access_key(&ctx, request).await?;
    success(())
}

/// POST /api/teams/list_members
pub async fn list_members(
    ctx: RequestContext,
    ApiJson(request): ApiJson<TeamNameRequest>,
) -> ApiResult<TeamMembers> {
    success(teams::list_members(&ctx, request).await?)
}
