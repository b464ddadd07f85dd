//! Entry endpoints.

use super::{success, ApiJson, ApiResult};
use crate::models::{
    Entry, EntryDetails, EntryIdRequest, EntryPartitions, ListEntriesRequest, SaveEntryRequest,
    ScoreUpdate, VoteRequest,
};
use crate::service::entries;
use crate::store::RequestContext;

/// POST /api/entries/list - Public, own and team entries of an identifier.
pub async fn list(
    ctx: RequestContext,
    ApiJson(request): ApiJson<ListEntriesRequest>,
) -> ApiResult<EntryPartitions> {
    success(entries::list(&ctx, request).await?)
}

/// POST /api/entries/save (also mounted as /create)
pub async fn save(
    ctx: RequestContext,
    ApiJson(request): ApiJson<SaveEntryRequest>,
) -> ApiResult<Entry> {
    success(entries::save(&ctx, request).await?)
}

/// POST /api/entries/get
pub async fn get(
    ctx: RequestContext,
    ApiJson(request): ApiJson<EntryIdRequest>,
) -> ApiResult<EntryDetails> {
    success(entries::get(&ctx, request).await?)
}

/// POST /api/entries/vote
pub async fn vote(
    ctx: RequestContext,
    ApiJson(request): ApiJson<VoteRequest>,
) -> ApiResult<ScoreUpdate> {
    success(entries::vote(&ctx, request).await?)
}

/// POST /api/entries/delete
pub async fn delete(
    ctx: RequestContext,
    ApiJson(request): ApiJson<EntryIdRequest>,
) -> ApiResult<()> {
    entries::delete(&ctx, request).await?;
    success(())
}

/// POST /api/entries/remove_from_public
pub async fn remove_from_public(
    ctx: RequestContext,
    ApiJson(request): ApiJson<EntryIdRequest>,
) -> ApiResult<()> {
    entries::remove_from_public(&ctx, request).await?;
    success(())
}

/// POST /api/entries/remove_from_teams
pub async fn remove_from_teams(
    ctx: RequestContext,
    ApiJson(request): ApiJson<EntryIdRequest>,
) -> ApiResult<()> {
    entries::remove_from_teams(&ctx, request).await?;
    success(())
}
