//! Entry operations: listing by identifier, saving, voting and moderation.

use crate::errors::AppError;
use crate::models::{
    Entry, EntryDetails, EntryIdRequest, EntryPartitions, ListEntriesRequest, SaveEntryRequest,
    ScoreUpdate, VoteRequest,
};
use crate::store::RequestContext;
use crate::{visibility, votes};

/// The public, own and team entries of an identifier as seen by the actor.
///
/// Anonymous callers are allowed; the identifier is created on first sight.
pub async fn list(
    ctx: &RequestContext,
    request: ListEntriesRequest,
) -> Result<EntryPartitions, AppError> {
    request.identifier.validate()?;
    let identifier = request.identifier.normalized();

    ctx.stores
        .entries
        .visible_entries(&identifier, ctx.actor.as_ref())
        .await
}

/// Create a new entry, or update the one named by `entry_id`.
pub async fn save(ctx: &RequestContext, mut request: SaveEntryRequest) -> Result<Entry, AppError> {
    let actor = ctx.require_actor()?;
    request.validate()?;
    request.identifier = request.identifier.normalized();

    let renderer = ctx.stores.renderer.clone();
    let draft = request.into_draft(|body| renderer.render(body));
    ctx.stores.entries.store(draft, actor).await
}

/// A single entry with its body and the actor's relation to it.
pub async fn get(ctx: &RequestContext, request: EntryIdRequest) -> Result<EntryDetails, AppError> {
    request.validate()?;
    let entry = ctx.stores.entries.find_by_id(request.entry_id).await?;
    let actor = ctx.actor.as_ref();
    if !visibility::can_view(actor, &entry) {
        return Err(AppError::NotFound(format!(
            "Unknown entry {}",
            request.entry_id
        )));
    }

    let vote = match actor {
        Some(actor) => ctx
            .stores
            .votes
            .find_by_entry_and_user(entry.id, actor.id)
            .await?
            .map(|v| v.vote_type.value())
            .unwrap_or(0),
        None => 0,
    };

    Ok(EntryDetails {
        body: entry.body.clone(),
        body_rendered: entry.body_rendered.clone(),
        vote,
        global_moderator: actor.is_some_and(|a| a.moderator),
        team_moderator: actor.is_some_and(|a| visibility::is_team_moderator(a, &entry)),
        entry,
    })
}

pub async fn vote(ctx: &RequestContext, request: VoteRequest) -> Result<ScoreUpdate, AppError> {
    ctx.require_actor()?;
    let vote_type = request.validate()?;
    votes::cast(ctx, request.entry_id, vote_type).await
}

pub async fn delete(ctx: &RequestContext, request: EntryIdRequest) -> Result<(), AppError> {
    let actor = ctx.require_actor()?;
    request.validate()?;

    let entry = ctx.stores.entries.find_by_id(request.entry_id).await?;
    visibility::authorize_delete(actor, &entry)?;
    ctx.stores.entries.delete(&entry).await?;

    tracing::info!(entry_id = entry.id, username = %actor.username, "Deleted entry");
    Ok(())
}

pub async fn remove_from_public(
    ctx: &RequestContext,
    request: EntryIdRequest,
) -> Result<(), AppError> {
    let actor = ctx.require_actor()?;
    request.validate()?;
    visibility::authorize_remove_from_public(actor)?;

    let entry = ctx.stores.entries.find_by_id(request.entry_id).await?;
    ctx.stores.entries.remove_from_public(&entry).await?;

    tracing::info!(entry_id = entry.id, moderator = %actor.username, "Removed entry from public");
    Ok(())
}

/// Hide an entry from every one of its teams that the actor moderates.
pub async fn remove_from_teams(
    ctx: &RequestContext,
    request: EntryIdRequest,
) -> Result<(), AppError> {
    let actor = ctx.require_actor()?;
    request.validate()?;

    let entry = ctx.stores.entries.find_by_id(request.entry_id).await?;
    let team_ids = visibility::moderated_teams(actor, &entry)?;
    ctx.stores.entries.remove_from_teams(&entry, &team_ids).await
}
