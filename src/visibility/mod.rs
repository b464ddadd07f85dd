//! Entry visibility and mutation authorization.
//!
//! Everything here is a pure function of an entry's stored flags and the
//! actor's identity and memberships. Stores load the candidate entries for an
//! identifier and hand them to [`resolve`]; nothing about visibility is cached.

use std::collections::HashSet;

use crate::errors::AppError;
use crate::models::{Entry, EntryPartitions, EntryShare, Identifier, Team, User};

/// Public entries at or below this score are hidden from listings.
pub const SCORE_SUPPRESSION_THRESHOLD: i64 = -5;

fn is_author(actor: &User, entry: &Entry) -> bool {
    entry.user_id == actor.id
}

/// Whether the entry is shared, and not hidden, with any team the actor belongs to.
pub fn is_listed_for_actor_teams(actor: &User, entry: &Entry) -> bool {
    actor.team_ids().any(|team_id| entry.is_listed_for_team(team_id))
}

/// Whether the entry passes the public listing gates on its own flags.
pub fn is_publicly_listed(entry: &Entry) -> bool {
    entry.public && !entry.removed_from_public && entry.score > SCORE_SUPPRESSION_THRESHOLD
}

/// Split the entries of one identifier into the public, own and team
/// partitions seen by `actor`.
///
/// The partitions are disjoint: an entry authored by the actor is only ever
/// "own", and a public entry also visible through one of the actor's teams is
/// only listed under "team".
pub fn resolve(actor: Option<&User>, candidates: Vec<Entry>) -> EntryPartitions {
    let mut partitions = EntryPartitions::default();
    let mut seen = HashSet::new();

    for entry in candidates {
        if !seen.insert(entry.id) {
            continue;
        }

        match actor {
            Some(actor) if is_author(actor, &entry) => partitions.own_entries.push(entry),
            Some(actor) if is_listed_for_actor_teams(actor, &entry) => {
                partitions.team_entries.push(entry)
            }
            _ if is_publicly_listed(&entry) => partitions.public_entries.push(entry),
            _ => {}
        }
    }

    partitions
}

/// Whether `actor` may read a single entry.
pub fn can_view(actor: Option<&User>, entry: &Entry) -> bool {
    if entry.public && !entry.removed_from_public {
        return true;
    }
    match actor {
        Some(actor) => {
            is_author(actor, entry) || actor.moderator || is_listed_for_actor_teams(actor, entry)
        }
        None => false,
    }
}

/// Updating is reserved to the author and global moderators.
pub fn authorize_update(actor: &User, existing: &Entry) -> Result<(), AppError> {
    if is_author(actor, existing) || actor.moderator {
        return Ok(());
    }
    Err(AppError::Forbidden("You need to be the author".to_string()))
}

/// Deleting is reserved to the author; moderators can only hide.
pub fn authorize_delete(actor: &User, entry: &Entry) -> Result<(), AppError> {
    if is_author(actor, entry) {
        return Ok(());
    }
    Err(AppError::Forbidden(
        "Only the author can delete an entry".to_string(),
    ))
}

pub fn authorize_remove_from_public(actor: &User) -> Result<(), AppError> {
    if actor.moderator {
        return Ok(());
    }
    Err(AppError::Forbidden(
        "You need to be a moderator for this".to_string(),
    ))
}

/// The entry's teams in which `actor` is owner or moderator.
///
/// Fails when there are none, so the result is never empty.
pub fn moderated_teams(actor: &User, entry: &Entry) -> Result<Vec<i64>, AppError> {
    let team_ids: Vec<i64> = entry
        .shares
        .iter()
        .filter(|share| {
            actor
                .membership_in(share.team_id)
                .is_some_and(|m| m.role.can_moderate())
        })
        .map(|share| share.team_id)
        .collect();

    if team_ids.is_empty() {
        return Err(AppError::Forbidden(
            "You need to be the teams moderator for this".to_string(),
        ));
    }
    Ok(team_ids)
}

/// Whether `actor` moderates at least one team the entry is shared with.
pub fn is_team_moderator(actor: &User, entry: &Entry) -> bool {
    moderated_teams(actor, entry).is_ok()
}

/// Public entries may not be attached to identifiers banned from public use.
pub fn check_publishable(identifier: &Identifier, public: bool) -> Result<(), AppError> {
    if public && identifier.banned_from_public {
        return Err(AppError::Policy("Public annotations forbidden".to_string()));
    }
    Ok(())
}

/// Newly added shares must target teams the actor belongs to. Shares the
/// entry already has are kept regardless, so a moderator editing someone
/// else's entry does not lose its audience.
pub fn authorize_shares(
    actor: &User,
    existing: &[EntryShare],
    requested: &[Team],
) -> Result<(), AppError> {
    for team in requested {
        let already_shared = existing.iter().any(|share| share.team_id == team.id);
        if !already_shared && actor.membership_in(team.id).is_none() {
            return Err(AppError::Forbidden(format!(
                "You are not a member of team {}",
                team.name
            )));
        }
    }
    Ok(())
}

/// Teams whose existing share on `existing` is dropped when `actor` saves it
/// with `requested` teams.
///
/// Only the author may retract shares, and never one a team moderator has
/// hidden: that flag stays on the share row until the entry is deleted.
pub fn retracted_shares(actor: &User, existing: &Entry, requested: &[Team]) -> Vec<i64> {
    if !is_author(actor, existing) {
        return Vec::new();
    }
    existing
        .shares
        .iter()
        .filter(|share| !share.removed_from_team)
        .filter(|share| !requested.iter().any(|team| team.id == share.team_id))
        .map(|share| share.team_id)
        .collect()
}
