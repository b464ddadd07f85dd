//! Vote aggregation.
//!
//! An entry's score is a cache of the sum of its votes. Every vote mutation
//! goes through [`cast`], which recomputes the score afterwards.

use crate::errors::AppError;
use crate::models::{ScoreUpdate, Vote, VoteType};
use crate::store::RequestContext;
use crate::visibility;

/// Sum of vote values; what a recomputed score must equal.
pub fn tally(votes: &[Vote]) -> i64 {
    votes.iter().map(|v| v.vote_type.value()).sum()
}

/// Record the actor's vote on an entry and return the recomputed score.
pub async fn cast(
    ctx: &RequestContext,
    entry_id: i64,
    vote_type: VoteType,
) -> Result<ScoreUpdate, AppError> {
    let actor = ctx.require_actor()?;
    let entry = ctx.stores.entries.find_by_id(entry_id).await?;
    if !visibility::can_view(Some(actor), &entry) {
        return Err(AppError::NotFound(format!("Unknown entry {}", entry_id)));
    }

    ctx.stores
        .votes
        .upsert(entry.id, actor.id, vote_type)
        .await?;
    let score = ctx.stores.entries.update_score(entry.id).await?;

    tracing::debug!(entry_id = entry.id, user_id = actor.id, score, "Vote recorded");
    Ok(ScoreUpdate {
        entry_id: entry.id,
        score,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vote(id: i64, user_id: i64, vote_type: VoteType) -> Vote {
        Vote {
            id,
            vote_type,
            entry_id: 1,
            user_id,
        }
    }

    #[test]
    fn test_tally() {
        assert_eq!(tally(&[]), 0);
        let votes = vec![
            vote(1, 1, VoteType::Up),
            vote(2, 2, VoteType::Down),
            vote(3, 3, VoteType::Down),
        ];
        assert_eq!(tally(&votes), -1);
    }

    #[test]
    fn test_vote_type_values() {
        assert_eq!(i64::from(VoteType::Up), 1);
        assert_eq!(VoteType::try_from(-1).unwrap(), VoteType::Down);
        assert!(matches!(
            VoteType::try_from(0),
            Err(AppError::Validation(_))
        ));
    }
}
