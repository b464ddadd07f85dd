//! Vote model.

use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// Direction of a vote; its integer value is what scores are summed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "i64", try_from = "i64")]
pub enum VoteType {
    Up,
    Down,
}

impl VoteType {
    pub fn value(self) -> i64 {
        match self {
            VoteType::Up => 1,
            VoteType::Down => -1,
        }
    }
}

impl From<VoteType> for i64 {
    fn from(vote_type: VoteType) -> Self {
        vote_type.value()
    }
}

impl TryFrom<i64> for VoteType {
    type Error = AppError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(VoteType::Up),
            -1 => Ok(VoteType::Down),
            other => Err(AppError::Validation(format!(
                "Invalid vote_type {}: expected 1 or -1",
                other
            ))),
        }
    }
}

/// One user's vote on one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vote {
    pub id: i64,
    pub vote_type: VoteType,
    pub entry_id: i64,
    pub user_id: i64,
}

/// Request body for voting on an entry.
#[derive(Debug, Clone, Deserialize)]
pub struct VoteRequest {
    #[serde(default)]
    pub entry_id: i64,
    #[serde(default)]
    pub vote_type: i64,
}

impl VoteRequest {
    pub fn validate(&self) -> Result<VoteType, AppError> {
        if self.entry_id <= 0 {
            return Err(AppError::missing("entry_id"));
        }
        VoteType::try_from(self.vote_type)
    }
}

/// Score of an entry after a vote.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ScoreUpdate {
    pub entry_id: i64,
    pub score: i64,
}
