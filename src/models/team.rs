//! Team, role and membership models.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::require;
use crate::errors::AppError;

/// A named group of users.
#[derive(Debug, Clone)]
pub struct Team {
    pub id: i64,
    pub name: String,
    /// Hashed access key; empty when joining requires no key
    pub encrypted_access_key: String,
    pub owner_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Role of a user within a team.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Owner,
    Moderator,
    Member,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Moderator => "moderator",
            Role::Member => "member",
        }
    }

    /// Owners and moderators may hide entries from their team.
    pub fn can_moderate(&self) -> bool {
        matches!(self, Role::Owner | Role::Moderator)
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "owner" => Ok(Role::Owner),
            "moderator" => Ok(Role::Moderator),
            "member" => Ok(Role::Member),
            other => Err(AppError::Validation(format!("Invalid role: {}", other))),
        }
    }
}

/// A user's membership in a team, as seen from the user.
#[derive(Debug, Clone, Serialize)]
pub struct TeamMembership {
    #[serde(skip)]
    pub team_id: i64,
    #[serde(rename = "name")]
    pub team_name: String,
    pub role: Role,
    #[serde(skip)]
    pub user_id: i64,
}

/// A team's member, as seen from the team.
#[derive(Debug, Clone, Serialize)]
pub struct Membership {
    pub username: String,
    pub role: Role,
}

/// Outcome of removing a membership together with its cascade.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MembershipRemoval {
    pub entries_deleted: u64,
    pub team_deleted: bool,
}

/// Request body carrying only a team name (create, leave, list members).
#[derive(Debug, Clone, Deserialize)]
pub struct TeamNameRequest {
    #[serde(default)]
    pub name: String,
}

impl TeamNameRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        require(&self.name, "name")
    }
}

/// Request body for joining a team or changing its access key.
#[derive(Debug, Clone, Deserialize)]
pub struct AccessKeyRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub access_key: String,
}

impl AccessKeyRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        require(&self.name, "name")
    }
}

/// Request body for assigning a role to a team member.
#[derive(Debug, Clone, Deserialize)]
pub struct SetRoleRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub role: String,
}

impl SetRoleRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        require(&self.name, "name")?;
        require(&self.username, "username")?;
        require(&self.role, "role")
    }
}

/// Request body for removing a member from a team.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoveMemberRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub username: String,
}

impl RemoveMemberRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        require(&self.name, "name")?;
        require(&self.username, "username")
    }
}

/// Members of a team plus whether joining requires a key.
#[derive(Debug, Clone, Serialize)]
pub struct TeamMembers {
    pub members: Vec<Membership>,
    pub has_access_key: bool,
}
