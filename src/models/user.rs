//! User model and account request bodies.

use serde::Deserialize;

use super::{require, TeamMembership};
use crate::auth::password;
use crate::errors::AppError;

/// A registered user.
///
/// `memberships` is only populated for the acting user of a request; lookups
/// through the user store leave it empty.
#[derive(Debug, Clone, Default)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
    pub encrypted_password: String,
    pub remember_token: Option<String>,
    /// Global moderator flag
    pub moderator: bool,
    pub memberships: Vec<TeamMembership>,
}

impl User {
    /// Replace the stored credential with a hash of `new_password`.
    pub fn change_password(&mut self, new_password: &str) -> Result<(), AppError> {
        self.encrypted_password = password::hash_secret(new_password)?;
        Ok(())
    }

    pub fn passwords_match(&self, candidate: &str) -> bool {
        password::verify_secret(candidate, &self.encrypted_password)
    }

    /// The membership this user holds in `team_id`, if any.
    pub fn membership_in(&self, team_id: i64) -> Option<&TeamMembership> {
        self.memberships.iter().find(|m| m.team_id == team_id)
    }

    pub fn team_ids(&self) -> impl Iterator<Item = i64> + '_ {
        self.memberships.iter().map(|m| m.team_id)
    }
}

/// Data required to persist a new user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub encrypted_password: String,
}

/// Request body for registration and login.
#[derive(Debug, Clone, Deserialize)]
pub struct CredentialsRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl CredentialsRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        require(&self.username, "username")?;
        require(&self.password, "password")
    }
}

/// Request body for changing the password of the current user.
#[derive(Debug, Clone, Deserialize)]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub password: String,
}

impl ChangePasswordRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        require(&self.password, "password")
    }
}

/// Request body for changing the email of the current user.
#[derive(Debug, Clone, Deserialize)]
pub struct ChangeEmailRequest {
    #[serde(default)]
    pub email: String,
}

impl ChangeEmailRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        require(&self.email, "email")
    }
}
