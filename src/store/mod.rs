//! Storage traits consumed by the service layer.
//!
//! There is one canonical SQLite implementation ([`crate::db::Repository`])
//! and an in-memory fake used by the service tests.

#[cfg(test)]
pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::AppError;
use crate::models::{
    Entry, EntryDraft, EntryPartitions, Identifier, Membership, MembershipRemoval, NewUser, Role,
    Team, TeamMembership, User, Vote, VoteType,
};
use crate::render::Renderer;
use crate::visibility;

/// Users and their credentials.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<User, AppError>;

    async fn find_by_remember_token(&self, token: &str) -> Result<User, AppError>;

    async fn find_by_email(&self, email: &str) -> Result<User, AppError>;

    /// Insert a new user; a taken username is a conflict.
    async fn store(&self, user: NewUser) -> Result<User, AppError>;

    /// Persist every mutable column of `user`.
    async fn update(&self, user: &User) -> Result<(), AppError>;
}

/// Teams and role-based memberships.
#[async_trait]
pub trait TeamStore: Send + Sync {
    async fn find_team_by_name(&self, name: &str) -> Result<Team, AppError>;

    /// Create a team owned by `owner`, together with the owner membership.
    async fn store(&self, name: &str, owner: &User) -> Result<Team, AppError>;

    async fn add_membership(&self, team: &Team, user: &User, role: Role) -> Result<(), AppError>;

    /// Remove a membership and, in the same transaction, every entry the user
    /// shared with the team (with its votes and shares). The team is deleted
    /// once it has no members left.
    async fn remove_membership(
        &self,
        team: &Team,
        user_id: i64,
    ) -> Result<MembershipRemoval, AppError>;

    async fn update_membership(&self, team: &Team, user_id: i64, role: Role)
        -> Result<(), AppError>;

    async fn update_access_key(&self, team: &Team, encrypted_access_key: &str)
        -> Result<(), AppError>;

    async fn find_memberships_for_user(&self, user_id: i64)
        -> Result<Vec<TeamMembership>, AppError>;

    async fn find_memberships_for_team(&self, team: &Team) -> Result<Vec<Membership>, AppError>;
}

/// Entries, their identifiers and team shares.
#[async_trait]
pub trait EntryStore: Send + Sync {
    /// Find the identifier by its natural key, creating it when absent.
    async fn upsert_identifier(&self, identifier: &Identifier) -> Result<Identifier, AppError>;

    /// Every entry attached to an identifier, with shares populated.
    async fn entries_for_identifier(&self, identifier_id: i64) -> Result<Vec<Entry>, AppError>;

    /// Create or update an entry on behalf of `author`.
    ///
    /// Upserts the identifier, rejects public entries on banned identifiers,
    /// checks update authorization against the stored entry and syncs the team
    /// shares, all in one transaction. New entries start with the author's
    /// up-vote.
    async fn store(&self, draft: EntryDraft, author: &User) -> Result<Entry, AppError>;

    /// Delete an entry with its votes and shares.
    async fn delete(&self, entry: &Entry) -> Result<(), AppError>;

    async fn find_by_id(&self, id: i64) -> Result<Entry, AppError>;

    /// Recompute the cached score from the entry's votes and return it.
    async fn update_score(&self, entry_id: i64) -> Result<i64, AppError>;

    async fn remove_from_public(&self, entry: &Entry) -> Result<(), AppError>;

    /// Hide the entry from the listed teams only.
    async fn remove_from_teams(&self, entry: &Entry, team_ids: &[i64]) -> Result<(), AppError>;

    /// Upsert the identifier once and partition its entries for `actor`.
    async fn visible_entries(
        &self,
        identifier: &Identifier,
        actor: Option<&User>,
    ) -> Result<EntryPartitions, AppError> {
        let identifier = self.upsert_identifier(identifier).await?;
        let candidates = self.entries_for_identifier(identifier.id).await?;
        let partitions = visibility::resolve(actor, candidates);

        tracing::debug!(
            identifier_id = identifier.id,
            public = partitions.public_entries.len(),
            own = partitions.own_entries.len(),
            team = partitions.team_entries.len(),
            "Resolved entry partitions"
        );
        Ok(partitions)
    }

    async fn find_public_by_identifier(
        &self,
        identifier: &Identifier,
        actor: Option<&User>,
    ) -> Result<Vec<Entry>, AppError> {
        Ok(self.visible_entries(identifier, actor).await?.public_entries)
    }

    async fn find_own_by_identifier(
        &self,
        identifier: &Identifier,
        actor: Option<&User>,
    ) -> Result<Vec<Entry>, AppError> {
        Ok(self.visible_entries(identifier, actor).await?.own_entries)
    }

    async fn find_by_team_and_identifier(
        &self,
        identifier: &Identifier,
        actor: &User,
    ) -> Result<Vec<Entry>, AppError> {
        Ok(self.visible_entries(identifier, Some(actor)).await?.team_entries)
    }
}

/// Per-user votes on entries.
#[async_trait]
pub trait VoteStore: Send + Sync {
    /// Insert the vote or overwrite the type of the user's existing one.
    async fn upsert(&self, entry_id: i64, user_id: i64, vote_type: VoteType)
        -> Result<(), AppError>;

    async fn find_by_entry_and_user(
        &self,
        entry_id: i64,
        user_id: i64,
    ) -> Result<Option<Vote>, AppError>;
}

/// Store handles injected into every request.
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub teams: Arc<dyn TeamStore>,
    pub entries: Arc<dyn EntryStore>,
    pub votes: Arc<dyn VoteStore>,
    pub renderer: Arc<dyn Renderer>,
}

impl Stores {
    /// Back every store with the same implementation.
    pub fn from_shared<S>(store: Arc<S>, renderer: Arc<dyn Renderer>) -> Self
    where
        S: UserStore + TeamStore + EntryStore + VoteStore + 'static,
    {
        Self {
            users: store.clone(),
            teams: store.clone(),
            entries: store.clone(),
            votes: store,
            renderer,
        }
    }
}

/// Everything an operation needs to know about the request it serves.
#[derive(Clone)]
pub struct RequestContext {
    /// The authenticated user with memberships loaded, if any
    pub actor: Option<User>,
    pub stores: Stores,
}

impl RequestContext {
    pub fn new(actor: Option<User>, stores: Stores) -> Self {
        Self { actor, stores }
    }

    pub fn anonymous(stores: Stores) -> Self {
        Self::new(None, stores)
    }

    pub fn require_actor(&self) -> Result<&User, AppError> {
        self.actor
            .as_ref()
            .ok_or_else(|| AppError::Unauthenticated("You are not logged in".to_string()))
    }
}
