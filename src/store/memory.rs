//! In-memory store used by the service tests.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;

use super::{EntryStore, TeamStore, UserStore, VoteStore};
use crate::errors::AppError;
use crate::models::{
    Entry, EntryDraft, EntryShare, Identifier, Membership, MembershipRemoval, NewUser, Role, Team,
    TeamMembership, User, Vote, VoteType,
};
use crate::{visibility, votes};

#[derive(Debug, Clone)]
struct ShareRow {
    entry_id: i64,
    team_id: i64,
    removed_from_team: bool,
}

#[derive(Debug, Clone)]
struct MemberRow {
    team_id: i64,
    user_id: i64,
    role: Role,
}

#[derive(Default)]
struct State {
    next_id: i64,
    users: Vec<User>,
    teams: Vec<Team>,
    members: Vec<MemberRow>,
    identifiers: Vec<Identifier>,
    entries: Vec<Entry>,
    shares: Vec<ShareRow>,
    votes: Vec<Vote>,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn team_by_name(&self, name: &str) -> Result<Team, AppError> {
        self.teams
            .iter()
            .find(|t| t.name == name)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Unknown team {}", name)))
    }

    fn upsert_identifier(&mut self, identifier: &Identifier) -> Identifier {
        let key = identifier.key();
        if let Some(found) = self.identifiers.iter().find(|i| i.key() == key) {
            return found.clone();
        }
        let mut created = identifier.clone();
        created.id = self.next_id();
        self.identifiers.push(created.clone());
        created
    }

    fn hydrate(&self, entry: &Entry) -> Entry {
        let mut entry = entry.clone();
        entry.shares = self
            .shares
            .iter()
            .filter(|s| s.entry_id == entry.id)
            .filter_map(|s| {
                let team = self.teams.iter().find(|t| t.id == s.team_id)?;
                Some(EntryShare {
                    team_id: s.team_id,
                    team_name: team.name.clone(),
                    removed_from_team: s.removed_from_team,
                })
            })
            .collect();
        entry.author_username = self
            .users
            .iter()
            .find(|u| u.id == entry.user_id)
            .map(|u| u.username.clone())
            .unwrap_or_default();
        entry
    }

    fn entry(&self, id: i64) -> Result<Entry, AppError> {
        self.entries
            .iter()
            .find(|e| e.id == id)
            .map(|e| self.hydrate(e))
            .ok_or_else(|| AppError::NotFound(format!("Unknown entry {}", id)))
    }

    fn delete_entries(&mut self, ids: &[i64]) {
        self.votes.retain(|v| !ids.contains(&v.entry_id));
        self.shares.retain(|s| !ids.contains(&s.entry_id));
        self.entries.retain(|e| !ids.contains(&e.id));
    }
}

/// Implements every store trait over plain vectors behind a mutex.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub fn identifier_count(&self) -> usize {
        self.lock().identifiers.len()
    }

    pub fn vote_count(&self, entry_id: i64) -> usize {
        self.lock()
            .votes
            .iter()
            .filter(|v| v.entry_id == entry_id)
            .count()
    }

    pub fn share_count(&self, entry_id: i64) -> usize {
        self.lock()
            .shares
            .iter()
            .filter(|s| s.entry_id == entry_id)
            .count()
    }

    pub fn team_exists(&self, name: &str) -> bool {
        self.lock().teams.iter().any(|t| t.name == name)
    }

    pub fn entry_exists(&self, id: i64) -> bool {
        self.lock().entries.iter().any(|e| e.id == id)
    }

    pub fn ban_identifier(&self, identifier: &Identifier) {
        let mut state = self.lock();
        let id = state.upsert_identifier(identifier).id;
        if let Some(stored) = state.identifiers.iter_mut().find(|i| i.id == id) {
            stored.banned_from_public = true;
        }
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_username(&self, username: &str) -> Result<User, AppError> {
        self.lock()
            .users
            .iter()
            .find(|u| u.username == username)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Unknown user {}", username)))
    }

    async fn find_by_remember_token(&self, token: &str) -> Result<User, AppError> {
        self.lock()
            .users
            .iter()
            .find(|u| u.remember_token.as_deref() == Some(token))
            .cloned()
            .ok_or_else(|| AppError::NotFound("Unknown session".to_string()))
    }

    async fn find_by_email(&self, email: &str) -> Result<User, AppError> {
        self.lock()
            .users
            .iter()
            .find(|u| u.email.as_deref() == Some(email))
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Unknown email {}", email)))
    }

    async fn store(&self, user: NewUser) -> Result<User, AppError> {
        let mut state = self.lock();
        if state.users.iter().any(|u| u.username == user.username) {
            return Err(AppError::Conflict("Record already exists".to_string()));
        }
        let created = User {
            id: state.next_id(),
            username: user.username,
            encrypted_password: user.encrypted_password,
            ..Default::default()
        };
        state.users.push(created.clone());
        Ok(created)
    }

    async fn update(&self, user: &User) -> Result<(), AppError> {
        let mut state = self.lock();
        if let Some(email) = &user.email {
            if state
                .users
                .iter()
                .any(|u| u.id != user.id && u.email.as_ref() == Some(email))
            {
                return Err(AppError::Conflict("Record already exists".to_string()));
            }
        }
        let stored = state
            .users
            .iter_mut()
            .find(|u| u.id == user.id)
            .ok_or_else(|| AppError::NotFound(format!("Unknown user {}", user.username)))?;
        *stored = User {
            memberships: Vec::new(),
            ..user.clone()
        };
        Ok(())
    }
}

#[async_trait]
impl TeamStore for MemoryStore {
    async fn find_team_by_name(&self, name: &str) -> Result<Team, AppError> {
        self.lock().team_by_name(name)
    }

    async fn store(&self, name: &str, owner: &User) -> Result<Team, AppError> {
        let mut state = self.lock();
        if state.teams.iter().any(|t| t.name == name) {
            return Err(AppError::Conflict(
                "The team name already exists".to_string(),
            ));
        }
        let now = Utc::now();
        let team = Team {
            id: state.next_id(),
            name: name.to_string(),
            encrypted_access_key: String::new(),
            owner_id: owner.id,
            created_at: now,
            updated_at: now,
        };
        state.teams.push(team.clone());
        state.members.push(MemberRow {
            team_id: team.id,
            user_id: owner.id,
            role: Role::Owner,
        });
        Ok(team)
    }

    async fn add_membership(&self, team: &Team, user: &User, role: Role) -> Result<(), AppError> {
        let mut state = self.lock();
        if state
            .members
            .iter()
            .any(|m| m.team_id == team.id && m.user_id == user.id)
        {
            return Err(AppError::Conflict("Record already exists".to_string()));
        }
        state.members.push(MemberRow {
            team_id: team.id,
            user_id: user.id,
            role,
        });
        Ok(())
    }

    async fn remove_membership(
        &self,
        team: &Team,
        user_id: i64,
    ) -> Result<MembershipRemoval, AppError> {
        let mut state = self.lock();
        let before = state.members.len();
        state
            .members
            .retain(|m| !(m.team_id == team.id && m.user_id == user_id));
        if state.members.len() == before {
            return Err(AppError::NotFound("Membership not found".to_string()));
        }

        let entry_ids: Vec<i64> = state
            .entries
            .iter()
            .filter(|e| e.user_id == user_id)
            .filter(|e| {
                state
                    .shares
                    .iter()
                    .any(|s| s.entry_id == e.id && s.team_id == team.id)
            })
            .map(|e| e.id)
            .collect();
        state.delete_entries(&entry_ids);

        let team_deleted = !state.members.iter().any(|m| m.team_id == team.id);
        if team_deleted {
            state.shares.retain(|s| s.team_id != team.id);
            state.teams.retain(|t| t.id != team.id);
        }

        Ok(MembershipRemoval {
            entries_deleted: entry_ids.len() as u64,
            team_deleted,
        })
    }

    async fn update_membership(
        &self,
        team: &Team,
        user_id: i64,
        role: Role,
    ) -> Result<(), AppError> {
        let mut state = self.lock();
        let member = state
            .members
            .iter_mut()
            .find(|m| m.team_id == team.id && m.user_id == user_id)
            .ok_or_else(|| AppError::NotFound("Membership not found".to_string()))?;
        member.role = role;
        Ok(())
    }

    async fn update_access_key(
        &self,
        team: &Team,
        encrypted_access_key: &str,
    ) -> Result<(), AppError> {
        let mut state = self.lock();
        let stored = state
            .teams
            .iter_mut()
            .find(|t| t.id == team.id)
            .ok_or_else(|| AppError::NotFound(format!("Unknown team {}", team.name)))?;
        stored.encrypted_access_key = encrypted_access_key.to_string();
        Ok(())
    }

    async fn find_memberships_for_user(
        &self,
        user_id: i64,
    ) -> Result<Vec<TeamMembership>, AppError> {
        let state = self.lock();
        Ok(state
            .members
            .iter()
            .filter(|m| m.user_id == user_id)
            .filter_map(|m| {
                let team = state.teams.iter().find(|t| t.id == m.team_id)?;
                Some(TeamMembership {
                    team_id: team.id,
                    team_name: team.name.clone(),
                    role: m.role,
                    user_id,
                })
            })
            .collect())
    }

    async fn find_memberships_for_team(&self, team: &Team) -> Result<Vec<Membership>, AppError> {
        let state = self.lock();
        Ok(state
            .members
            .iter()
            .filter(|m| m.team_id == team.id)
            .filter_map(|m| {
                let user = state.users.iter().find(|u| u.id == m.user_id)?;
                Some(Membership {
                    username: user.username.clone(),
                    role: m.role,
                })
            })
            .collect())
    }
}

#[async_trait]
impl EntryStore for MemoryStore {
    async fn upsert_identifier(&self, identifier: &Identifier) -> Result<Identifier, AppError> {
        Ok(self.lock().upsert_identifier(identifier))
    }

    async fn entries_for_identifier(&self, identifier_id: i64) -> Result<Vec<Entry>, AppError> {
        let state = self.lock();
        Ok(state
            .entries
            .iter()
            .filter(|e| e.identifier_id == identifier_id)
            .map(|e| state.hydrate(e))
            .collect())
    }

    async fn store(&self, draft: EntryDraft, author: &User) -> Result<Entry, AppError> {
        let mut state = self.lock();
        let identifier = state.upsert_identifier(&draft.identifier);
        visibility::check_publishable(&identifier, draft.public)?;

        let teams = draft
            .teams
            .iter()
            .map(|name| state.team_by_name(name))
            .collect::<Result<Vec<_>, _>>()?;
        let now = Utc::now();

        let (entry_id, retracted) = match draft.id {
            Some(id) => {
                let existing = state.entry(id)?;
                visibility::authorize_update(author, &existing)?;
                visibility::authorize_shares(author, &existing.shares, &teams)?;
                let retracted = visibility::retracted_shares(author, &existing, &teams);

                if let Some(stored) = state.entries.iter_mut().find(|e| e.id == id) {
                    stored.title = draft.title;
                    stored.body = draft.body;
                    stored.body_rendered = draft.body_rendered;
                    stored.entry_type = draft.entry_type;
                    stored.anchor = draft.anchor;
                    stored.public = draft.public;
                    stored.identifier_id = identifier.id;
                    stored.updated_at = now;
                }
                (id, retracted)
            }
            None => {
                visibility::authorize_shares(author, &[], &teams)?;
                let id = state.next_id();
                state.entries.push(Entry {
                    id,
                    title: draft.title,
                    body: draft.body,
                    body_rendered: draft.body_rendered,
                    entry_type: draft.entry_type,
                    anchor: draft.anchor,
                    public: draft.public,
                    removed_from_public: false,
                    shares: Vec::new(),
                    identifier_id: identifier.id,
                    user_id: author.id,
                    author_username: String::new(),
                    score: 1,
                    created_at: now,
                    updated_at: now,
                });
                let vote_id = state.next_id();
                state.votes.push(Vote {
                    id: vote_id,
                    vote_type: VoteType::Up,
                    entry_id: id,
                    user_id: author.id,
                });
                (id, Vec::new())
            }
        };

        state
            .shares
            .retain(|s| s.entry_id != entry_id || !retracted.contains(&s.team_id));
        for team_id in teams.iter().map(|t| t.id) {
            let exists = state
                .shares
                .iter()
                .any(|s| s.entry_id == entry_id && s.team_id == team_id);
            if !exists {
                state.shares.push(ShareRow {
                    entry_id,
                    team_id,
                    removed_from_team: false,
                });
            }
        }

        state.entry(entry_id)
    }

    async fn delete(&self, entry: &Entry) -> Result<(), AppError> {
        let mut state = self.lock();
        state.entry(entry.id)?;
        state.delete_entries(&[entry.id]);
        Ok(())
    }

    async fn find_by_id(&self, id: i64) -> Result<Entry, AppError> {
        self.lock().entry(id)
    }

    async fn update_score(&self, entry_id: i64) -> Result<i64, AppError> {
        let mut state = self.lock();
        let votes: Vec<Vote> = state
            .votes
            .iter()
            .filter(|v| v.entry_id == entry_id)
            .cloned()
            .collect();
        let score = votes::tally(&votes);
        let entry = state
            .entries
            .iter_mut()
            .find(|e| e.id == entry_id)
            .ok_or_else(|| AppError::NotFound(format!("Unknown entry {}", entry_id)))?;
        entry.score = score;
        Ok(score)
    }

    async fn remove_from_public(&self, entry: &Entry) -> Result<(), AppError> {
        let mut state = self.lock();
        let stored = state
            .entries
            .iter_mut()
            .find(|e| e.id == entry.id)
            .ok_or_else(|| AppError::NotFound(format!("Unknown entry {}", entry.id)))?;
        stored.removed_from_public = true;
        Ok(())
    }

    async fn remove_from_teams(&self, entry: &Entry, team_ids: &[i64]) -> Result<(), AppError> {
        let mut state = self.lock();
        for share in state
            .shares
            .iter_mut()
            .filter(|s| s.entry_id == entry.id && team_ids.contains(&s.team_id))
        {
            share.removed_from_team = true;
        }
        Ok(())
    }
}

#[async_trait]
impl VoteStore for MemoryStore {
    async fn upsert(
        &self,
        entry_id: i64,
        user_id: i64,
        vote_type: VoteType,
    ) -> Result<(), AppError> {
        let mut state = self.lock();
        if let Some(vote) = state
            .votes
            .iter_mut()
            .find(|v| v.entry_id == entry_id && v.user_id == user_id)
        {
            vote.vote_type = vote_type;
            return Ok(());
        }
        let id = state.next_id();
        state.votes.push(Vote {
            id,
            vote_type,
            entry_id,
            user_id,
        });
        Ok(())
    }

    async fn find_by_entry_and_user(
        &self,
        entry_id: i64,
        user_id: i64,
    ) -> Result<Option<Vote>, AppError> {
        Ok(self
            .lock()
            .votes
            .iter()
            .find(|v| v.entry_id == entry_id && v.user_id == user_id)
            .cloned())
    }
}
