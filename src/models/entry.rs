//! Entry (annotation) model and request bodies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};

use super::{require, Identifier};
use crate::errors::AppError;

/// The link between an entry and a team it is shared with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryShare {
    pub team_id: i64,
    pub team_name: String,
    /// Hidden from this team's listing by a team moderator
    pub removed_from_team: bool,
}

/// A user-authored annotation attached to an identifier.
#[derive(Debug, Clone, Serialize)]
pub struct Entry {
    pub id: i64,
    pub title: String,
    #[serde(skip)]
    pub body: String,
    #[serde(skip)]
    pub body_rendered: String,
    #[serde(rename = "type")]
    pub entry_type: String,
    pub anchor: String,
    pub public: bool,
    #[serde(skip)]
    pub removed_from_public: bool,
    #[serde(rename = "teams", serialize_with = "serialize_team_names")]
    pub shares: Vec<EntryShare>,
    #[serde(skip)]
    pub identifier_id: i64,
    #[serde(skip)]
    pub user_id: i64,
    #[serde(rename = "author")]
    pub author_username: String,
    pub score: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn serialize_team_names<S: Serializer>(shares: &[EntryShare], s: S) -> Result<S::Ok, S::Error> {
    s.collect_seq(shares.iter().map(|share| share.team_name.as_str()))
}

impl Entry {
    /// Whether the entry is shared with `team_id` and not hidden from it.
    pub fn is_listed_for_team(&self, team_id: i64) -> bool {
        self.shares
            .iter()
            .any(|share| share.team_id == team_id && !share.removed_from_team)
    }

    pub fn team_names(&self) -> impl Iterator<Item = &str> {
        self.shares.iter().map(|share| share.team_name.as_str())
    }
}

/// A validated, rendered entry ready to be persisted.
#[derive(Debug, Clone)]
pub struct EntryDraft {
    /// `None` creates a new entry
    pub id: Option<i64>,
    pub title: String,
    pub body: String,
    pub body_rendered: String,
    pub entry_type: String,
    pub anchor: String,
    pub public: bool,
    pub teams: Vec<String>,
    pub identifier: Identifier,
}

/// Request body for creating or updating an entry.
#[derive(Debug, Clone, Deserialize)]
pub struct SaveEntryRequest {
    /// Zero or absent creates a new entry
    #[serde(default)]
    pub entry_id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub public: bool,
    #[serde(default, rename = "type")]
    pub entry_type: String,
    #[serde(default)]
    pub teams: Vec<String>,
    #[serde(default)]
    pub identifier: Identifier,
    #[serde(default)]
    pub anchor: String,
}

impl SaveEntryRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        require(&self.title, "title")?;
        require(&self.body, "body")?;
        require(&self.anchor, "anchor")?;
        self.identifier.validate()
    }

    /// Turn the request into a draft, with `body_rendered` produced by `render`.
    pub fn into_draft(self, render: impl FnOnce(&str) -> String) -> EntryDraft {
        let body_rendered = render(&self.body);
        let mut teams = self.teams;
        teams.retain(|t| !t.trim().is_empty());
        teams.sort();
        teams.dedup();

        EntryDraft {
            id: (self.entry_id > 0).then_some(self.entry_id),
            title: self.title,
            body: self.body,
            body_rendered,
            entry_type: self.entry_type,
            anchor: self.anchor,
            public: self.public,
            teams,
            identifier: self.identifier,
        }
    }
}

/// Request body addressing a single entry.
#[derive(Debug, Clone, Deserialize)]
pub struct EntryIdRequest {
    #[serde(default)]
    pub entry_id: i64,
}

impl EntryIdRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.entry_id <= 0 {
            return Err(AppError::missing("entry_id"));
        }
        Ok(())
    }
}

/// The three visibility partitions of an identifier's entries.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EntryPartitions {
    pub public_entries: Vec<Entry>,
    pub own_entries: Vec<Entry>,
    pub team_entries: Vec<Entry>,
}

/// A single entry as shown to a particular actor.
#[derive(Debug, Clone, Serialize)]
pub struct EntryDetails {
    pub entry: Entry,
    pub body: String,
    pub body_rendered: String,
    /// The actor's vote on this entry, 0 when none
    pub vote: i64,
    pub global_moderator: bool,
    pub team_moderator: bool,
}
