//! SQLite repository backing every store trait.
//!
//! Multi-step mutations run inside a single transaction; the helpers in this
//! file take a bare connection so they can be used both from a pool
//! connection and from inside a transaction.

use std::collections::HashMap;

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};

use crate::errors::AppError;
use crate::models::{Entry, EntryShare, Identifier, IdentifierKey, Role, Team, User};

pub(super) const USER_COLUMNS: &str =
    "id, username, email, password, remember_token, moderator";

pub(super) const TEAM_COLUMNS: &str = "id, name, access_key, owner_id, created_at, updated_at";

pub(super) const ENTRY_SELECT: &str = r#"
    SELECT e.id, e.title, e.body, e.body_rendered, e.type, e.anchor, e.public,
           e.removed_from_public, e.identifier_id, e.user_id, u.username, e.score,
           e.created_at, e.updated_at
    FROM entries e
    INNER JOIN users u ON u.id = e.user_id"#;

const IDENTIFIER_COLUMNS: &str = "id, docset_name, docset_filename, docset_platform, docset_bundle, \
     docset_version, page_path, page_title, httrack_source, banned_from_public";

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub(super) fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

pub(super) async fn upsert_identifier_in(
    conn: &mut SqliteConnection,
    identifier: &Identifier,
) -> Result<Identifier, AppError> {
    let existing = match identifier.key() {
        IdentifierKey::Source {
            docset_filename,
            httrack_source,
        } => {
            sqlx::query(&format!(
                "SELECT {} FROM identifiers WHERE docset_filename = ? AND httrack_source = ? LIMIT 1",
                IDENTIFIER_COLUMNS
            ))
            .bind(docset_filename)
            .bind(httrack_source)
            .fetch_optional(&mut *conn)
            .await?
        }
        IdentifierKey::Page {
            docset_filename,
            page_path,
        } => {
            sqlx::query(&format!(
                "SELECT {} FROM identifiers WHERE docset_filename = ? AND page_path = ? LIMIT 1",
                IDENTIFIER_COLUMNS
            ))
            .bind(docset_filename)
            .bind(page_path)
            .fetch_optional(&mut *conn)
            .await?
        }
    };

    if let Some(row) = existing {
        return Ok(identifier_from_row(&row));
    }

    let result = sqlx::query(
        r#"INSERT INTO identifiers
           (docset_name, docset_filename, docset_platform, docset_bundle, docset_version,
            page_path, page_title, httrack_source, banned_from_public, created_at)
           VALUES (?, ?, ?, ?, ?, ?, ?, ?, 0, ?)"#,
    )
    .bind(&identifier.docset_name)
    .bind(&identifier.docset_filename)
    .bind(&identifier.docset_platform)
    .bind(&identifier.docset_bundle)
    .bind(&identifier.docset_version)
    .bind(&identifier.page_path)
    .bind(&identifier.page_title)
    .bind(&identifier.httrack_source)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    tracing::debug!(
        docset = %identifier.docset_filename,
        page = %identifier.page_path,
        "Created identifier"
    );

    Ok(Identifier {
        id: result.last_insert_rowid(),
        banned_from_public: false,
        ..identifier.clone()
    })
}

pub(super) async fn team_by_name_in(
    conn: &mut SqliteConnection,
    name: &str,
) -> Result<Team, AppError> {
    let row = sqlx::query(&format!("SELECT {} FROM teams WHERE name = ?", TEAM_COLUMNS))
        .bind(name)
        .fetch_optional(&mut *conn)
        .await?;

    row.as_ref()
        .map(team_from_row)
        .ok_or_else(|| AppError::NotFound(format!("Unknown team {}", name)))
}

/// Load the shares of the given entries, keyed by entry id.
async fn shares_for_entries(
    conn: &mut SqliteConnection,
    entry_ids: &[i64],
) -> Result<HashMap<i64, Vec<EntryShare>>, AppError> {
    let mut shares: HashMap<i64, Vec<EntryShare>> = HashMap::new();
    if entry_ids.is_empty() {
        return Ok(shares);
    }

    let placeholders = vec!["?"; entry_ids.len()].join(", ");
    let sql = format!(
        r#"SELECT et.entry_id, et.team_id, et.removed_from_team, t.name
           FROM entry_team et
           INNER JOIN teams t ON t.id = et.team_id
           WHERE et.entry_id IN ({})
           ORDER BY t.name"#,
        placeholders
    );
    let mut query = sqlx::query(&sql);
    for id in entry_ids {
        query = query.bind(id);
    }

    for row in query.fetch_all(&mut *conn).await? {
        shares
            .entry(row.get("entry_id"))
            .or_default()
            .push(EntryShare {
                team_id: row.get("team_id"),
                team_name: row.get("name"),
                removed_from_team: row.get("removed_from_team"),
            });
    }
    Ok(shares)
}

/// Attach shares to freshly loaded entry rows.
pub(super) async fn hydrate_entries(
    conn: &mut SqliteConnection,
    rows: Vec<SqliteRow>,
) -> Result<Vec<Entry>, AppError> {
    let mut entries: Vec<Entry> = rows.iter().map(entry_from_row).collect();
    let ids: Vec<i64> = entries.iter().map(|e| e.id).collect();
    let mut shares = shares_for_entries(conn, &ids).await?;
    for entry in &mut entries {
        entry.shares = shares.remove(&entry.id).unwrap_or_default();
    }
    Ok(entries)
}

pub(super) async fn load_entry(conn: &mut SqliteConnection, id: i64) -> Result<Entry, AppError> {
    let row = sqlx::query(&format!("{} WHERE e.id = ?", ENTRY_SELECT))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Unknown entry {}", id)))?;

    let mut entries = hydrate_entries(conn, vec![row]).await?;
    entries
        .pop()
        .ok_or_else(|| AppError::NotFound(format!("Unknown entry {}", id)))
}

/// Delete entries together with their votes and shares.
pub(super) async fn delete_entries_in(
    conn: &mut SqliteConnection,
    entry_ids: &[i64],
) -> Result<(), AppError> {
    for id in entry_ids {
        sqlx::query("DELETE FROM votes WHERE entry_id = ?")
            .bind(id)
            .execute(&mut *conn)
            .await?;
        sqlx::query("DELETE FROM entry_team WHERE entry_id = ?")
            .bind(id)
            .execute(&mut *conn)
            .await?;
        sqlx::query("DELETE FROM entries WHERE id = ?")
            .bind(id)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

// Helper functions for row conversion

pub(super) fn user_from_row(row: &SqliteRow) -> User {
    User {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        encrypted_password: row.get("password"),
        remember_token: row.get("remember_token"),
        moderator: row.get("moderator"),
        memberships: Vec::new(),
    }
}

pub(super) fn team_from_row(row: &SqliteRow) -> Team {
    Team {
        id: row.get("id"),
        name: row.get("name"),
        encrypted_access_key: row.get("access_key"),
        owner_id: row.get("owner_id"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

pub(super) fn role_from_row(row: &SqliteRow) -> Result<Role, AppError> {
    let role: String = row.get("role");
    role.parse()
        .map_err(|e| AppError::Internal(format!("Corrupt membership role: {}", e)))
}

fn identifier_from_row(row: &SqliteRow) -> Identifier {
    Identifier {
        id: row.get("id"),
        banned_from_public: row.get("banned_from_public"),
        docset_name: row.get("docset_name"),
        docset_filename: row.get("docset_filename"),
        docset_platform: row.get("docset_platform"),
        docset_bundle: row.get("docset_bundle"),
        docset_version: row.get("docset_version"),
        page_path: row.get("page_path"),
        page_title: row.get("page_title"),
        httrack_source: row.get("httrack_source"),
    }
}

fn entry_from_row(row: &SqliteRow) -> Entry {
    Entry {
        id: row.get("id"),
        title: row.get("title"),
        body: row.get("body"),
        body_rendered: row.get("body_rendered"),
        entry_type: row.get("type"),
        anchor: row.get("anchor"),
        public: row.get("public"),
        removed_from_public: row.get("removed_from_public"),
        shares: Vec::new(),
        identifier_id: row.get("identifier_id"),
        user_id: row.get("user_id"),
        author_username: row.get("username"),
        score: row.get("score"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}
