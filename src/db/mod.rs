//! Database module for SQLite persistence.
//!
//! SQLite is the source of truth for all application data. The schema mirrors
//! the original annotation service: users, teams with role memberships,
//! identifiers, entries shared with teams, and per-user votes.

mod entries;
mod repository;
mod teams;
mod users;
mod votes;

pub use repository::*;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

/// Initialize the database connection pool and run migrations.
pub async fn init_database(db_path: &Path) -> Result<SqlitePool, sqlx::Error> {
    // Ensure the parent directory exists
    if let Some(parent) = db_path.parent() {
        if let Err(e) = tokio::fs::create_dir_all(parent).await {
            tracing::warn!(path = %parent.display(), "Failed to create database directory: {}", e);
        }
    }

    let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

    let options = SqliteConnectOptions::from_str(&db_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    run_migrations(&pool).await?;

    Ok(pool)
}

/// Run database migrations.
async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL UNIQUE,
            email TEXT UNIQUE,
            password TEXT NOT NULL,
            remember_token TEXT,
            moderator INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS teams (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            access_key TEXT NOT NULL DEFAULT '',
            owner_id INTEGER NOT NULL REFERENCES users(id),
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS team_user (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            team_id INTEGER NOT NULL REFERENCES teams(id),
            user_id INTEGER NOT NULL REFERENCES users(id),
            role TEXT NOT NULL,
            UNIQUE (team_id, user_id)
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS identifiers (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            docset_name TEXT NOT NULL DEFAULT '',
            docset_filename TEXT NOT NULL,
            docset_platform TEXT NOT NULL DEFAULT '',
            docset_bundle TEXT NOT NULL DEFAULT '',
            docset_version TEXT NOT NULL DEFAULT '',
            page_path TEXT NOT NULL DEFAULT '',
            page_title TEXT NOT NULL DEFAULT '',
            httrack_source TEXT NOT NULL DEFAULT '',
            banned_from_public INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS entries (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            body TEXT NOT NULL,
            body_rendered TEXT NOT NULL,
            type TEXT NOT NULL DEFAULT '',
            identifier_id INTEGER NOT NULL REFERENCES identifiers(id),
            anchor TEXT NOT NULL,
            public INTEGER NOT NULL DEFAULT 0,
            removed_from_public INTEGER NOT NULL DEFAULT 0,
            score INTEGER NOT NULL DEFAULT 0,
            user_id INTEGER NOT NULL REFERENCES users(id),
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS entry_team (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            entry_id INTEGER NOT NULL REFERENCES entries(id),
            team_id INTEGER NOT NULL REFERENCES teams(id),
            removed_from_team INTEGER NOT NULL DEFAULT 0,
            UNIQUE (entry_id, team_id)
        );

        CREATE TABLE IF NOT EXISTS votes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            entry_id INTEGER NOT NULL REFERENCES entries(id),
            user_id INTEGER NOT NULL REFERENCES users(id),
            type INTEGER NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE (entry_id, user_id)
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create indexes for common queries
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_users_remember_token ON users(remember_token);
        CREATE INDEX IF NOT EXISTS idx_identifiers_page ON identifiers(docset_filename, page_path);
        CREATE INDEX IF NOT EXISTS idx_identifiers_source ON identifiers(docset_filename, httrack_source);
        CREATE INDEX IF NOT EXISTS idx_entries_identifier ON entries(identifier_id);
        CREATE INDEX IF NOT EXISTS idx_entries_user ON entries(user_id);
        CREATE INDEX IF NOT EXISTS idx_entry_team_team ON entry_team(team_id);
        CREATE INDEX IF NOT EXISTS idx_team_user_user ON team_user(user_id);
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
