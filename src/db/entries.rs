//! [`EntryStore`] over SQLite.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;

use super::repository::{
    delete_entries_in, hydrate_entries, load_entry, team_by_name_in, upsert_identifier_in,
    Repository, ENTRY_SELECT,
};
use crate::errors::AppError;
use crate::models::{Entry, EntryDraft, Identifier, User, VoteType};
use crate::store::EntryStore;
use crate::visibility;

#[async_trait]
impl EntryStore for Repository {
    async fn upsert_identifier(&self, identifier: &Identifier) -> Result<Identifier, AppError> {
        let mut tx = self.pool().begin().await?;
        let identifier = upsert_identifier_in(&mut tx, identifier).await?;
        tx.commit().await?;
        Ok(identifier)
    }

    async fn entries_for_identifier(&self, identifier_id: i64) -> Result<Vec<Entry>, AppError> {
        let mut conn = self.pool().acquire().await?;
        let rows = sqlx::query(&format!(
            "{} WHERE e.identifier_id = ? ORDER BY e.score DESC, e.id",
            ENTRY_SELECT
        ))
        .bind(identifier_id)
        .fetch_all(&mut *conn)
        .await?;

        hydrate_entries(&mut conn, rows).await
    }

    async fn store(&self, draft: EntryDraft, author: &User) -> Result<Entry, AppError> {
        let mut tx = self.pool().begin().await?;

        let identifier = upsert_identifier_in(&mut tx, &draft.identifier).await?;
        visibility::check_publishable(&identifier, draft.public)?;

        let mut teams = Vec::with_capacity(draft.teams.len());
        for name in &draft.teams {
            teams.push(team_by_name_in(&mut tx, name).await?);
        }

        let now = Utc::now();
        let (entry_id, shared_with, retracted) = match draft.id {
            Some(id) => {
                let existing = load_entry(&mut tx, id).await?;
                visibility::authorize_update(author, &existing)?;
                visibility::authorize_shares(author, &existing.shares, &teams)?;
                let retracted = visibility::retracted_shares(author, &existing, &teams);

                sqlx::query(
                    r#"UPDATE entries SET
                           title = ?,
                           body = ?,
                           body_rendered = ?,
                           type = ?,
                           identifier_id = ?,
                           anchor = ?,
                           public = ?,
                           updated_at = ?
                       WHERE id = ?"#,
                )
                .bind(&draft.title)
                .bind(&draft.body)
                .bind(&draft.body_rendered)
                .bind(&draft.entry_type)
                .bind(identifier.id)
                .bind(&draft.anchor)
                .bind(draft.public)
                .bind(now)
                .bind(id)
                .execute(&mut *tx)
                .await?;

                let shared_with: Vec<i64> =
                    existing.shares.iter().map(|share| share.team_id).collect();
                (id, shared_with, retracted)
            }
            None => {
                visibility::authorize_shares(author, &[], &teams)?;

                let result = sqlx::query(
                    r#"INSERT INTO entries
                       (title, body, body_rendered, type, identifier_id, anchor, public,
                        removed_from_public, score, user_id, created_at, updated_at)
                       VALUES (?, ?, ?, ?, ?, ?, ?, 0, 1, ?, ?, ?)"#,
                )
                .bind(&draft.title)
                .bind(&draft.body)
                .bind(&draft.body_rendered)
                .bind(&draft.entry_type)
                .bind(identifier.id)
                .bind(&draft.anchor)
                .bind(draft.public)
                .bind(author.id)
                .bind(now)
                .bind(now)
                .execute(&mut *tx)
                .await?;
                let id = result.last_insert_rowid();

                // The author's own up-vote backs the initial score of 1.
                sqlx::query(
                    "INSERT INTO votes (entry_id, user_id, type, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
                )
                .bind(id)
                .bind(author.id)
                .bind(VoteType::Up.value())
                .bind(now)
                .bind(now)
                .execute(&mut *tx)
                .await?;
                (id, Vec::new(), Vec::new())
            }
        };

        for team_id in &retracted {
            sqlx::query("DELETE FROM entry_team WHERE entry_id = ? AND team_id = ?")
                .bind(entry_id)
                .bind(team_id)
                .execute(&mut *tx)
                .await?;
        }
        for team in teams.iter().filter(|t| !shared_with.contains(&t.id)) {
            sqlx::query(
                "INSERT INTO entry_team (entry_id, team_id, removed_from_team) VALUES (?, ?, 0)",
            )
            .bind(entry_id)
            .bind(team.id)
            .execute(&mut *tx)
            .await?;
        }

        let entry = load_entry(&mut tx, entry_id).await?;
        tx.commit().await?;

        tracing::info!(
            entry_id,
            author = %author.username,
            created = draft.id.is_none(),
            "Saved entry"
        );
        Ok(entry)
    }

    async fn delete(&self, entry: &Entry) -> Result<(), AppError> {
        let mut tx = self.pool().begin().await?;
        delete_entries_in(&mut tx, &[entry.id]).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn find_by_id(&self, id: i64) -> Result<Entry, AppError> {
        let mut conn = self.pool().acquire().await?;
        load_entry(&mut conn, id).await
    }

    async fn update_score(&self, entry_id: i64) -> Result<i64, AppError> {
        let row = sqlx::query(
            r#"UPDATE entries
               SET score = (SELECT COALESCE(SUM(type), 0) FROM votes WHERE entry_id = ?)
               WHERE id = ?
               RETURNING score"#,
        )
        .bind(entry_id)
        .bind(entry_id)
        .fetch_optional(self.pool())
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Unknown entry {}", entry_id)))?;

        Ok(row.get("score"))
    }

    async fn remove_from_public(&self, entry: &Entry) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE entries SET removed_from_public = 1 WHERE id = ?")
            .bind(entry.id)
            .execute(self.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Unknown entry {}", entry.id)));
        }
        Ok(())
    }

    async fn remove_from_teams(&self, entry: &Entry, team_ids: &[i64]) -> Result<(), AppError> {
        let mut tx = self.pool().begin().await?;
        for team_id in team_ids {
            sqlx::query(
                "UPDATE entry_team SET removed_from_team = 1 WHERE entry_id = ? AND team_id = ?",
            )
            .bind(entry.id)
            .bind(team_id)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }
}
