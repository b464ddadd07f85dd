//! [`VoteStore`] over SQLite.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;

use super::repository::Repository;
use crate::errors::AppError;
use crate::models::{Vote, VoteType};
use crate::store::VoteStore;

#[async_trait]
impl VoteStore for Repository {
    async fn upsert(
        &self,
        entry_id: i64,
        user_id: i64,
        vote_type: VoteType,
    ) -> Result<(), AppError> {
        let now = Utc::now();
        sqlx::query(
            r#"INSERT INTO votes (entry_id, user_id, type, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?)
               ON CONFLICT (entry_id, user_id)
               DO UPDATE SET type = excluded.type, updated_at = excluded.updated_at"#,
        )
        .bind(entry_id)
        .bind(user_id)
        .bind(vote_type.value())
        .bind(now)
        .bind(now)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    async fn find_by_entry_and_user(
        &self,
        entry_id: i64,
        user_id: i64,
    ) -> Result<Option<Vote>, AppError> {
        let row = sqlx::query(
            "SELECT id, type, entry_id, user_id FROM votes WHERE entry_id = ? AND user_id = ?",
        )
        .bind(entry_id)
        .bind(user_id)
        .fetch_optional(self.pool())
        .await?;

        row.map(|row| {
            let vote_type = VoteType::try_from(row.get::<i64, _>("type")).map_err(|e| {
                AppError::Internal(format!("Corrupt vote row for entry {}: {}", entry_id, e))
            })?;
            Ok(Vote {
                id: row.get("id"),
                vote_type,
                entry_id: row.get("entry_id"),
                user_id: row.get("user_id"),
            })
        })
        .transpose()
    }
}
