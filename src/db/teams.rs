//! [`TeamStore`] over SQLite.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;

use super::repository::{delete_entries_in, role_from_row, team_by_name_in, Repository};
use crate::errors::AppError;
use crate::models::{Membership, MembershipRemoval, Role, Team, TeamMembership, User};
use crate::store::TeamStore;

#[async_trait]
impl TeamStore for Repository {
    async fn find_team_by_name(&self, name: &str) -> Result<Team, AppError> {
        let mut conn = self.pool().acquire().await?;
        team_by_name_in(&mut conn, name).await
    }

    async fn store(&self, name: &str, owner: &User) -> Result<Team, AppError> {
        let mut tx = self.pool().begin().await?;

        let taken: i64 = sqlx::query("SELECT COUNT(*) AS cnt FROM teams WHERE name = ?")
            .bind(name)
            .fetch_one(&mut *tx)
            .await?
            .get("cnt");
        if taken != 0 {
            return Err(AppError::Conflict(
                "The team name already exists".to_string(),
            ));
        }

        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO teams (name, access_key, owner_id, created_at, updated_at) VALUES (?, '', ?, ?, ?)",
        )
        .bind(name)
        .bind(owner.id)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;
        let team_id = result.last_insert_rowid();

        sqlx::query("INSERT INTO team_user (team_id, user_id, role) VALUES (?, ?, ?)")
            .bind(team_id)
            .bind(owner.id)
            .bind(Role::Owner.as_str())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(team = %name, owner = %owner.username, "Created team");

        Ok(Team {
            id: team_id,
            name: name.to_string(),
            encrypted_access_key: String::new(),
            owner_id: owner.id,
            created_at: now,
            updated_at: now,
        })
    }

    async fn add_membership(&self, team: &Team, user: &User, role: Role) -> Result<(), AppError> {
        sqlx::query("INSERT INTO team_user (team_id, user_id, role) VALUES (?, ?, ?)")
            .bind(team.id)
            .bind(user.id)
            .bind(role.as_str())
            .execute(self.pool())
            .await?;
        Ok(())
    }

    async fn remove_membership(
        &self,
        team: &Team,
        user_id: i64,
    ) -> Result<MembershipRemoval, AppError> {
        let mut tx = self.pool().begin().await?;

        let removed = sqlx::query("DELETE FROM team_user WHERE team_id = ? AND user_id = ?")
            .bind(team.id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        if removed.rows_affected() == 0 {
            return Err(AppError::NotFound("Membership not found".to_string()));
        }

        let entry_ids: Vec<i64> = sqlx::query(
            r#"SELECT DISTINCT e.id
               FROM entries e
               INNER JOIN entry_team et ON et.entry_id = e.id
               WHERE e.user_id = ? AND et.team_id = ?"#,
        )
        .bind(user_id)
        .bind(team.id)
        .fetch_all(&mut *tx)
        .await?
        .iter()
        .map(|row| row.get("id"))
        .collect();

        delete_entries_in(&mut tx, &entry_ids).await?;

        let remaining: i64 = sqlx::query("SELECT COUNT(*) AS cnt FROM team_user WHERE team_id = ?")
            .bind(team.id)
            .fetch_one(&mut *tx)
            .await?
            .get("cnt");

        let team_deleted = remaining == 0;
        if team_deleted {
            sqlx::query("DELETE FROM entry_team WHERE team_id = ?")
                .bind(team.id)
                .execute(&mut *tx)
                .await?;
            sqlx::query("DELETE FROM teams WHERE id = ?")
                .bind(team.id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        tracing::info!(
            team = %team.name,
            user_id,
            entries_deleted = entry_ids.len(),
            team_deleted,
            "Removed team membership"
        );

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
        let result = sqlx::query("UPDATE team_user SET role = ? WHERE team_id = ? AND user_id = ?")
            .bind(role.as_str())
            .bind(team.id)
            .bind(user_id)
            .execute(self.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Membership not found".to_string()));
        }
        Ok(())
    }

    async fn update_access_key(
        &self,
        team: &Team,
        encrypted_access_key: &str,
    ) -> Result<(), AppError> {
        sqlx::query("UPDATE teams SET access_key = ?, updated_at = ? WHERE id = ?")
            .bind(encrypted_access_key)
            .bind(Utc::now())
            .bind(team.id)
            .execute(self.pool())
            .await?;
        Ok(())
    }

    async fn find_memberships_for_user(
        &self,
        user_id: i64,
    ) -> Result<Vec<TeamMembership>, AppError> {
        let rows = sqlx::query(
            r#"SELECT t.id, t.name, tm.role
               FROM team_user tm
               INNER JOIN teams t ON t.id = tm.team_id
               WHERE tm.user_id = ?
               ORDER BY t.name"#,
        )
        .bind(user_id)
        .fetch_all(self.pool())
        .await?;

        rows.iter()
            .map(|row| {
                Ok(TeamMembership {
                    team_id: row.get("id"),
                    team_name: row.get("name"),
                    role: role_from_row(row)?,
                    user_id,
                })
            })
            .collect()
    }

    async fn find_memberships_for_team(&self, team: &Team) -> Result<Vec<Membership>, AppError> {
        let rows = sqlx::query(
            r#"SELECT u.username, tm.role
               FROM team_user tm
               INNER JOIN users u ON u.id = tm.user_id
               WHERE tm.team_id = ?
               ORDER BY u.username"#,
        )
        .bind(team.id)
        .fetch_all(self.pool())
        .await?;

        rows.iter()
            .map(|row| {
                Ok(Membership {
                    username: row.get("username"),
                    role: role_from_row(row)?,
                })
            })
            .collect()
    }
}
