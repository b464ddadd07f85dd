//! [`UserStore`] over SQLite.

use async_trait::async_trait;
use chrono::Utc;

use super::repository::{user_from_row, Repository, USER_COLUMNS};
use crate::errors::AppError;
use crate::models::{NewUser, User};
use crate::store::UserStore;

impl Repository {
    async fn find_user_by(&self, column: &str, value: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM users WHERE {} = ?",
            USER_COLUMNS, column
        ))
        .bind(value)
        .fetch_optional(self.pool())
        .await?;

        Ok(row.as_ref().map(user_from_row))
    }
}

#[async_trait]
impl UserStore for Repository {
    async fn find_by_username(&self, username: &str) -> Result<User, AppError> {
        self.find_user_by("username", username)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Unknown user {}", username)))
    }

    async fn find_by_remember_token(&self, token: &str) -> Result<User, AppError> {
        self.find_user_by("remember_token", token)
            .await?
            .ok_or_else(|| AppError::NotFound("Unknown session".to_string()))
    }

    async fn find_by_email(&self, email: &str) -> Result<User, AppError> {
        self.find_user_by("email", email)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Unknown email {}", email)))
    }

    async fn store(&self, user: NewUser) -> Result<User, AppError> {
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO users (username, password, moderator, created_at, updated_at) VALUES (?, ?, 0, ?, ?)",
        )
        .bind(&user.username)
        .bind(&user.encrypted_password)
        .bind(now)
        .bind(now)
        .execute(self.pool())
        .await?;

        Ok(User {
            id: result.last_insert_rowid(),
            username: user.username,
            encrypted_password: user.encrypted_password,
            ..Default::default()
        })
    }

    async fn update(&self, user: &User) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"UPDATE users SET
                   username = ?,
                   email = ?,
                   password = ?,
                   remember_token = ?,
                   moderator = ?,
                   updated_at = ?
               WHERE id = ?"#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.encrypted_password)
        .bind(&user.remember_token)
        .bind(user.moderator)
        .bind(Utc::now())
        .bind(user.id)
        .execute(self.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Unknown user {}", user.username)));
        }
        Ok(())
    }
}
