//! Account operations: registration, sessions, password and email changes.

use crate::auth::password;
use crate::errors::AppError;
use crate::models::{
    ChangeEmailRequest, ChangePasswordRequest, CredentialsRequest, NewUser, User,
};
use crate::store::{RequestContext, Stores};

const INVALID_LOGIN: &str = "Login failed: invalid username or password";

/// A freshly opened session.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub email: Option<String>,
}

/// Load the memberships of `user`.
pub async fn with_memberships(stores: &Stores, mut user: User) -> Result<User, AppError> {
    user.memberships = stores.teams.find_memberships_for_user(user.id).await?;
    Ok(user)
}

/// The user owning a session token, or `None` for unknown tokens.
pub async fn session_actor(stores: &Stores, token: &str) -> Result<Option<User>, AppError> {
    match stores.users.find_by_remember_token(token).await {
        Ok(user) => Ok(Some(with_memberships(stores, user).await?)),
        Err(AppError::NotFound(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

pub async fn register(ctx: &RequestContext, request: CredentialsRequest) -> Result<(), AppError> {
    request.validate()?;

    let new_user = NewUser {
        username: request.username.trim().to_string(),
        encrypted_password: password::hash_secret(&request.password)?,
    };
    match ctx.stores.users.store(new_user).await {
        Ok(user) => {
            tracing::info!(username = %user.username, "Registered user");
            Ok(())
        }
        Err(AppError::Conflict(_)) => Err(AppError::Conflict(
            "A user with this username already exists".to_string(),
        )),
        Err(e) => Err(e),
    }
}

/// Verify credentials and mint a new session token for the user.
pub async fn login(ctx: &RequestContext, request: CredentialsRequest) -> Result<Session, AppError> {
    request.validate()?;

    let mut user = match ctx.stores.users.find_by_username(request.username.trim()).await {
        Ok(user) => user,
        Err(AppError::NotFound(_)) => {
            return Err(AppError::Unauthenticated(INVALID_LOGIN.to_string()))
        }
        Err(e) => return Err(e),
    };
    if !user.passwords_match(&request.password) {
        tracing::warn!(username = %user.username, "Failed login");
        return Err(AppError::Unauthenticated(INVALID_LOGIN.to_string()));
    }

    let token = password::mint_session_token();
    user.remember_token = Some(token.clone());
    ctx.stores.users.update(&user).await?;

    tracing::info!(username = %user.username, "User logged in");
    Ok(Session {
        token,
        email: user.email,
    })
}

pub async fn logout(ctx: &RequestContext) -> Result<(), AppError> {
    let mut user = ctx.require_actor()?.clone();
    user.remember_token = None;
    ctx.stores.users.update(&user).await
}

pub async fn change_password(
    ctx: &RequestContext,
    request: ChangePasswordRequest,
) -> Result<(), AppError> {
    let mut user = ctx.require_actor()?.clone();
    request.validate()?;

    user.change_password(&request.password)?;
    ctx.stores.users.update(&user).await
}

pub async fn change_email(
    ctx: &RequestContext,
    request: ChangeEmailRequest,
) -> Result<(), AppError> {
    let mut user = ctx.require_actor()?.clone();
    request.validate()?;
    let email = request.email.trim().to_string();

    match ctx.stores.users.find_by_email(&email).await {
        Ok(other) if other.id != user.id => {
            return Err(AppError::Conflict(
                "A user with this email already exists".to_string(),
            ))
        }
        Ok(_) | Err(AppError::NotFound(_)) => {}
        Err(e) => return Err(e),
    }

    user.email = Some(email);
    ctx.stores.users.update(&user).await
}
