//! Account endpoints.

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use super::{success, ApiJson, ApiResponse, ApiResult};
use crate::auth;
use crate::errors::AppError;
use crate::models::{ChangeEmailRequest, ChangePasswordRequest, CredentialsRequest};
use crate::service::users;
use crate::store::RequestContext;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub email: Option<String>,
}

/// POST /api/users/register
pub async fn register(
    ctx: RequestContext,
    ApiJson(request): ApiJson<CredentialsRequest>,
) -> ApiResult<()> {
    users::register(&ctx, request).await?;
    success(())
}

/// POST /api/users/login - Opens a session and sets the session cookie.
pub async fn login(
    State(state): State<AppState>,
    ctx: RequestContext,
    ApiJson(request): ApiJson<CredentialsRequest>,
) -> Result<Response, AppError> {
    let session = users::login(&ctx, request).await?;
    let cookie = auth::session_cookie(
        &state.config.session_cookie,
        &session.token,
        state.config.session_ttl_secs,
    );

    let body = ApiResponse::new(LoginResponse {
        token: session.token,
        email: session.email,
    });
    Ok(([(header::SET_COOKIE, cookie)], body).into_response())
}

/// POST /api/users/logout
pub async fn logout(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<Response, AppError> {
    users::logout(&ctx).await?;
    let cookie = auth::expired_cookie(&state.config.session_cookie);
    Ok(([(header::SET_COOKIE, cookie)], ApiResponse::new(())).into_response())
}

/// POST /api/users/password
pub async fn change_password(
    ctx: RequestContext,
    ApiJson(request): ApiJson<ChangePasswordRequest>,
) -> ApiResult<()> {
    users::change_password(&ctx, request).await?;
    success(())
}

/// POST /api/users/email
pub async fn change_email(
    ctx: RequestContext,
    ApiJson(request): ApiJson<ChangeEmailRequest>,
) -> ApiResult<()> {
    users::change_email(&ctx, request).await?;
    success(())
}
