use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use blogs_shared::errors::{AppError, AppResult, ErrorCode};
use blogs_shared::types::auth::TokenPair;
use blogs_shared::types::ApiResponse;
use blogs_shared::ApiJson;

use super::on_conflict;
use crate::gate::Session;
use crate::models::{NewRefreshToken, NewUser, User};
use crate::services::{auth_service, token_service};
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 50))]
    pub username: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1))]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: User,
    pub tokens: TokenPair,
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub revoked: usize,
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<User>>)> {
    req.validate()?;
    let email = req.email.trim().to_lowercase();

    if state.storage.find_user_by_email(&email).await?.is_some() {
        return Err(AppError::new(ErrorCode::EmailAlreadyExists, "email already registered"));
    }

    let password_hash = auth_service::hash_password(&req.password)?;
    let user = state
        .storage
        .create_user(NewUser {
            id: Uuid::now_v7(),
            username: req.username.trim().to_string(),
            email,
            password_hash,
        })
        .await
        .map_err(on_conflict(ErrorCode::EmailAlreadyExists, "email already registered"))?;

    tracing::info!(user_id = %user.id, "user registered");

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(user))))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> AppResult<Json<ApiResponse<LoginResponse>>> {
    req.validate()?;

    let Some(user) = state
        .storage
        .find_user_by_email(&req.email.trim().to_lowercase())
        .await?
    else {
        auth_service::verify_unknown_account(&req.password)?;
        return Err(invalid_credentials());
    };

    if !auth_service::verify_password(&req.password, &user.password_hash)? {
        return Err(invalid_credentials());
    }

    let config = &state.config;
    let access_token = token_service::issue_access_token(user.id, &config.jwt_secret, config.access_ttl())?;
    let refresh_token = token_service::issue_refresh_token()?;

    state
        .storage
        .insert_refresh_token(NewRefreshToken {
            id: Uuid::now_v7(),
            user_id: user.id,
            token_hash: token_service::hash_refresh_token(&refresh_token),
            expires_at: Utc::now() + config.refresh_ttl(),
        })
        .await?;

    tracing::info!(user_id = %user.id, "user logged in");

    let tokens = TokenPair::new(access_token, refresh_token, config.access_token_ttl_secs);
    Ok(Json(ApiResponse::ok(LoginResponse { user, tokens })))
}

/// Revokes every refresh session of the caller.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> AppResult<Json<ApiResponse<LogoutResponse>>> {
    let revoked = state.storage.revoke_refresh_tokens(session.user_id()).await?;
    tracing::info!(user_id = %session.user_id(), revoked, "user logged out");
    Ok(session.reply(LogoutResponse { revoked }))
}

fn invalid_credentials() -> AppError {
    AppError::new(ErrorCode::InvalidCredentials, "invalid email or password")
}
