use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use blogs_shared::errors::{AppError, AppResult, ErrorCode};
use blogs_shared::types::{ApiResponse, PaginationParams};
use blogs_shared::{ApiJson, ApiPath, ApiQuery};

use super::on_conflict;
use crate::gate::Session;
use crate::models::{BlogDetails, User, UserChanges};
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 50))]
    pub username: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FollowResponse {
    pub following: bool,
}

pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    session: Session,
    ApiJson(req): ApiJson<UpdateProfileRequest>,
) -> AppResult<Json<ApiResponse<User>>> {
    req.validate()?;
    let changes = UserChanges {
        username: req.username.map(|u| u.trim().to_string()),
        email: req.email.map(|e| e.trim().to_lowercase()),
    };
    if changes.is_empty() {
        return Err(AppError::bad_request("nothing to update"));
    }

    if let Some(email) = &changes.email {
        let taken = state.storage.find_user_by_email(email).await?;
        if taken.is_some_and(|other| other.id != session.user_id()) {
            return Err(AppError::new(ErrorCode::EmailAlreadyExists, "email already registered"));
        }
    }

    let user = state
        .storage
        .update_user(session.user_id(), changes)
        .await
        .map_err(on_conflict(ErrorCode::EmailAlreadyExists, "email already registered"))?
        .ok_or_else(user_not_found)?;

    Ok(session.reply(user))
}

pub async fn toggle_follow(
    State(state): State<Arc<AppState>>,
    session: Session,
    ApiPath(target_id): ApiPath<Uuid>,
) -> AppResult<Json<ApiResponse<FollowResponse>>> {
    if target_id == session.user_id() {
        return Err(AppError::new(ErrorCode::CannotFollowSelf, "you cannot follow yourself"));
    }
    if state.storage.find_user_by_id(target_id).await?.is_none() {
        return Err(user_not_found());
    }

    let following = state.storage.toggle_follow(session.user_id(), target_id).await?;
    tracing::debug!(follower = %session.user_id(), target = %target_id, following, "follow toggled");

    Ok(session.reply(FollowResponse { following }))
}

/// Deletes the caller together with everything they own.
pub async fn delete_account(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> AppResult<Json<ApiResponse<User>>> {
    let user = state
        .storage
        .delete_user(session.user_id())
        .await?
        .ok_or_else(user_not_found)?;

    tracing::info!(user_id = %user.id, "account deleted");

    Ok(session.reply(user))
}

pub async fn feed(
    State(state): State<Arc<AppState>>,
    session: Session,
    ApiQuery(page): ApiQuery<PaginationParams>,
) -> AppResult<Json<ApiResponse<Vec<BlogDetails>>>> {
    let blogs = state.storage.feed(session.user_id(), page).await?;
    Ok(session.reply(blogs))
}

fn user_not_found() -> AppError {
    AppError::new(ErrorCode::UserNotFound, "user not found")
}
