use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use blogs_shared::errors::{AppError, AppResult, ErrorCode};
use blogs_shared::types::ApiResponse;
use blogs_shared::{ApiJson, ApiPath};

use super::blogs::{self, LikeResponse};
use super::ensure_owner;
use crate::gate::Session;
use crate::models::{Comment, NewComment};
use crate::storage::Storage;
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCommentRequest {
    pub blog_id: Uuid,
    #[validate(length(min = 1, max = 2000))]
    pub description: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCommentRequest {
    #[validate(length(min = 1, max = 2000))]
    pub description: String,
}

async fn owned_comment(storage: &dyn Storage, id: Uuid, session: &Session) -> AppResult<Comment> {
    let comment = storage.find_comment(id).await?.ok_or_else(not_found)?;
    ensure_owner(comment.user_id, session, "comment")?;
    Ok(comment)
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    session: Session,
    ApiJson(req): ApiJson<CreateCommentRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Comment>>)> {
    req.validate()?;
    if state.storage.find_blog(req.blog_id).await?.is_none() {
        return Err(blogs::not_found());
    }

    let comment = state
        .storage
        .create_comment(NewComment {
            id: Uuid::now_v7(),
            description: req.description,
            blog_id: req.blog_id,
            user_id: session.user_id(),
        })
        .await?;

    Ok((StatusCode::CREATED, session.reply(comment)))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    session: Session,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<UpdateCommentRequest>,
) -> AppResult<Json<ApiResponse<Comment>>> {
    req.validate()?;
    let storage = state.storage.as_ref();
    owned_comment(storage, id, &session).await?;

    let comment = storage
        .update_comment(id, req.description)
        .await?
        .ok_or_else(not_found)?;
    Ok(session.reply(comment))
}

pub async fn remove(
    State(state): State<Arc<AppState>>,
    session: Session,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<ApiResponse<Comment>>> {
    let storage = state.storage.as_ref();
    owned_comment(storage, id, &session).await?;

    let comment = storage.delete_comment(id).await?.ok_or_else(not_found)?;
    Ok(session.reply(comment))
}

pub async fn toggle_like(
    State(state): State<Arc<AppState>>,
    session: Session,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<ApiResponse<LikeResponse>>> {
    if state.storage.find_comment(id).await?.is_none() {
        return Err(not_found());
    }
    let liked = state.storage.toggle_comment_like(session.user_id(), id).await?;
    Ok(session.reply(LikeResponse { liked }))
}

fn not_found() -> AppError {
    AppError::new(ErrorCode::CommentNotFound, "comment not found")
}
