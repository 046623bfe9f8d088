use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use blogs_shared::errors::{AppError, AppResult, ErrorCode};
use blogs_shared::types::{ApiResponse, PaginationParams};
use blogs_shared::{ApiJson, ApiPath, ApiQuery};

use super::ensure_owner;
use crate::gate::Session;
use crate::models::{Blog, BlogChanges, BlogDetails, CommentDetails, NewBlog};
use crate::storage::Storage;
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateBlogRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[validate(length(min = 1))]
    pub content: String,
    /// Category name, matched case-insensitively.
    #[validate(length(min = 1))]
    pub category: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateBlogRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    pub thumbnail_url: Option<String>,
    #[validate(length(min = 1))]
    pub content: Option<String>,
    #[validate(length(min = 1))]
    pub category: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LikeResponse {
    pub liked: bool,
}

async fn resolve_category(storage: &dyn Storage, name: &str) -> AppResult<Uuid> {
    storage
        .find_category_by_name(&name.trim().to_uppercase())
        .await?
        .map(|category| category.id)
        .ok_or_else(|| AppError::new(ErrorCode::InvalidCategory, "category does not exist"))
}

async fn owned_blog(storage: &dyn Storage, id: Uuid, session: &Session) -> AppResult<Blog> {
    let blog = storage.find_blog(id).await?.ok_or_else(not_found)?;
    ensure_owner(blog.author_id, session, "blog")?;
    Ok(blog)
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    session: Session,
    ApiJson(req): ApiJson<CreateBlogRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<BlogDetails>>)> {
    req.validate()?;
    let storage = state.storage.as_ref();
    let category_id = resolve_category(storage, &req.category).await?;

    let blog = storage
        .create_blog(NewBlog {
            id: Uuid::now_v7(),
            title: req.title.trim().to_string(),
            thumbnail_url: req.thumbnail_url.unwrap_or_default(),
            content: req.content,
            category_id,
            author_id: session.user_id(),
        })
        .await?;

    tracing::info!(blog_id = %blog.id, author_id = %blog.author_id, "blog created");

    let details = storage.blog_details(blog.id).await?.ok_or_else(not_found)?;
    Ok((StatusCode::CREATED, session.reply(details)))
}

/// The caller's own blogs, newest first.
pub async fn mine(
    State(state): State<Arc<AppState>>,
    session: Session,
    ApiQuery(page): ApiQuery<PaginationParams>,
) -> AppResult<Json<ApiResponse<Vec<BlogDetails>>>> {
    let blogs = state.storage.blogs_by_author(session.user_id(), page).await?;
    Ok(session.reply(blogs))
}

pub async fn show(
    State(state): State<Arc<AppState>>,
    session: Session,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<ApiResponse<BlogDetails>>> {
    let blog = state.storage.blog_details(id).await?.ok_or_else(not_found)?;
    Ok(session.reply(blog))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    session: Session,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<UpdateBlogRequest>,
) -> AppResult<Json<ApiResponse<BlogDetails>>> {
    req.validate()?;
    let storage = state.storage.as_ref();
    owned_blog(storage, id, &session).await?;

    let category_id = match &req.category {
        Some(name) => Some(resolve_category(storage, name).await?),
        None => None,
    };
    let changes = BlogChanges {
        title: req.title.map(|t| t.trim().to_string()),
        thumbnail_url: req.thumbnail_url,
        content: req.content,
        category_id,
    };
    if changes.title.is_none()
        && changes.thumbnail_url.is_none()
        && changes.content.is_none()
        && changes.category_id.is_none()
    {
        return Err(AppError::bad_request("nothing to update"));
    }

    storage.update_blog(id, changes).await?.ok_or_else(not_found)?;
    let details = storage.blog_details(id).await?.ok_or_else(not_found)?;
    Ok(session.reply(details))
}

pub async fn remove(
    State(state): State<Arc<AppState>>,
    session: Session,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<ApiResponse<Blog>>> {
    let storage = state.storage.as_ref();
    owned_blog(storage, id, &session).await?;

    let blog = storage.delete_blog(id).await?.ok_or_else(not_found)?;
    tracing::info!(blog_id = %blog.id, "blog deleted");
    Ok(session.reply(blog))
}

pub async fn toggle_like(
    State(state): State<Arc<AppState>>,
    session: Session,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<ApiResponse<LikeResponse>>> {
    if state.storage.find_blog(id).await?.is_none() {
        return Err(not_found());
    }
    let liked = state.storage.toggle_blog_like(session.user_id(), id).await?;
    Ok(session.reply(LikeResponse { liked }))
}

/// Comments on a blog, oldest first.
pub async fn comments(
    State(state): State<Arc<AppState>>,
    session: Session,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<ApiResponse<Vec<CommentDetails>>>> {
    if state.storage.find_blog(id).await?.is_none() {
        return Err(not_found());
    }
    let comments = state.storage.comments_for_blog(id).await?;
    Ok(session.reply(comments))
}

pub(crate) fn not_found() -> AppError {
    AppError::new(ErrorCode::BlogNotFound, "blog not found")
}
