use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use blogs_shared::errors::{AppError, AppResult, ErrorCode};
use blogs_shared::types::{ApiResponse, PaginationParams};
use blogs_shared::{ApiJson, ApiPath, ApiQuery};

use super::on_conflict;
use crate::gate::Session;
use crate::models::{BlogDetails, Category, NewCategory};
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CategoryRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
}

impl CategoryRequest {
    /// Category names are stored upper-case.
    fn normalized_name(&self) -> AppResult<String> {
        let name = self.name.trim().to_uppercase();
        if name.is_empty() {
            return Err(AppError::bad_request("category name must not be blank"));
        }
        Ok(name)
    }
}

pub async fn list(State(state): State<Arc<AppState>>) -> AppResult<Json<ApiResponse<Vec<Category>>>> {
    let categories = state.storage.list_categories().await?;
    Ok(Json(ApiResponse::ok(categories)))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    session: Session,
    ApiJson(req): ApiJson<CategoryRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Category>>)> {
    req.validate()?;
    let name = req.normalized_name()?;

    if state.storage.find_category_by_name(&name).await?.is_some() {
        return Err(already_exists());
    }

    let category = state
        .storage
        .create_category(NewCategory {
            id: Uuid::now_v7(),
            name,
        })
        .await
        .map_err(on_conflict(ErrorCode::CategoryAlreadyExists, "category already exists"))?;

    tracing::info!(category_id = %category.id, name = %category.name, "category created");

    Ok((StatusCode::CREATED, session.reply(category)))
}

pub async fn rename(
    State(state): State<Arc<AppState>>,
    session: Session,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<CategoryRequest>,
) -> AppResult<Json<ApiResponse<Category>>> {
    req.validate()?;
    let name = req.normalized_name()?;

    if let Some(existing) = state.storage.find_category_by_name(&name).await? {
        if existing.id != id {
            return Err(already_exists());
        }
    }

    let category = state
        .storage
        .rename_category(id, name)
        .await
        .map_err(on_conflict(ErrorCode::CategoryAlreadyExists, "category already exists"))?
        .ok_or_else(not_found)?;

    Ok(session.reply(category))
}

pub async fn remove(
    State(state): State<Arc<AppState>>,
    session: Session,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<ApiResponse<Category>>> {
    let category = state
        .storage
        .delete_category(id)
        .await
        .map_err(on_conflict(ErrorCode::CategoryInUse, "category is still used by blogs"))?
        .ok_or_else(not_found)?;

    tracing::info!(category_id = %category.id, "category deleted");

    Ok(session.reply(category))
}

pub async fn blogs(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<Uuid>,
    ApiQuery(page): ApiQuery<PaginationParams>,
) -> AppResult<Json<ApiResponse<Vec<BlogDetails>>>> {
    if state.storage.find_category_by_id(id).await?.is_none() {
        return Err(not_found());
    }
    let blogs = state.storage.blogs_by_category(id, page).await?;
    Ok(Json(ApiResponse::ok(blogs)))
}

fn not_found() -> AppError {
    AppError::new(ErrorCode::CategoryNotFound, "category not found")
}

fn already_exists() -> AppError {
    AppError::new(ErrorCode::CategoryAlreadyExists, "category already exists")
}
