use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use blogs_shared::errors::{AppError, AppResult};
use blogs_shared::types::{ApiResponse, PaginationParams};
use blogs_shared::ApiQuery;

use crate::models::{BlogDetails, UserSummary};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct UserSearch {
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub struct BlogSearch {
    pub title: String,
}

fn search_term(raw: &str) -> AppResult<&str> {
    let term = raw.trim();
    if term.is_empty() {
        return Err(AppError::bad_request("search term must not be empty"));
    }
    Ok(term)
}

pub async fn users(
    State(state): State<Arc<AppState>>,
    ApiQuery(search): ApiQuery<UserSearch>,
    ApiQuery(page): ApiQuery<PaginationParams>,
) -> AppResult<Json<ApiResponse<Vec<UserSummary>>>> {
    let found = state
        .storage
        .search_users(search_term(&search.username)?, page)
        .await?;
    Ok(Json(ApiResponse::ok(found)))
}

pub async fn blogs(
    State(state): State<Arc<AppState>>,
    ApiQuery(search): ApiQuery<BlogSearch>,
    ApiQuery(page): ApiQuery<PaginationParams>,
) -> AppResult<Json<ApiResponse<Vec<BlogDetails>>>> {
    let found = state
        .storage
        .search_blogs(search_term(&search.title)?, page)
        .await?;
    Ok(Json(ApiResponse::ok(found)))
}
