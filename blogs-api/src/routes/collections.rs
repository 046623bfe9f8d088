use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use blogs_shared::errors::{AppError, AppResult, ErrorCode};
use blogs_shared::types::ApiResponse;
use blogs_shared::{ApiJson, ApiPath};

use super::blogs::not_found as blog_not_found;
use super::{ensure_owner, on_conflict};
use crate::gate::Session;
use crate::models::{BlogDetails, Collection, NewCollection};
use crate::storage::Storage;
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CollectionRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct AddBlogRequest {
    pub blog_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct CollectionEntry {
    pub collection_id: Uuid,
    pub blog_id: Uuid,
}

async fn owned_collection(
    storage: &dyn Storage,
    id: Uuid,
    session: &Session,
) -> AppResult<Collection> {
    let collection = storage.find_collection(id).await?.ok_or_else(not_found)?;
    ensure_owner(collection.user_id, session, "collection")?;
    Ok(collection)
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    session: Session,
    ApiJson(req): ApiJson<CollectionRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Collection>>)> {
    req.validate()?;
    let collection = state
        .storage
        .create_collection(NewCollection {
            id: Uuid::now_v7(),
            name: req.name.trim().to_string(),
            user_id: session.user_id(),
        })
        .await?;

    Ok((StatusCode::CREATED, session.reply(collection)))
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> AppResult<Json<ApiResponse<Vec<Collection>>>> {
    let collections = state.storage.collections_by_owner(session.user_id()).await?;
    Ok(session.reply(collections))
}

pub async fn rename(
    State(state): State<Arc<AppState>>,
    session: Session,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<CollectionRequest>,
) -> AppResult<Json<ApiResponse<Collection>>> {
    req.validate()?;
    let storage = state.storage.as_ref();
    owned_collection(storage, id, &session).await?;

    let collection = storage
        .rename_collection(id, req.name.trim().to_string())
        .await?
        .ok_or_else(not_found)?;
    Ok(session.reply(collection))
}

pub async fn remove(
    State(state): State<Arc<AppState>>,
    session: Session,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<ApiResponse<Collection>>> {
    let storage = state.storage.as_ref();
    owned_collection(storage, id, &session).await?;

    let collection = storage.delete_collection(id).await?.ok_or_else(not_found)?;
    Ok(session.reply(collection))
}

pub async fn blogs(
    State(state): State<Arc<AppState>>,
    session: Session,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<ApiResponse<Vec<BlogDetails>>>> {
    let storage = state.storage.as_ref();
    owned_collection(storage, id, &session).await?;

    let entries = storage.blogs_in_collection(id).await?;
    Ok(session.reply(entries))
}

pub async fn add_blog(
    State(state): State<Arc<AppState>>,
    session: Session,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<AddBlogRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<CollectionEntry>>)> {
    let storage = state.storage.as_ref();
    owned_collection(storage, id, &session).await?;

    if storage.find_blog(req.blog_id).await?.is_none() {
        return Err(blog_not_found());
    }

    storage
        .add_blog_to_collection(id, req.blog_id)
        .await
        .map_err(on_conflict(
            ErrorCode::BlogAlreadyInCollection,
            "blog is already in this collection",
        ))?;

    Ok((
        StatusCode::CREATED,
        session.reply(CollectionEntry {
            collection_id: id,
            blog_id: req.blog_id,
        }),
    ))
}

pub async fn remove_blog(
    State(state): State<Arc<AppState>>,
    session: Session,
    ApiPath((id, blog_id)): ApiPath<(Uuid, Uuid)>,
) -> AppResult<Json<ApiResponse<CollectionEntry>>> {
    let storage = state.storage.as_ref();
    owned_collection(storage, id, &session).await?;

    if !storage.remove_blog_from_collection(id, blog_id).await? {
        return Err(AppError::new(
            ErrorCode::BlogNotInCollection,
            "blog is not in this collection",
        ));
    }

    Ok(session.reply(CollectionEntry {
        collection_id: id,
        blog_id,
    }))
}

fn not_found() -> AppError {
    AppError::new(ErrorCode::CollectionNotFound, "collection not found")
}
