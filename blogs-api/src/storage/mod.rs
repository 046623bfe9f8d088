//! Storage abstraction over the relational schema.
//!
//! Absence is reported as `Ok(None)` / `Ok(false)`; `StorageError` is kept for
//! failures and constraint conflicts.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use blogs_shared::errors::{AppError, ErrorCode};
use blogs_shared::types::PaginationParams;

use crate::models::{
    Blog, BlogChanges, BlogDetails, Category, Collection, Comment, CommentDetails, NewBlog,
    NewCategory, NewCollection, NewComment, NewRefreshToken, NewUser, User, UserChanges,
    UserSummary,
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStorage;
pub use postgres::PgStorage;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Database(diesel::result::Error),

    #[error("connection pool error: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),

    #[error("storage call exceeded {0:?}")]
    Timeout(Duration),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl From<diesel::result::Error> for StorageError {
    fn from(err: diesel::result::Error) -> Self {
        use diesel::result::{DatabaseErrorKind, Error};
        match err {
            Error::DatabaseError(
                DatabaseErrorKind::UniqueViolation | DatabaseErrorKind::ForeignKeyViolation,
                info,
            ) => StorageError::Conflict(info.message().to_string()),
            other => StorageError::Database(other),
        }
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Conflict(message) => AppError::new(ErrorCode::Conflict, message),
            StorageError::Timeout(_) => AppError::new(ErrorCode::StorageTimeout, err.to_string()),
            other => AppError::internal(other.to_string()),
        }
    }
}

pub type StorageResult<T> = Result<T, StorageError>;

#[async_trait]
pub trait Storage: Send + Sync {
    // --- users ---

    async fn create_user(&self, user: NewUser) -> StorageResult<User>;

    async fn find_user_by_id(&self, id: Uuid) -> StorageResult<Option<User>>;

    /// Emails are stored lower-cased; callers pass the lower-cased form.
    async fn find_user_by_email(&self, email: &str) -> StorageResult<Option<User>>;

    async fn update_user(&self, id: Uuid, changes: UserChanges) -> StorageResult<Option<User>>;

    /// Deletes the user and everything they own.
    async fn delete_user(&self, id: Uuid) -> StorageResult<Option<User>>;

    async fn search_users(
        &self,
        username: &str,
        page: PaginationParams,
    ) -> StorageResult<Vec<UserSummary>>;

    /// Follows when not following, unfollows otherwise. Returns whether the
    /// follower follows the target afterwards.
    async fn toggle_follow(&self, follower_id: Uuid, following_id: Uuid) -> StorageResult<bool>;

    // --- refresh tokens ---

    async fn insert_refresh_token(&self, token: NewRefreshToken) -> StorageResult<()>;

    /// Latest expiry among the user's refresh tokens.
    async fn refresh_token_expiry(&self, user_id: Uuid) -> StorageResult<Option<DateTime<Utc>>>;

    /// Deletes every refresh token of the user, returning how many were removed.
    async fn revoke_refresh_tokens(&self, user_id: Uuid) -> StorageResult<usize>;

    // --- categories ---

    async fn create_category(&self, category: NewCategory) -> StorageResult<Category>;

    async fn find_category_by_id(&self, id: Uuid) -> StorageResult<Option<Category>>;

    async fn find_category_by_name(&self, name: &str) -> StorageResult<Option<Category>>;

    async fn rename_category(&self, id: Uuid, name: String) -> StorageResult<Option<Category>>;

    /// Fails with `Conflict` while blogs still reference the category.
    async fn delete_category(&self, id: Uuid) -> StorageResult<Option<Category>>;

    async fn list_categories(&self) -> StorageResult<Vec<Category>>;

    // --- blogs ---

    async fn create_blog(&self, blog: NewBlog) -> StorageResult<Blog>;

    async fn find_blog(&self, id: Uuid) -> StorageResult<Option<Blog>>;

    async fn blog_details(&self, id: Uuid) -> StorageResult<Option<BlogDetails>>;

    async fn update_blog(&self, id: Uuid, changes: BlogChanges) -> StorageResult<Option<Blog>>;

    async fn delete_blog(&self, id: Uuid) -> StorageResult<Option<Blog>>;

    async fn blogs_by_author(
        &self,
        author_id: Uuid,
        page: PaginationParams,
    ) -> StorageResult<Vec<BlogDetails>>;

    async fn blogs_by_category(
        &self,
        category_id: Uuid,
        page: PaginationParams,
    ) -> StorageResult<Vec<BlogDetails>>;

    async fn search_blogs(
        &self,
        title: &str,
        page: PaginationParams,
    ) -> StorageResult<Vec<BlogDetails>>;

    /// Blogs written by the authors the user follows, newest first.
    async fn feed(&self, user_id: Uuid, page: PaginationParams) -> StorageResult<Vec<BlogDetails>>;

    /// Returns whether the blog is liked by the user afterwards.
    async fn toggle_blog_like(&self, user_id: Uuid, blog_id: Uuid) -> StorageResult<bool>;

    // --- collections ---

    async fn create_collection(&self, collection: NewCollection) -> StorageResult<Collection>;

    async fn find_collection(&self, id: Uuid) -> StorageResult<Option<Collection>>;

    async fn rename_collection(&self, id: Uuid, name: String) -> StorageResult<Option<Collection>>;

    async fn delete_collection(&self, id: Uuid) -> StorageResult<Option<Collection>>;

    async fn collections_by_owner(&self, user_id: Uuid) -> StorageResult<Vec<Collection>>;

    /// Fails with `Conflict` when the blog is already in the collection.
    async fn add_blog_to_collection(&self, collection_id: Uuid, blog_id: Uuid) -> StorageResult<()>;

    /// Returns whether a row was removed.
    async fn remove_blog_from_collection(
        &self,
        collection_id: Uuid,
        blog_id: Uuid,
    ) -> StorageResult<bool>;

    async fn blogs_in_collection(&self, collection_id: Uuid) -> StorageResult<Vec<BlogDetails>>;

    // --- comments ---

    async fn create_comment(&self, comment: NewComment) -> StorageResult<Comment>;

    async fn find_comment(&self, id: Uuid) -> StorageResult<Option<Comment>>;

    async fn update_comment(&self, id: Uuid, description: String) -> StorageResult<Option<Comment>>;

    async fn delete_comment(&self, id: Uuid) -> StorageResult<Option<Comment>>;

    /// Oldest first.
    async fn comments_for_blog(&self, blog_id: Uuid) -> StorageResult<Vec<CommentDetails>>;

    /// Returns whether the comment is liked by the user afterwards.
    async fn toggle_comment_like(&self, user_id: Uuid, comment_id: Uuid) -> StorageResult<bool>;
}

/// Escapes LIKE metacharacters and wraps the term for a substring match.
pub(crate) fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}
