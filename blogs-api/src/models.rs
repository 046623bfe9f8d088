use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::{blogs, categories, collections, comments, refresh_tokens, users};

// --- Users ---

#[derive(Debug, Clone, Queryable, Identifiable, Serialize)]
#[diesel(table_name = users)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Clone, Default, AsChangeset, Deserialize)]
#[diesel(table_name = users)]
pub struct UserChanges {
    pub username: Option<String>,
    pub email: Option<String>,
}

impl UserChanges {
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.email.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Queryable, Serialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
}

// --- Refresh tokens ---

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = refresh_tokens)]
pub struct RefreshToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = refresh_tokens)]
pub struct NewRefreshToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
}

// --- Categories ---

#[derive(Debug, Clone, Queryable, Identifiable, Serialize)]
#[diesel(table_name = categories)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = categories)]
pub struct NewCategory {
    pub id: Uuid,
    pub name: String,
}

// --- Blogs ---

#[derive(Debug, Clone, Queryable, Identifiable, Serialize)]
#[diesel(table_name = blogs)]
pub struct Blog {
    pub id: Uuid,
    pub title: String,
    pub thumbnail_url: String,
    pub content: String,
    pub category_id: Uuid,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = blogs)]
pub struct NewBlog {
    pub id: Uuid,
    pub title: String,
    pub thumbnail_url: String,
    pub content: String,
    pub category_id: Uuid,
    pub author_id: Uuid,
}

#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = blogs)]
pub struct BlogChanges {
    pub title: Option<String>,
    pub thumbnail_url: Option<String>,
    pub content: Option<String>,
    pub category_id: Option<Uuid>,
}

/// A blog together with the names and counters shown to readers.
#[derive(Debug, Clone, Serialize)]
pub struct BlogDetails {
    pub id: Uuid,
    pub title: String,
    pub thumbnail_url: String,
    pub content: String,
    pub category_id: Uuid,
    pub category_name: String,
    pub author_id: Uuid,
    pub author_name: String,
    pub likes: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BlogDetails {
    pub fn from_parts(blog: Blog, author_name: String, category_name: String, likes: i64) -> Self {
        Self {
            id: blog.id,
            title: blog.title,
            thumbnail_url: blog.thumbnail_url,
            content: blog.content,
            category_id: blog.category_id,
            category_name,
            author_id: blog.author_id,
            author_name,
            likes,
            created_at: blog.created_at,
            updated_at: blog.updated_at,
        }
    }
}

// --- Comments ---

#[derive(Debug, Clone, Queryable, Identifiable, Serialize)]
#[diesel(table_name = comments)]
pub struct Comment {
    pub id: Uuid,
    pub description: String,
    pub blog_id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = comments)]
pub struct NewComment {
    pub id: Uuid,
    pub description: String,
    pub blog_id: Uuid,
    pub user_id: Uuid,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentDetails {
    #[serde(flatten)]
    pub comment: Comment,
    pub likes: i64,
}

// --- Collections ---

#[derive(Debug, Clone, Queryable, Identifiable, Serialize)]
#[diesel(table_name = collections)]
pub struct Collection {
    pub id: Uuid,
    pub name: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = collections)]
pub struct NewCollection {
    pub id: Uuid,
    pub name: String,
    pub user_id: Uuid,
}
