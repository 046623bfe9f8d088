//! In-process storage used for local runs (`memory:` database url) and tests.
//! Mirrors the constraints of the SQL schema: unique emails and category
//! names, cascading deletes, and restricted category deletion.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use blogs_shared::types::PaginationParams;

use super::{Storage, StorageError, StorageResult};
use crate::models::{
    Blog, BlogChanges, BlogDetails, Category, Collection, Comment, CommentDetails, NewBlog,
    NewCategory, NewCollection, NewComment, NewRefreshToken, NewUser, RefreshToken, User,
    UserChanges, UserSummary,
};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    refresh_tokens: Vec<RefreshToken>,
    follows: Vec<(Uuid, Uuid)>,
    categories: Vec<Category>,
    blogs: Vec<Blog>,
    blog_likes: Vec<(Uuid, Uuid)>,
    comments: Vec<Comment>,
    comment_likes: Vec<(Uuid, Uuid)>,
    collections: Vec<Collection>,
    collection_blogs: Vec<(Uuid, Uuid)>,
}

impl Tables {
    fn user(&self, id: Uuid) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    fn details(&self, blog: &Blog) -> BlogDetails {
        let author_name = self
            .user(blog.author_id)
            .map(|u| u.username.clone())
            .unwrap_or_default();
        let category_name = self
            .categories
            .iter()
            .find(|c| c.id == blog.category_id)
            .map(|c| c.name.clone())
            .unwrap_or_default();
        let likes = self.blog_likes.iter().filter(|(_, b)| *b == blog.id).count() as i64;
        BlogDetails::from_parts(blog.clone(), author_name, category_name, likes)
    }

    /// Newest first, matching the SQL ordering.
    fn newest_details<F>(&self, filter: F, page: PaginationParams) -> Vec<BlogDetails>
    where
        F: Fn(&Blog) -> bool,
    {
        let matching = self
            .blogs
            .iter()
            .rev()
            .filter(|b| filter(b))
            .map(|b| self.details(b))
            .collect();
        page.apply(matching)
    }

    fn remove_blogs(&mut self, blog_ids: &[Uuid]) {
        let comment_ids: Vec<Uuid> = self
            .comments
            .iter()
            .filter(|c| blog_ids.contains(&c.blog_id))
            .map(|c| c.id)
            .collect();
        self.comment_likes.retain(|(_, c)| !comment_ids.contains(c));
        self.comments.retain(|c| !blog_ids.contains(&c.blog_id));
        self.blog_likes.retain(|(_, b)| !blog_ids.contains(b));
        self.collection_blogs.retain(|(_, b)| !blog_ids.contains(b));
        self.blogs.retain(|b| !blog_ids.contains(&b.id));
    }

    fn remove_comments(&mut self, comment_ids: &[Uuid]) {
        self.comment_likes.retain(|(_, c)| !comment_ids.contains(c));
        self.comments.retain(|c| !comment_ids.contains(&c.id));
    }

    fn remove_collections(&mut self, collection_ids: &[Uuid]) {
        self.collection_blogs.retain(|(c, _)| !collection_ids.contains(c));
        self.collections.retain(|c| !collection_ids.contains(&c.id));
    }
}

fn toggle(pairs: &mut Vec<(Uuid, Uuid)>, pair: (Uuid, Uuid)) -> bool {
    if let Some(pos) = pairs.iter().position(|p| *p == pair) {
        pairs.remove(pos);
        false
    } else {
        pairs.push(pair);
        true
    }
}

#[derive(Default)]
pub struct MemoryStorage {
    tables: RwLock<Tables>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the expiry of every refresh token of a user.
    pub async fn set_refresh_token_expiry(&self, user_id: Uuid, expires_at: DateTime<Utc>) {
        let mut tables = self.tables.write().await;
        for token in tables.refresh_tokens.iter_mut().filter(|t| t.user_id == user_id) {
            token.expires_at = expires_at;
        }
    }

    pub async fn refresh_token_count(&self, user_id: Uuid) -> usize {
        let tables = self.tables.read().await;
        tables.refresh_tokens.iter().filter(|t| t.user_id == user_id).count()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn create_user(&self, user: NewUser) -> StorageResult<User> {
        let mut tables = self.tables.write().await;
        if tables.users.iter().any(|u| u.email == user.email) {
            return Err(StorageError::Conflict("email already registered".into()));
        }
        let now = Utc::now();
        let created = User {
            id: user.id,
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            created_at: now,
            updated_at: now,
        };
        tables.users.push(created.clone());
        Ok(created)
    }

    async fn find_user_by_id(&self, id: Uuid) -> StorageResult<Option<User>> {
        Ok(self.tables.read().await.user(id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StorageResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.email == email).cloned())
    }

    async fn update_user(&self, id: Uuid, changes: UserChanges) -> StorageResult<Option<User>> {
        let mut tables = self.tables.write().await;
        if let Some(email) = &changes.email {
            if tables.users.iter().any(|u| u.id != id && &u.email == email) {
                return Err(StorageError::Conflict("email already registered".into()));
            }
        }
        let Some(user) = tables.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        if let Some(username) = changes.username {
            user.username = username;
        }
        if let Some(email) = changes.email {
            user.email = email;
        }
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn delete_user(&self, id: Uuid) -> StorageResult<Option<User>> {
        let mut tables = self.tables.write().await;
        let Some(pos) = tables.users.iter().position(|u| u.id == id) else {
            return Ok(None);
        };
        let user = tables.users.remove(pos);

        let blog_ids: Vec<Uuid> = tables
            .blogs
            .iter()
            .filter(|b| b.author_id == id)
            .map(|b| b.id)
            .collect();
        tables.remove_blogs(&blog_ids);

        let comment_ids: Vec<Uuid> = tables
            .comments
            .iter()
            .filter(|c| c.user_id == id)
            .map(|c| c.id)
            .collect();
        tables.remove_comments(&comment_ids);

        let collection_ids: Vec<Uuid> = tables
            .collections
            .iter()
            .filter(|c| c.user_id == id)
            .map(|c| c.id)
            .collect();
        tables.remove_collections(&collection_ids);

        tables.blog_likes.retain(|(u, _)| *u != id);
        tables.comment_likes.retain(|(u, _)| *u != id);
        tables.follows.retain(|(a, b)| *a != id && *b != id);
        tables.refresh_tokens.retain(|t| t.user_id != id);

        Ok(Some(user))
    }

    async fn search_users(
        &self,
        username: &str,
        page: PaginationParams,
    ) -> StorageResult<Vec<UserSummary>> {
        let needle = username.to_lowercase();
        let tables = self.tables.read().await;
        let mut found: Vec<UserSummary> = tables
            .users
            .iter()
            .filter(|u| u.username.to_lowercase().contains(&needle))
            .map(|u| UserSummary {
                id: u.id,
                username: u.username.clone(),
            })
            .collect();
        found.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(page.apply(found))
    }

    async fn toggle_follow(&self, follower_id: Uuid, following_id: Uuid) -> StorageResult<bool> {
        let mut tables = self.tables.write().await;
        if tables.user(follower_id).is_none() || tables.user(following_id).is_none() {
            return Err(StorageError::Conflict("follow references a missing user".into()));
        }
        Ok(toggle(&mut tables.follows, (follower_id, following_id)))
    }

    async fn insert_refresh_token(&self, token: NewRefreshToken) -> StorageResult<()> {
        let mut tables = self.tables.write().await;
        if tables.user(token.user_id).is_none() {
            return Err(StorageError::Conflict("refresh token references a missing user".into()));
        }
        tables.refresh_tokens.push(RefreshToken {
            id: token.id,
            user_id: token.user_id,
            token_hash: token.token_hash,
            expires_at: token.expires_at,
            created_at: Utc::now(),
        });
        Ok(())
    }

    async fn refresh_token_expiry(&self, user_id: Uuid) -> StorageResult<Option<DateTime<Utc>>> {
        let tables = self.tables.read().await;
        Ok(tables
            .refresh_tokens
            .iter()
            .filter(|t| t.user_id == user_id)
            .map(|t| t.expires_at)
            .max())
    }

    async fn revoke_refresh_tokens(&self, user_id: Uuid) -> StorageResult<usize> {
        let mut tables = self.tables.write().await;
        let before = tables.refresh_tokens.len();
        tables.refresh_tokens.retain(|t| t.user_id != user_id);
        Ok(before - tables.refresh_tokens.len())
    }

    async fn create_category(&self, category: NewCategory) -> StorageResult<Category> {
        let mut tables = self.tables.write().await;
        if tables.categories.iter().any(|c| c.name == category.name) {
            return Err(StorageError::Conflict("category already exists".into()));
        }
        let now = Utc::now();
        let created = Category {
            id: category.id,
            name: category.name,
            created_at: now,
            updated_at: now,
        };
        tables.categories.push(created.clone());
        Ok(created)
    }

    async fn find_category_by_id(&self, id: Uuid) -> StorageResult<Option<Category>> {
        let tables = self.tables.read().await;
        Ok(tables.categories.iter().find(|c| c.id == id).cloned())
    }

    async fn find_category_by_name(&self, name: &str) -> StorageResult<Option<Category>> {
        let tables = self.tables.read().await;
        Ok(tables.categories.iter().find(|c| c.name == name).cloned())
    }

    async fn rename_category(&self, id: Uuid, name: String) -> StorageResult<Option<Category>> {
        let mut tables = self.tables.write().await;
        if tables.categories.iter().any(|c| c.id != id && c.name == name) {
            return Err(StorageError::Conflict("category already exists".into()));
        }
        let Some(category) = tables.categories.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };
        category.name = name;
        category.updated_at = Utc::now();
        Ok(Some(category.clone()))
    }

    async fn delete_category(&self, id: Uuid) -> StorageResult<Option<Category>> {
        let mut tables = self.tables.write().await;
        let Some(pos) = tables.categories.iter().position(|c| c.id == id) else {
            return Ok(None);
        };
        if tables.blogs.iter().any(|b| b.category_id == id) {
            return Err(StorageError::Conflict("category is still used by blogs".into()));
        }
        Ok(Some(tables.categories.remove(pos)))
    }

    async fn list_categories(&self) -> StorageResult<Vec<Category>> {
        let tables = self.tables.read().await;
        let mut categories = tables.categories.clone();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn create_blog(&self, blog: NewBlog) -> StorageResult<Blog> {
        let mut tables = self.tables.write().await;
        if tables.user(blog.author_id).is_none()
            || !tables.categories.iter().any(|c| c.id == blog.category_id)
        {
            return Err(StorageError::Conflict("blog references a missing row".into()));
        }
        let now = Utc::now();
        let created = Blog {
            id: blog.id,
            title: blog.title,
            thumbnail_url: blog.thumbnail_url,
            content: blog.content,
            category_id: blog.category_id,
            author_id: blog.author_id,
            created_at: now,
            updated_at: now,
        };
        tables.blogs.push(created.clone());
        Ok(created)
    }

    async fn find_blog(&self, id: Uuid) -> StorageResult<Option<Blog>> {
        let tables = self.tables.read().await;
        Ok(tables.blogs.iter().find(|b| b.id == id).cloned())
    }

    async fn blog_details(&self, id: Uuid) -> StorageResult<Option<BlogDetails>> {
        let tables = self.tables.read().await;
        Ok(tables.blogs.iter().find(|b| b.id == id).map(|b| tables.details(b)))
    }

    async fn update_blog(&self, id: Uuid, changes: BlogChanges) -> StorageResult<Option<Blog>> {
        let mut tables = self.tables.write().await;
        if let Some(category_id) = changes.category_id {
            if !tables.categories.iter().any(|c| c.id == category_id) {
                return Err(StorageError::Conflict("blog references a missing category".into()));
            }
        }
        let Some(blog) = tables.blogs.iter_mut().find(|b| b.id == id) else {
            return Ok(None);
        };
        if let Some(title) = changes.title {
            blog.title = title;
        }
        if let Some(thumbnail_url) = changes.thumbnail_url {
            blog.thumbnail_url = thumbnail_url;
        }
        if let Some(content) = changes.content {
            blog.content = content;
        }
        if let Some(category_id) = changes.category_id {
            blog.category_id = category_id;
        }
        blog.updated_at = Utc::now();
        Ok(Some(blog.clone()))
    }

    async fn delete_blog(&self, id: Uuid) -> StorageResult<Option<Blog>> {
        let mut tables = self.tables.write().await;
        let Some(blog) = tables.blogs.iter().find(|b| b.id == id).cloned() else {
            return Ok(None);
        };
        tables.remove_blogs(&[id]);
        Ok(Some(blog))
    }

    async fn blogs_by_author(
        &self,
        author_id: Uuid,
        page: PaginationParams,
    ) -> StorageResult<Vec<BlogDetails>> {
        let tables = self.tables.read().await;
        Ok(tables.newest_details(|b| b.author_id == author_id, page))
    }

    async fn blogs_by_category(
        &self,
        category_id: Uuid,
        page: PaginationParams,
    ) -> StorageResult<Vec<BlogDetails>> {
        let tables = self.tables.read().await;
        Ok(tables.newest_details(|b| b.category_id == category_id, page))
    }

    async fn search_blogs(
        &self,
        title: &str,
        page: PaginationParams,
    ) -> StorageResult<Vec<BlogDetails>> {
        let needle = title.to_lowercase();
        let tables = self.tables.read().await;
        Ok(tables.newest_details(|b| b.title.to_lowercase().contains(&needle), page))
    }

    async fn feed(&self, user_id: Uuid, page: PaginationParams) -> StorageResult<Vec<BlogDetails>> {
        let tables = self.tables.read().await;
        let following: Vec<Uuid> = tables
            .follows
            .iter()
            .filter(|(follower, _)| *follower == user_id)
            .map(|(_, following)| *following)
            .collect();
        Ok(tables.newest_details(|b| following.contains(&b.author_id), page))
    }

    async fn toggle_blog_like(&self, user_id: Uuid, blog_id: Uuid) -> StorageResult<bool> {
        let mut tables = self.tables.write().await;
        if tables.user(user_id).is_none() || !tables.blogs.iter().any(|b| b.id == blog_id) {
            return Err(StorageError::Conflict("like references a missing row".into()));
        }
        Ok(toggle(&mut tables.blog_likes, (user_id, blog_id)))
    }

    async fn create_collection(&self, collection: NewCollection) -> StorageResult<Collection> {
        let mut tables = self.tables.write().await;
        if tables.user(collection.user_id).is_none() {
            return Err(StorageError::Conflict("collection references a missing user".into()));
        }
        let now = Utc::now();
        let created = Collection {
            id: collection.id,
            name: collection.name,
            user_id: collection.user_id,
            created_at: now,
            updated_at: now,
        };
        tables.collections.push(created.clone());
        Ok(created)
    }

    async fn find_collection(&self, id: Uuid) -> StorageResult<Option<Collection>> {
        let tables = self.tables.read().await;
        Ok(tables.collections.iter().find(|c| c.id == id).cloned())
    }

    async fn rename_collection(&self, id: Uuid, name: String) -> StorageResult<Option<Collection>> {
        let mut tables = self.tables.write().await;
        let Some(collection) = tables.collections.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };
        collection.name = name;
        collection.updated_at = Utc::now();
        Ok(Some(collection.clone()))
    }

    async fn delete_collection(&self, id: Uuid) -> StorageResult<Option<Collection>> {
        let mut tables = self.tables.write().await;
        let Some(collection) = tables.collections.iter().find(|c| c.id == id).cloned() else {
            return Ok(None);
        };
        tables.remove_collections(&[id]);
        Ok(Some(collection))
    }

    async fn collections_by_owner(&self, user_id: Uuid) -> StorageResult<Vec<Collection>> {
        let tables = self.tables.read().await;
        Ok(tables
            .collections
            .iter()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn add_blog_to_collection(&self, collection_id: Uuid, blog_id: Uuid) -> StorageResult<()> {
        let mut tables = self.tables.write().await;
        if !tables.collections.iter().any(|c| c.id == collection_id)
            || !tables.blogs.iter().any(|b| b.id == blog_id)
        {
            return Err(StorageError::Conflict("collection entry references a missing row".into()));
        }
        if tables.collection_blogs.contains(&(collection_id, blog_id)) {
            return Err(StorageError::Conflict("blog already in collection".into()));
        }
        tables.collection_blogs.push((collection_id, blog_id));
        Ok(())
    }

    async fn remove_blog_from_collection(
        &self,
        collection_id: Uuid,
        blog_id: Uuid,
    ) -> StorageResult<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.collection_blogs.len();
        tables
            .collection_blogs
            .retain(|entry| *entry != (collection_id, blog_id));
        Ok(tables.collection_blogs.len() < before)
    }

    async fn blogs_in_collection(&self, collection_id: Uuid) -> StorageResult<Vec<BlogDetails>> {
        let tables = self.tables.read().await;
        Ok(tables
            .collection_blogs
            .iter()
            .filter(|(c, _)| *c == collection_id)
            .filter_map(|(_, blog_id)| tables.blogs.iter().find(|b| b.id == *blog_id))
            .map(|b| tables.details(b))
            .collect())
    }

    async fn create_comment(&self, comment: NewComment) -> StorageResult<Comment> {
        let mut tables = self.tables.write().await;
        if tables.user(comment.user_id).is_none()
            || !tables.blogs.iter().any(|b| b.id == comment.blog_id)
        {
            return Err(StorageError::Conflict("comment references a missing row".into()));
        }
        let now = Utc::now();
        let created = Comment {
            id: comment.id,
            description: comment.description,
            blog_id: comment.blog_id,
            user_id: comment.user_id,
            created_at: now,
            updated_at: now,
        };
        tables.comments.push(created.clone());
        Ok(created)
    }

    async fn find_comment(&self, id: Uuid) -> StorageResult<Option<Comment>> {
        let tables = self.tables.read().await;
        Ok(tables.comments.iter().find(|c| c.id == id).cloned())
    }

    async fn update_comment(&self, id: Uuid, description: String) -> StorageResult<Option<Comment>> {
        let mut tables = self.tables.write().await;
        let Some(comment) = tables.comments.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };
        comment.description = description;
        comment.updated_at = Utc::now();
        Ok(Some(comment.clone()))
    }

    async fn delete_comment(&self, id: Uuid) -> StorageResult<Option<Comment>> {
        let mut tables = self.tables.write().await;
        let Some(comment) = tables.comments.iter().find(|c| c.id == id).cloned() else {
            return Ok(None);
        };
        tables.remove_comments(&[id]);
        Ok(Some(comment))
    }

    async fn comments_for_blog(&self, blog_id: Uuid) -> StorageResult<Vec<CommentDetails>> {
        let tables = self.tables.read().await;
        Ok(tables
            .comments
            .iter()
            .filter(|c| c.blog_id == blog_id)
            .map(|c| CommentDetails {
                comment: c.clone(),
                likes: tables.comment_likes.iter().filter(|(_, id)| *id == c.id).count() as i64,
            })
            .collect())
    }

    async fn toggle_comment_like(&self, user_id: Uuid, comment_id: Uuid) -> StorageResult<bool> {
        let mut tables = self.tables.write().await;
        if tables.user(user_id).is_none() || !tables.comments.iter().any(|c| c.id == comment_id) {
            return Err(StorageError::Conflict("like references a missing row".into()));
        }
        Ok(toggle(&mut tables.comment_likes, (user_id, comment_id)))
    }
}
