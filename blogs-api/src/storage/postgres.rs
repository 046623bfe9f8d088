use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::dsl::{count_star, max};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use uuid::Uuid;

use blogs_shared::clients::db::DbPool;
use blogs_shared::types::PaginationParams;

use super::{like_pattern, Storage, StorageError, StorageResult};
use crate::models::{
    Blog, BlogChanges, BlogDetails, Category, Collection, Comment, CommentDetails, NewBlog,
    NewCategory, NewCollection, NewComment, NewRefreshToken, NewUser, User, UserChanges,
    UserSummary,
};
use crate::schema::{
    blog_likes, blogs, categories, collection_blogs, collections, comment_likes, comments,
    follows, refresh_tokens, users,
};

/// Diesel-backed storage. Each call runs on the blocking pool and is bounded
/// by `timeout`.
#[derive(Clone)]
pub struct PgStorage {
    pool: DbPool,
    timeout: Duration,
}

impl PgStorage {
    pub fn new(pool: DbPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    async fn run<T, F>(&self, f: F) -> StorageResult<T>
    where
        F: FnOnce(&mut PgConnection) -> StorageResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        let task = tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            f(&mut conn)
        });

        match tokio::time::timeout(self.timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => Err(StorageError::Unavailable(join_err.to_string())),
            Err(_) => {
                tracing::warn!(timeout_ms = self.timeout.as_millis() as u64, "storage call timed out");
                Err(StorageError::Timeout(self.timeout))
            }
        }
    }
}

/// Attaches author names, category names and like counts to a page of blogs,
/// keeping the input order.
fn hydrate(conn: &mut PgConnection, rows: Vec<Blog>) -> QueryResult<Vec<BlogDetails>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    let blog_ids: Vec<Uuid> = rows.iter().map(|b| b.id).collect();
    let author_ids: Vec<Uuid> = rows.iter().map(|b| b.author_id).collect();
    let category_ids: Vec<Uuid> = rows.iter().map(|b| b.category_id).collect();

    let authors: HashMap<Uuid, String> = users::table
        .filter(users::id.eq_any(author_ids))
        .select((users::id, users::username))
        .load::<(Uuid, String)>(conn)?
        .into_iter()
        .collect();

    let category_names: HashMap<Uuid, String> = categories::table
        .filter(categories::id.eq_any(category_ids))
        .select((categories::id, categories::name))
        .load::<(Uuid, String)>(conn)?
        .into_iter()
        .collect();

    let likes: HashMap<Uuid, i64> = blog_likes::table
        .filter(blog_likes::blog_id.eq_any(blog_ids))
        .group_by(blog_likes::blog_id)
        .select((blog_likes::blog_id, count_star()))
        .load::<(Uuid, i64)>(conn)?
        .into_iter()
        .collect();

    Ok(rows
        .into_iter()
        .map(|blog| {
            let author_name = authors.get(&blog.author_id).cloned().unwrap_or_default();
            let category_name = category_names.get(&blog.category_id).cloned().unwrap_or_default();
            let like_count = likes.get(&blog.id).copied().unwrap_or(0);
            BlogDetails::from_parts(blog, author_name, category_name, like_count)
        })
        .collect())
}

#[async_trait]
impl Storage for PgStorage {
    async fn create_user(&self, user: NewUser) -> StorageResult<User> {
        self.run(move |conn| {
            Ok(diesel::insert_into(users::table)
                .values(&user)
                .get_result::<User>(conn)?)
        })
        .await
    }

    async fn find_user_by_id(&self, id: Uuid) -> StorageResult<Option<User>> {
        self.run(move |conn| Ok(users::table.find(id).first::<User>(conn).optional()?))
            .await
    }

    async fn find_user_by_email(&self, email: &str) -> StorageResult<Option<User>> {
        let email = email.to_owned();
        self.run(move |conn| {
            Ok(users::table
                .filter(users::email.eq(email))
                .first::<User>(conn)
                .optional()?)
        })
        .await
    }

    async fn update_user(&self, id: Uuid, changes: UserChanges) -> StorageResult<Option<User>> {
        self.run(move |conn| {
            Ok(diesel::update(users::table.find(id))
                .set((&changes, users::updated_at.eq(Utc::now())))
                .get_result::<User>(conn)
                .optional()?)
        })
        .await
    }

    async fn delete_user(&self, id: Uuid) -> StorageResult<Option<User>> {
        self.run(move |conn| {
            Ok(diesel::delete(users::table.find(id))
                .get_result::<User>(conn)
                .optional()?)
        })
        .await
    }

    async fn search_users(
        &self,
        username: &str,
        page: PaginationParams,
    ) -> StorageResult<Vec<UserSummary>> {
        let pattern = like_pattern(username);
        self.run(move |conn| {
            Ok(users::table
                .filter(users::username.ilike(pattern))
                .select((users::id, users::username))
                .order((users::username.asc(), users::id.asc()))
                .offset(page.offset())
                .limit(page.limit())
                .load::<UserSummary>(conn)?)
        })
        .await
    }

    async fn toggle_follow(&self, follower_id: Uuid, following_id: Uuid) -> StorageResult<bool> {
        self.run(move |conn| {
            conn.transaction::<_, StorageError, _>(|conn| {
                let removed =
                    diesel::delete(follows::table.find((follower_id, following_id))).execute(conn)?;
                if removed > 0 {
                    return Ok(false);
                }
                diesel::insert_into(follows::table)
                    .values((
                        follows::follower_id.eq(follower_id),
                        follows::following_id.eq(following_id),
                    ))
                    .on_conflict_do_nothing()
                    .execute(conn)?;
                Ok(true)
            })
        })
        .await
    }

    async fn insert_refresh_token(&self, token: NewRefreshToken) -> StorageResult<()> {
        self.run(move |conn| {
            diesel::insert_into(refresh_tokens::table)
                .values(&token)
                .execute(conn)?;
            Ok(())
        })
        .await
    }

    async fn refresh_token_expiry(&self, user_id: Uuid) -> StorageResult<Option<DateTime<Utc>>> {
        self.run(move |conn| {
            Ok(refresh_tokens::table
                .filter(refresh_tokens::user_id.eq(user_id))
                .select(max(refresh_tokens::expires_at))
                .get_result::<Option<DateTime<Utc>>>(conn)?)
        })
        .await
    }

    async fn revoke_refresh_tokens(&self, user_id: Uuid) -> StorageResult<usize> {
        self.run(move |conn| {
            Ok(
                diesel::delete(refresh_tokens::table.filter(refresh_tokens::user_id.eq(user_id)))
                    .execute(conn)?,
            )
        })
        .await
    }

    async fn create_category(&self, category: NewCategory) -> StorageResult<Category> {
        self.run(move |conn| {
            Ok(diesel::insert_into(categories::table)
                .values(&category)
                .get_result::<Category>(conn)?)
        })
        .await
    }

    async fn find_category_by_id(&self, id: Uuid) -> StorageResult<Option<Category>> {
        self.run(move |conn| {
            Ok(categories::table
                .find(id)
                .first::<Category>(conn)
                .optional()?)
        })
        .await
    }

    async fn find_category_by_name(&self, name: &str) -> StorageResult<Option<Category>> {
        let name = name.to_owned();
        self.run(move |conn| {
            Ok(categories::table
                .filter(categories::name.eq(name))
                .first::<Category>(conn)
                .optional()?)
        })
        .await
    }

    async fn rename_category(&self, id: Uuid, name: String) -> StorageResult<Option<Category>> {
        self.run(move |conn| {
            Ok(diesel::update(categories::table.find(id))
                .set((categories::name.eq(name), categories::updated_at.eq(Utc::now())))
                .get_result::<Category>(conn)
                .optional()?)
        })
        .await
    }

    async fn delete_category(&self, id: Uuid) -> StorageResult<Option<Category>> {
        // blogs.category_id is ON DELETE RESTRICT, surfacing as a conflict.
        self.run(move |conn| {
            Ok(diesel::delete(categories::table.find(id))
                .get_result::<Category>(conn)
                .optional()?)
        })
        .await
    }

    async fn list_categories(&self) -> StorageResult<Vec<Category>> {
        self.run(|conn| {
            Ok(categories::table
                .order(categories::name.asc())
                .load::<Category>(conn)?)
        })
        .await
    }

    async fn create_blog(&self, blog: NewBlog) -> StorageResult<Blog> {
        self.run(move |conn| {
            Ok(diesel::insert_into(blogs::table)
                .values(&blog)
                .get_result::<Blog>(conn)?)
        })
        .await
    }

    async fn find_blog(&self, id: Uuid) -> StorageResult<Option<Blog>> {
        self.run(move |conn| Ok(blogs::table.find(id).first::<Blog>(conn).optional()?))
            .await
    }

    async fn blog_details(&self, id: Uuid) -> StorageResult<Option<BlogDetails>> {
        self.run(move |conn| {
            let Some(blog) = blogs::table.find(id).first::<Blog>(conn).optional()? else {
                return Ok(None);
            };
            Ok(hydrate(conn, vec![blog])?.pop())
        })
        .await
    }

    async fn update_blog(&self, id: Uuid, changes: BlogChanges) -> StorageResult<Option<Blog>> {
        self.run(move |conn| {
            Ok(diesel::update(blogs::table.find(id))
                .set((&changes, blogs::updated_at.eq(Utc::now())))
                .get_result::<Blog>(conn)
                .optional()?)
        })
        .await
    }

    async fn delete_blog(&self, id: Uuid) -> StorageResult<Option<Blog>> {
        self.run(move |conn| {
            Ok(diesel::delete(blogs::table.find(id))
                .get_result::<Blog>(conn)
                .optional()?)
        })
        .await
    }

    async fn blogs_by_author(
        &self,
        author_id: Uuid,
        page: PaginationParams,
    ) -> StorageResult<Vec<BlogDetails>> {
        self.run(move |conn| {
            let rows = blogs::table
                .filter(blogs::author_id.eq(author_id))
                .order((blogs::created_at.desc(), blogs::id.desc()))
                .offset(page.offset())
                .limit(page.limit())
                .load::<Blog>(conn)?;
            Ok(hydrate(conn, rows)?)
        })
        .await
    }

    async fn blogs_by_category(
        &self,
        category_id: Uuid,
        page: PaginationParams,
    ) -> StorageResult<Vec<BlogDetails>> {
        self.run(move |conn| {
            let rows = blogs::table
                .filter(blogs::category_id.eq(category_id))
                .order((blogs::created_at.desc(), blogs::id.desc()))
                .offset(page.offset())
                .limit(page.limit())
                .load::<Blog>(conn)?;
            Ok(hydrate(conn, rows)?)
        })
        .await
    }

    async fn search_blogs(
        &self,
        title: &str,
        page: PaginationParams,
    ) -> StorageResult<Vec<BlogDetails>> {
        let pattern = like_pattern(title);
        self.run(move |conn| {
            let rows = blogs::table
                .filter(blogs::title.ilike(pattern))
                .order((blogs::created_at.desc(), blogs::id.desc()))
                .offset(page.offset())
                .limit(page.limit())
                .load::<Blog>(conn)?;
            Ok(hydrate(conn, rows)?)
        })
        .await
    }

    async fn feed(&self, user_id: Uuid, page: PaginationParams) -> StorageResult<Vec<BlogDetails>> {
        self.run(move |conn| {
            let followed = follows::table
                .filter(follows::follower_id.eq(user_id))
                .select(follows::following_id);
            let rows = blogs::table
                .filter(blogs::author_id.eq_any(followed))
                .order((blogs::created_at.desc(), blogs::id.desc()))
                .offset(page.offset())
                .limit(page.limit())
                .load::<Blog>(conn)?;
            Ok(hydrate(conn, rows)?)
        })
        .await
    }

    async fn toggle_blog_like(&self, user_id: Uuid, blog_id: Uuid) -> StorageResult<bool> {
        self.run(move |conn| {
            conn.transaction::<_, StorageError, _>(|conn| {
                let removed =
                    diesel::delete(blog_likes::table.find((user_id, blog_id))).execute(conn)?;
                if removed > 0 {
                    return Ok(false);
                }
                diesel::insert_into(blog_likes::table)
                    .values((blog_likes::user_id.eq(user_id), blog_likes::blog_id.eq(blog_id)))
                    .on_conflict_do_nothing()
                    .execute(conn)?;
                Ok(true)
            })
        })
        .await
    }

    async fn create_collection(&self, collection: NewCollection) -> StorageResult<Collection> {
        self.run(move |conn| {
            Ok(diesel::insert_into(collections::table)
                .values(&collection)
                .get_result::<Collection>(conn)?)
        })
        .await
    }

    async fn find_collection(&self, id: Uuid) -> StorageResult<Option<Collection>> {
        self.run(move |conn| {
            Ok(collections::table
                .find(id)
                .first::<Collection>(conn)
                .optional()?)
        })
        .await
    }

    async fn rename_collection(&self, id: Uuid, name: String) -> StorageResult<Option<Collection>> {
        self.run(move |conn| {
            Ok(diesel::update(collections::table.find(id))
                .set((collections::name.eq(name), collections::updated_at.eq(Utc::now())))
                .get_result::<Collection>(conn)
                .optional()?)
        })
        .await
    }

    async fn delete_collection(&self, id: Uuid) -> StorageResult<Option<Collection>> {
        self.run(move |conn| {
            Ok(diesel::delete(collections::table.find(id))
                .get_result::<Collection>(conn)
                .optional()?)
        })
        .await
    }

    async fn collections_by_owner(&self, user_id: Uuid) -> StorageResult<Vec<Collection>> {
        self.run(move |conn| {
            Ok(collections::table
                .filter(collections::user_id.eq(user_id))
                .order((collections::created_at.asc(), collections::id.asc()))
                .load::<Collection>(conn)?)
        })
        .await
    }

    async fn add_blog_to_collection(&self, collection_id: Uuid, blog_id: Uuid) -> StorageResult<()> {
        self.run(move |conn| {
            diesel::insert_into(collection_blogs::table)
                .values((
                    collection_blogs::collection_id.eq(collection_id),
                    collection_blogs::blog_id.eq(blog_id),
                ))
                .execute(conn)?;
            Ok(())
        })
        .await
    }

    async fn remove_blog_from_collection(
        &self,
        collection_id: Uuid,
        blog_id: Uuid,
    ) -> StorageResult<bool> {
        self.run(move |conn| {
            let removed = diesel::delete(collection_blogs::table.find((collection_id, blog_id)))
                .execute(conn)?;
            Ok(removed > 0)
        })
        .await
    }

    async fn blogs_in_collection(&self, collection_id: Uuid) -> StorageResult<Vec<BlogDetails>> {
        self.run(move |conn| {
            let rows = collection_blogs::table
                .inner_join(blogs::table.on(blogs::id.eq(collection_blogs::blog_id)))
                .filter(collection_blogs::collection_id.eq(collection_id))
                .order(collection_blogs::created_at.asc())
                .select(blogs::all_columns)
                .load::<Blog>(conn)?;
            Ok(hydrate(conn, rows)?)
        })
        .await
    }

    async fn create_comment(&self, comment: NewComment) -> StorageResult<Comment> {
        self.run(move |conn| {
            Ok(diesel::insert_into(comments::table)
                .values(&comment)
                .get_result::<Comment>(conn)?)
        })
        .await
    }

    async fn find_comment(&self, id: Uuid) -> StorageResult<Option<Comment>> {
        self.run(move |conn| {
            Ok(comments::table
                .find(id)
                .first::<Comment>(conn)
                .optional()?)
        })
        .await
    }

    async fn update_comment(&self, id: Uuid, description: String) -> StorageResult<Option<Comment>> {
        self.run(move |conn| {
            Ok(diesel::update(comments::table.find(id))
                .set((
                    comments::description.eq(description),
                    comments::updated_at.eq(Utc::now()),
                ))
                .get_result::<Comment>(conn)
                .optional()?)
        })
        .await
    }

    async fn delete_comment(&self, id: Uuid) -> StorageResult<Option<Comment>> {
        self.run(move |conn| {
            Ok(diesel::delete(comments::table.find(id))
                .get_result::<Comment>(conn)
                .optional()?)
        })
        .await
    }

    async fn comments_for_blog(&self, blog_id: Uuid) -> StorageResult<Vec<CommentDetails>> {
        self.run(move |conn| {
            let rows = comments::table
                .filter(comments::blog_id.eq(blog_id))
                .order((comments::created_at.asc(), comments::id.asc()))
                .load::<Comment>(conn)?;
            let ids: Vec<Uuid> = rows.iter().map(|c| c.id).collect();
            let likes: HashMap<Uuid, i64> = comment_likes::table
                .filter(comment_likes::comment_id.eq_any(ids))
                .group_by(comment_likes::comment_id)
                .select((comment_likes::comment_id, count_star()))
                .load::<(Uuid, i64)>(conn)?
                .into_iter()
                .collect();
            Ok(rows
                .into_iter()
                .map(|comment| {
                    let likes = likes.get(&comment.id).copied().unwrap_or(0);
                    CommentDetails { comment, likes }
                })
                .collect())
        })
        .await
    }

    async fn toggle_comment_like(&self, user_id: Uuid, comment_id: Uuid) -> StorageResult<bool> {
        self.run(move |conn| {
            conn.transaction::<_, StorageError, _>(|conn| {
                let removed = diesel::delete(comment_likes::table.find((user_id, comment_id)))
                    .execute(conn)?;
                if removed > 0 {
                    return Ok(false);
                }
                diesel::insert_into(comment_likes::table)
                    .values((
                        comment_likes::user_id.eq(user_id),
                        comment_likes::comment_id.eq(comment_id),
                    ))
                    .on_conflict_do_nothing()
                    .execute(conn)?;
                Ok(true)
            })
        })
        .await
    }
}
