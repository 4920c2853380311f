use std::collections::HashMap;

use axum::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::repo_types::{NewPost, Post};

/// Every operation is scoped to the author; other users' posts are invisible.
#[async_trait]
pub trait PostStore: Send + Sync {
    async fn list_by_author(&self, author_id: Uuid, limit: i64, offset: i64)
        -> anyhow::Result<Vec<Post>>;
    async fn get(&self, author_id: Uuid, id: Uuid) -> anyhow::Result<Option<Post>>;
    async fn create(&self, author_id: Uuid, post: NewPost) -> anyhow::Result<Post>;
    /// Overwrites the editable fields of an existing post.
    async fn update(&self, author_id: Uuid, id: Uuid, post: NewPost) -> anyhow::Result<Option<Post>>;
    async fn delete(&self, author_id: Uuid, id: Uuid) -> anyhow::Result<bool>;
}

const POST_COLUMNS: &str =
    "id, author_id, title, excerpt, category, content, published, created_at, updated_at";

#[derive(Clone)]
pub struct PgPostStore {
    db: PgPool,
}

impl PgPostStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PostStore for PgPostStore {
    async fn list_by_author(
        &self,
        author_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<Post>> {
        let rows = sqlx::query_as::<_, Post>(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE author_id = $1 \
             ORDER BY created_at DESC LIMIT $2 OFFSET $3"
        ))
        .bind(author_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn get(&self, author_id: Uuid, id: Uuid) -> anyhow::Result<Option<Post>> {
        let row = sqlx::query_as::<_, Post>(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE id = $1 AND author_id = $2"
        ))
        .bind(id)
        .bind(author_id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn create(&self, author_id: Uuid, post: NewPost) -> anyhow::Result<Post> {
        let row = sqlx::query_as::<_, Post>(&format!(
            "INSERT INTO posts (author_id, title, excerpt, category, content, published) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {POST_COLUMNS}"
        ))
        .bind(author_id)
        .bind(post.title)
        .bind(post.excerpt)
        .bind(post.category)
        .bind(post.content)
        .bind(post.published)
        .fetch_one(&self.db)
        .await?;
        Ok(row)
    }

    async fn update(&self, author_id: Uuid, id: Uuid, post: NewPost) -> anyhow::Result<Option<Post>> {
        let row = sqlx::query_as::<_, Post>(&format!(
            "UPDATE posts SET title = $3, excerpt = $4, category = $5, content = $6, \
             published = $7, updated_at = now() \
             WHERE id = $1 AND author_id = $2 RETURNING {POST_COLUMNS}"
        ))
        .bind(id)
        .bind(author_id)
        .bind(post.title)
        .bind(post.excerpt)
        .bind(post.category)
        .bind(post.content)
        .bind(post.published)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn delete(&self, author_id: Uuid, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM posts WHERE id = $1 AND author_id = $2")
            .bind(id)
            .bind(author_id)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}

#[derive(Default)]
pub struct MemoryPostStore {
    posts: RwLock<HashMap<Uuid, Post>>,
}

#[async_trait]
impl PostStore for MemoryPostStore {
    async fn list_by_author(
        &self,
        author_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<Post>> {
        let posts = self.posts.read().await;
        let mut mine: Vec<Post> = posts
            .values()
            .filter(|p| p.author_id == author_id)
            .cloned()
            .collect();
        mine.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(mine
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn get(&self, author_id: Uuid, id: Uuid) -> anyhow::Result<Option<Post>> {
        let posts = self.posts.read().await;
        Ok(posts.get(&id).filter(|p| p.author_id == author_id).cloned())
    }

    async fn create(&self, author_id: Uuid, post: NewPost) -> anyhow::Result<Post> {
        let now = OffsetDateTime::now_utc();
        let row = Post {
            id: Uuid::new_v4(),
            author_id,
            title: post.title,
            excerpt: post.excerpt,
            category: post.category,
            content: post.content,
            published: post.published,
            created_at: now,
            updated_at: now,
        };
        self.posts.write().await.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update(&self, author_id: Uuid, id: Uuid, post: NewPost) -> anyhow::Result<Option<Post>> {
        let mut posts = self.posts.write().await;
        let Some(row) = posts.get_mut(&id).filter(|p| p.author_id == author_id) else {
            return Ok(None);
        };
        row.title = post.title;
        row.excerpt = post.excerpt;
        row.category = post.category;
        row.content = post.content;
        row.published = post.published;
        row.updated_at = OffsetDateTime::now_utc();
        Ok(Some(row.clone()))
    }

    async fn delete(&self, author_id: Uuid, id: Uuid) -> anyhow::Result<bool> {
        let mut posts = self.posts.write().await;
        if posts.get(&id).is_some_and(|p| p.author_id == author_id) {
            posts.remove(&id);
            return Ok(true);
        }
        Ok(false)
    }
}
