//! Post repository
//!
//! Database operations for posts:
//! - `PostRepository` trait defining the interface for post data access
//! - `SqlxPostRepository` implementing the trait over SQLite
//!
//! List and count share one filter-to-SQL translation so the reported
//! total always matches the filtered set regardless of the pagination
//! window.

use crate::db::DbPool;
use crate::models::{Post, PostFilter, PostStatus};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;
use std::sync::Arc;

/// Post repository trait
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Create a new post
    async fn create(&self, post: &Post) -> Result<Post>;

    /// Get post by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Post>>;

    /// Get post by slug
    async fn get_by_slug(&self, slug: &str) -> Result<Option<Post>>;

    /// Update a post
    async fn update(&self, post: &Post) -> Result<Post>;

    /// Delete a post
    async fn delete(&self, id: i64) -> Result<()>;

    /// Check if a slug is taken
    async fn exists_by_slug(&self, slug: &str) -> Result<bool>;

    /// Check if a slug is taken by any post other than `exclude_id`
    async fn exists_by_slug_excluding(&self, slug: &str, exclude_id: i64) -> Result<bool>;

    /// List posts matching the filter, newest first
    async fn list(&self, filter: &PostFilter, offset: i64, limit: i64) -> Result<Vec<Post>>;

    /// Count posts matching the same filter as `list`
    async fn count(&self, filter: &PostFilter) -> Result<i64>;

    /// Increment the view counter of a post
    async fn increment_view_count(&self, id: i64) -> Result<()>;
}

/// SQLx-based post repository implementation
pub struct SqlxPostRepository {
    pool: DbPool,
}

impl SqlxPostRepository {
    /// Create a new SQLx post repository
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DbPool) -> Arc<dyn PostRepository> {
        Arc::new(Self::new(pool))
    }
}

const SELECT_COLUMNS: &str = "p.id, p.slug, p.title, p.content, p.excerpt, p.status, \
     p.is_featured, p.view_count, p.author_id, p.published_at, p.created_at, p.updated_at";

#[async_trait]
impl PostRepository for SqlxPostRepository {
    async fn create(&self, post: &Post) -> Result<Post> {
        let now = Utc::now();
        let status_str = post.status.to_string();

        let result = sqlx::query(
            r#"
            INSERT INTO posts
                (slug, title, content, excerpt, status, is_featured, view_count,
                 author_id, published_at, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&post.slug)
        .bind(&post.title)
        .bind(&post.content)
        .bind(&post.excerpt)
        .bind(&status_str)
        .bind(post.is_featured)
        .bind(post.view_count)
        .bind(post.author_id)
        .bind(post.published_at)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let mut created = post.clone();
        created.id = result.last_insert_rowid();
        created.created_at = now;
        created.updated_at = now;
        Ok(created)
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Post>> {
        let sql = format!("SELECT {} FROM posts p WHERE p.id = ?", SELECT_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get post by ID")?;

        match row {
            Some(row) => Ok(Some(row_to_post(&row)?)),
            None => Ok(None),
        }
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Post>> {
        let sql = format!("SELECT {} FROM posts p WHERE p.slug = ?", SELECT_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get post by slug")?;

        match row {
            Some(row) => Ok(Some(row_to_post(&row)?)),
            None => Ok(None),
        }
    }

    async fn update(&self, post: &Post) -> Result<Post> {
        let now = Utc::now();
        let status_str = post.status.to_string();

        sqlx::query(
            r#"
            UPDATE posts
            SET slug = ?, title = ?, content = ?, excerpt = ?, status = ?,
                is_featured = ?, published_at = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&post.slug)
        .bind(&post.title)
        .bind(&post.content)
        .bind(&post.excerpt)
        .bind(&status_str)
        .bind(post.is_featured)
        .bind(post.published_at)
        .bind(now)
        .bind(post.id)
        .execute(&self.pool)
        .await?;

        self.get_by_id(post.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Post not found after update"))
    }

    async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete post")?;
        Ok(())
    }

    async fn exists_by_slug(&self, slug: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts WHERE slug = ?")
            .bind(slug)
            .fetch_one(&self.pool)
            .await
            .context("Failed to check slug existence")?;
        Ok(count > 0)
    }

    async fn exists_by_slug_excluding(&self, slug: &str, exclude_id: i64) -> Result<bool> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM posts WHERE slug = ? AND id != ?")
                .bind(slug)
                .bind(exclude_id)
                .fetch_one(&self.pool)
                .await
                .context("Failed to check slug existence")?;
        Ok(count > 0)
    }

    async fn list(&self, filter: &PostFilter, offset: i64, limit: i64) -> Result<Vec<Post>> {
        let (joins, conditions) = filter_clauses(filter);

        let mut sql = format!("SELECT DISTINCT {} FROM posts p{}", SELECT_COLUMNS, joins);
        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }
        sql.push_str(" ORDER BY p.created_at DESC LIMIT ? OFFSET ?");

        let query = bind_filter(sqlx::query(&sql), filter).bind(limit).bind(offset);
        let rows = query
            .fetch_all(&self.pool)
            .await
            .context("Failed to list posts")?;

        let mut posts = Vec::new();
        for row in rows {
            posts.push(row_to_post(&row)?);
        }
        Ok(posts)
    }

    async fn count(&self, filter: &PostFilter) -> Result<i64> {
        let (joins, conditions) = filter_clauses(filter);

        let mut sql = format!("SELECT COUNT(DISTINCT p.id) as count FROM posts p{}", joins);
        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }

        let row = bind_filter(sqlx::query(&sql), filter)
            .fetch_one(&self.pool)
            .await
            .context("Failed to count posts")?;

        Ok(row.get("count"))
    }

    async fn increment_view_count(&self, id: i64) -> Result<()> {
        sqlx::query("UPDATE posts SET view_count = view_count + 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to increment view count")?;
        Ok(())
    }
}

/// Translate a filter into JOIN and WHERE fragments.
///
/// The bind order produced by `bind_filter` must match the condition
/// order emitted here.
fn filter_clauses(filter: &PostFilter) -> (String, Vec<&'static str>) {
    let mut joins = String::new();
    let mut conditions = Vec::new();

    if filter.status.is_some() {
        conditions.push("p.status = ?");
    }
    if filter.author_id.is_some() {
        conditions.push("p.author_id = ?");
    }
    if filter.tag_slug.is_some() {
        joins.push_str(" JOIN post_tags pt ON pt.post_id = p.id JOIN tags t ON t.id = pt.tag_id");
        conditions.push("t.slug = ?");
    }
    if filter.search.is_some() {
        conditions.push(
            "(LOWER(p.title) LIKE ? OR LOWER(p.content) LIKE ? OR LOWER(COALESCE(p.excerpt, '')) LIKE ?)",
        );
    }
    if filter.is_featured.is_some() {
        conditions.push("p.is_featured = ?");
    }

    (joins, conditions)
}

fn bind_filter<'q>(
    mut query: sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
    filter: &'q PostFilter,
) -> sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
    if let Some(status) = filter.status {
        query = query.bind(status.as_str());
    }
    if let Some(author_id) = filter.author_id {
        query = query.bind(author_id);
    }
    if let Some(ref tag_slug) = filter.tag_slug {
        query = query.bind(tag_slug.as_str());
    }
    if let Some(ref search) = filter.search {
        let pattern = format!("%{}%", search.to_lowercase());
        query = query.bind(pattern.clone()).bind(pattern.clone()).bind(pattern);
    }
    if let Some(is_featured) = filter.is_featured {
        query = query.bind(is_featured);
    }
    query
}

fn row_to_post(row: &sqlx::sqlite::SqliteRow) -> Result<Post> {
    let status_str: String = row.get("status");
    let status = PostStatus::from_str(&status_str)
        .ok_or_else(|| anyhow::anyhow!("Invalid post status in database: {}", status_str))?;

    let published_at: Option<DateTime<Utc>> = row.get("published_at");

    Ok(Post {
        id: row.get("id"),
        slug: row.get("slug"),
        title: row.get("title"),
        content: row.get("content"),
        excerpt: row.get("excerpt"),
        status,
        is_featured: row.get("is_featured"),
        view_count: row.get("view_count"),
        author_id: row.get("author_id"),
        published_at,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxUserRepository, UserRepository};
    use crate::db::{create_test_pool, migrations};
    use crate::models::User;

    async fn setup() -> (DbPool, SqlxPostRepository, i64) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let users = SqlxUserRepository::new(pool.clone());
        let user = users
            .create(&User::new("author@example.com".to_string(), "hash".to_string()))
            .await
            .expect("Failed to create user");

        (pool.clone(), SqlxPostRepository::new(pool), user.id)
    }

    fn test_post(slug: &str, title: &str, status: PostStatus, author_id: i64) -> Post {
        Post::new(
            slug.to_string(),
            title.to_string(),
            "Body".to_string(),
            None,
            status,
            false,
            author_id,
        )
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let (_pool, repo, author_id) = setup().await;

        let created = repo
            .create(&test_post("hello-world", "Hello World", PostStatus::Draft, author_id))
            .await
            .expect("Failed to create post");
        assert!(created.id > 0);

        let by_id = repo
            .get_by_id(created.id)
            .await
            .expect("Failed to get post")
            .expect("Post not found");
        assert_eq!(by_id.title, "Hello World");

        let by_slug = repo
            .get_by_slug("hello-world")
            .await
            .expect("Failed to get post")
            .expect("Post not found");
        assert_eq!(by_slug.id, created.id);
    }

    #[tokio::test]
    async fn test_exists_by_slug() {
        let (_pool, repo, author_id) = setup().await;

        let created = repo
            .create(&test_post("taken", "Taken", PostStatus::Draft, author_id))
            .await
            .expect("Failed to create post");

        assert!(repo.exists_by_slug("taken").await.unwrap());
        assert!(!repo.exists_by_slug("free").await.unwrap());
        assert!(!repo
            .exists_by_slug_excluding("taken", created.id)
            .await
            .unwrap());
        assert!(repo.exists_by_slug_excluding("taken", created.id + 1).await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_slug_rejected() {
        let (_pool, repo, author_id) = setup().await;

        repo.create(&test_post("dup", "A", PostStatus::Draft, author_id))
            .await
            .expect("First insert should succeed");
        let result = repo
            .create(&test_post("dup", "B", PostStatus::Draft, author_id))
            .await;

        assert!(result.is_err(), "Duplicate slug should be rejected");
    }

    #[tokio::test]
    async fn test_delete() {
        let (_pool, repo, author_id) = setup().await;

        let created = repo
            .create(&test_post("gone", "Gone", PostStatus::Draft, author_id))
            .await
            .expect("Failed to create post");

        repo.delete(created.id).await.expect("Failed to delete post");
        assert!(repo.get_by_id(created.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_increment_view_count() {
        let (_pool, repo, author_id) = setup().await;

        let created = repo
            .create(&test_post("viewed", "Viewed", PostStatus::Published, author_id))
            .await
            .expect("Failed to create post");

        repo.increment_view_count(created.id).await.unwrap();
        repo.increment_view_count(created.id).await.unwrap();

        let found = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(found.view_count, 2);
    }

    #[tokio::test]
    async fn test_list_filter_by_status() {
        let (_pool, repo, author_id) = setup().await;

        repo.create(&test_post("d1", "Draft One", PostStatus::Draft, author_id))
            .await
            .unwrap();
        repo.create(&test_post("p1", "Pub One", PostStatus::Published, author_id))
            .await
            .unwrap();
        repo.create(&test_post("p2", "Pub Two", PostStatus::Published, author_id))
            .await
            .unwrap();

        let filter = PostFilter {
            status: Some(PostStatus::Published),
            ..Default::default()
        };

        let posts = repo.list(&filter, 0, 10).await.expect("Failed to list");
        assert_eq!(posts.len(), 2);
        assert!(posts.iter().all(|p| p.status == PostStatus::Published));

        // Count matches the filter independent of pagination
        assert_eq!(repo.count(&filter).await.unwrap(), 2);
        let page = repo.list(&filter, 0, 1).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(repo.count(&filter).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_list_filter_by_search() {
        let (_pool, repo, author_id) = setup().await;

        let mut post = test_post("rust-intro", "Getting Started With Rust", PostStatus::Published, author_id);
        post.excerpt = Some("A beginner guide".to_string());
        repo.create(&post).await.unwrap();
        repo.create(&test_post("other", "Cooking", PostStatus::Published, author_id))
            .await
            .unwrap();

        // Case-insensitive title match
        let filter = PostFilter {
            search: Some("RUST".to_string()),
            ..Default::default()
        };
        let posts = repo.list(&filter, 0, 10).await.unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].slug, "rust-intro");

        // Excerpt match
        let filter = PostFilter {
            search: Some("beginner".to_string()),
            ..Default::default()
        };
        assert_eq!(repo.count(&filter).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_list_filter_by_tag() {
        let (pool, repo, author_id) = setup().await;

        let tagged = repo
            .create(&test_post("tagged", "Tagged", PostStatus::Published, author_id))
            .await
            .unwrap();
        repo.create(&test_post("untagged", "Untagged", PostStatus::Published, author_id))
            .await
            .unwrap();

        sqlx::query("INSERT INTO tags (name, slug) VALUES ('rust', 'rust')")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO post_tags (post_id, tag_id) VALUES (?, 1)")
            .bind(tagged.id)
            .execute(&pool)
            .await
            .unwrap();

        let filter = PostFilter {
            tag_slug: Some("rust".to_string()),
            ..Default::default()
        };
        let posts = repo.list(&filter, 0, 10).await.unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].id, tagged.id);
        assert_eq!(repo.count(&filter).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_list_combined_filters() {
        let (_pool, repo, author_id) = setup().await;

        let mut featured = test_post("f1", "Featured", PostStatus::Published, author_id);
        featured.is_featured = true;
        repo.create(&featured).await.unwrap();
        repo.create(&test_post("f2", "Plain", PostStatus::Published, author_id))
            .await
            .unwrap();

        let filter = PostFilter {
            status: Some(PostStatus::Published),
            author_id: Some(author_id),
            is_featured: Some(true),
            ..Default::default()
        };
        let posts = repo.list(&filter, 0, 10).await.unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].slug, "f1");
    }
}
