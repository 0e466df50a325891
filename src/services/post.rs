//! Post service
//!
//! Implements business logic for posts, tags and comments:
//! - post CRUD with ownership checks
//! - slug derivation and uniqueness (sequential probe with numeric
//!   suffixes; a uniqueness violation on write is retried with the next
//!   suffix, the database constraint being the backstop for concurrent
//!   creations)
//! - publication timestamps (set exactly once, on the first transition
//!   into published)
//! - implicit tag creation by normalized name
//! - best-effort view counting

use crate::db::repositories::{CommentRepository, PostRepository, TagRepository};
use crate::models::{
    Comment, CreateCommentInput, CreatePostInput, CreateTagInput, ListParams, PagedResult, Post,
    PostFilter, PostStatus, Tag, UpdatePostInput, User,
};
use crate::services::slug::{generate_slug, slug_candidate};
use anyhow::Context;
use chrono::Utc;
use std::sync::Arc;

/// Attempts at inserting before a slug race is treated as fatal
const SLUG_INSERT_ATTEMPTS: usize = 5;

/// Maximum accepted comment length
const MAX_COMMENT_LEN: usize = 1000;

/// Error types for post service operations
#[derive(Debug, thiserror::Error)]
pub enum PostServiceError {
    /// Post not found
    #[error("Post not found")]
    NotFound,

    /// Caller lacks permission for the operation
    #[error("Not enough permissions")]
    Forbidden,

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Tag with this name already exists
    #[error("Tag already exists: {0}")]
    DuplicateTag(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Post service for posts, tags and comments
pub struct PostService {
    post_repo: Arc<dyn PostRepository>,
    tag_repo: Arc<dyn TagRepository>,
    comment_repo: Arc<dyn CommentRepository>,
}

impl PostService {
    /// Create a new post service with the given repositories
    pub fn new(
        post_repo: Arc<dyn PostRepository>,
        tag_repo: Arc<dyn TagRepository>,
        comment_repo: Arc<dyn CommentRepository>,
    ) -> Self {
        Self {
            post_repo,
            tag_repo,
            comment_repo,
        }
    }

    /// Create a new post authored by `author`.
    ///
    /// The slug is derived from the title; collisions get `-1`, `-2`, …
    /// suffixes. Referenced tags are created when missing.
    pub async fn create(
        &self,
        input: CreatePostInput,
        author: &User,
    ) -> Result<Post, PostServiceError> {
        let title = input.title.trim();
        if title.is_empty() {
            return Err(PostServiceError::ValidationError(
                "Title cannot be empty".to_string(),
            ));
        }
        if input.content.is_empty() {
            return Err(PostServiceError::ValidationError(
                "Content cannot be empty".to_string(),
            ));
        }

        let base = generate_slug(title);
        let mut post = Post::new(
            String::new(),
            title.to_string(),
            input.content.clone(),
            input.excerpt.clone(),
            input.status,
            input.is_featured,
            author.id,
        );

        let created = 'insert: {
            for _ in 0..SLUG_INSERT_ATTEMPTS {
                post.slug = self.next_free_slug(&base, None).await?;
                match self.post_repo.create(&post).await {
                    Ok(created) => break 'insert created,
                    // Lost the check-then-insert race; probe again
                    Err(e) if is_unique_violation(&e) => continue,
                    Err(e) => return Err(e.context("Failed to create post").into()),
                }
            }
            return Err(anyhow::anyhow!("Could not allocate a unique slug for '{}'", base).into());
        };

        if let Some(ref names) = input.tag_names {
            self.attach_tags(created.id, names).await?;
        }

        Ok(created)
    }

    /// Get a post by numeric id or slug.
    pub async fn get(&self, ident: &str) -> Result<Post, PostServiceError> {
        let post = if let Ok(id) = ident.parse::<i64>() {
            self.post_repo
                .get_by_id(id)
                .await
                .context("Failed to get post")?
        } else {
            self.post_repo
                .get_by_slug(ident)
                .await
                .context("Failed to get post")?
        };

        post.ok_or(PostServiceError::NotFound)
    }

    /// Get a post by numeric id only.
    pub async fn get_by_id(&self, id: i64) -> Result<Post, PostServiceError> {
        self.post_repo
            .get_by_id(id)
            .await
            .context("Failed to get post")?
            .ok_or(PostServiceError::NotFound)
    }

    /// Record a view of a post, off the request path.
    ///
    /// The increment must never block or fail the read, so it is spawned
    /// and a failure only leaves a warning in the log.
    pub fn record_view(&self, post_id: i64) {
        let repo = self.post_repo.clone();
        tokio::spawn(async move {
            if let Err(e) = repo.increment_view_count(post_id).await {
                tracing::warn!("Failed to increment view count for post {}: {}", post_id, e);
            }
        });
    }

    /// List posts matching the filter, newest first.
    ///
    /// The total comes from a separate count query over the same filter.
    pub async fn list(
        &self,
        filter: &PostFilter,
        params: &ListParams,
    ) -> Result<PagedResult<Post>, PostServiceError> {
        let posts = self
            .post_repo
            .list(filter, params.offset(), params.limit())
            .await
            .context("Failed to list posts")?;
        let total = self
            .post_repo
            .count(filter)
            .await
            .context("Failed to count posts")?;

        Ok(PagedResult::new(posts, total, params))
    }

    /// Update a post. Owner or superuser only.
    ///
    /// A title change re-derives the slug (excluding the post itself from
    /// the collision probe). The first transition into published stamps
    /// `published_at`; later status changes never clear it.
    pub async fn update(
        &self,
        id: i64,
        input: UpdatePostInput,
        current: &User,
    ) -> Result<Post, PostServiceError> {
        let mut post = self.get_by_id(id).await?;

        if !current.can_modify(post.author_id) {
            return Err(PostServiceError::Forbidden);
        }

        let mut slug_base: Option<String> = None;
        if let Some(ref new_title) = input.title {
            let new_title = new_title.trim();
            if new_title.is_empty() {
                return Err(PostServiceError::ValidationError(
                    "Title cannot be empty".to_string(),
                ));
            }
            let base = generate_slug(new_title);
            if base != post.slug {
                slug_base = Some(base);
            }
        }

        if let Some(new_status) = input.status {
            if new_status == PostStatus::Published && post.published_at.is_none() {
                post.published_at = Some(Utc::now());
            }
            post.status = new_status;
        }

        input.apply(&mut post);

        let updated = 'persist: {
            for _ in 0..SLUG_INSERT_ATTEMPTS {
                if let Some(ref base) = slug_base {
                    post.slug = self.next_free_slug(base, Some(id)).await?;
                }
                match self.post_repo.update(&post).await {
                    Ok(updated) => break 'persist updated,
                    Err(e) if slug_base.is_some() && is_unique_violation(&e) => continue,
                    Err(e) => return Err(e.context("Failed to update post").into()),
                }
            }
            return Err(anyhow::anyhow!("Could not allocate a unique slug for post {}", id).into());
        };

        if let Some(ref names) = input.tag_names {
            self.tag_repo
                .clear_post_tags(id)
                .await
                .context("Failed to clear post tags")?;
            self.attach_tags(id, names).await?;
        }

        Ok(updated)
    }

    /// Delete a post. Owner or superuser only.
    pub async fn delete(&self, id: i64, current: &User) -> Result<(), PostServiceError> {
        let post = self.get_by_id(id).await?;

        if !current.can_modify(post.author_id) {
            return Err(PostServiceError::Forbidden);
        }

        self.post_repo
            .delete(id)
            .await
            .context("Failed to delete post")?;
        Ok(())
    }

    /// Get the tags attached to a post.
    pub async fn tags_of(&self, post_id: i64) -> Result<Vec<Tag>, PostServiceError> {
        self.tag_repo
            .list_by_post(post_id)
            .await
            .context("Failed to list post tags")
            .map_err(Into::into)
    }

    /// Create a tag explicitly.
    ///
    /// # Errors
    ///
    /// - `ValidationError` if the name is empty
    /// - `DuplicateTag` if a tag with the normalized name exists
    pub async fn create_tag(&self, input: CreateTagInput) -> Result<Tag, PostServiceError> {
        let name = normalize_tag_name(&input.name);
        if name.is_empty() {
            return Err(PostServiceError::ValidationError(
                "Tag name cannot be empty".to_string(),
            ));
        }

        if self
            .tag_repo
            .get_by_name(&name)
            .await
            .context("Failed to check existing tag")?
            .is_some()
        {
            return Err(PostServiceError::DuplicateTag(name));
        }

        self.insert_tag(&name, input.description.clone()).await
    }

    /// List tags with pagination, ordered by name.
    pub async fn list_tags(&self, params: &ListParams) -> Result<PagedResult<Tag>, PostServiceError> {
        let tags = self
            .tag_repo
            .list(params.offset(), params.limit())
            .await
            .context("Failed to list tags")?;
        let total = self.tag_repo.count().await.context("Failed to count tags")?;

        Ok(PagedResult::new(tags, total, params))
    }

    /// Add a comment to a post.
    pub async fn add_comment(
        &self,
        post_id: i64,
        input: CreateCommentInput,
        author: &User,
    ) -> Result<Comment, PostServiceError> {
        let content = input.content.trim();
        if content.is_empty() {
            return Err(PostServiceError::ValidationError(
                "Comment cannot be empty".to_string(),
            ));
        }
        if content.len() > MAX_COMMENT_LEN {
            return Err(PostServiceError::ValidationError(format!(
                "Comment must be at most {} characters",
                MAX_COMMENT_LEN
            )));
        }

        // The post must exist
        self.get_by_id(post_id).await?;

        self.comment_repo
            .create(&Comment::new(post_id, author.id, content.to_string()))
            .await
            .context("Failed to create comment")
            .map_err(Into::into)
    }

    /// List the approved comments of a post, oldest first.
    pub async fn list_comments(&self, post_id: i64) -> Result<Vec<Comment>, PostServiceError> {
        self.get_by_id(post_id).await?;

        self.comment_repo
            .list_by_post(post_id)
            .await
            .context("Failed to list comments")
            .map_err(Into::into)
    }

    /// Probe for the first free slug candidate: the base itself, then
    /// `base-1`, `base-2`, … The record being updated, if any, is
    /// excluded from the collision check.
    async fn next_free_slug(
        &self,
        base: &str,
        exclude_id: Option<i64>,
    ) -> Result<String, PostServiceError> {
        let mut counter = 0;
        loop {
            let candidate = slug_candidate(base, counter);
            let taken = match exclude_id {
                Some(id) => self
                    .post_repo
                    .exists_by_slug_excluding(&candidate, id)
                    .await,
                None => self.post_repo.exists_by_slug(&candidate).await,
            }
            .context("Failed to check slug uniqueness")?;

            if !taken {
                return Ok(candidate);
            }
            counter += 1;
        }
    }

    /// Resolve tag names to records, creating missing tags, and attach
    /// them to the post. Blank names are skipped.
    async fn attach_tags(&self, post_id: i64, names: &[String]) -> Result<(), PostServiceError> {
        for raw in names {
            let name = normalize_tag_name(raw);
            if name.is_empty() {
                continue;
            }

            let tag = match self
                .tag_repo
                .get_by_name(&name)
                .await
                .context("Failed to look up tag")?
            {
                Some(existing) => existing,
                None => self.insert_tag(&name, None).await?,
            };

            self.tag_repo
                .add_to_post(tag.id, post_id)
                .await
                .context("Failed to attach tag")?;
        }
        Ok(())
    }

    /// Insert a tag with a unique slug, retrying suffixes on write races.
    async fn insert_tag(
        &self,
        name: &str,
        description: Option<String>,
    ) -> Result<Tag, PostServiceError> {
        let base = generate_slug(name);

        for _ in 0..SLUG_INSERT_ATTEMPTS {
            let mut counter = 0;
            let slug = loop {
                let candidate = slug_candidate(&base, counter);
                if !self
                    .tag_repo
                    .exists_by_slug(&candidate)
                    .await
                    .context("Failed to check tag slug uniqueness")?
                {
                    break candidate;
                }
                counter += 1;
            };

            match self
                .tag_repo
                .create(&Tag::new(name.to_string(), slug, description.clone()))
                .await
            {
                Ok(created) => return Ok(created),
                Err(e) if is_unique_violation(&e) => {
                    // Either the slug raced or the name itself; reuse the
                    // tag when a concurrent request created it
                    if let Some(existing) = self
                        .tag_repo
                        .get_by_name(name)
                        .await
                        .context("Failed to re-check tag")?
                    {
                        return Ok(existing);
                    }
                }
                Err(e) => return Err(e.context("Failed to create tag").into()),
            }
        }

        Err(anyhow::anyhow!("Could not allocate a unique slug for tag '{}'", name).into())
    }
}

/// Tags match case-insensitively on their normalized (trimmed,
/// lowercased) name.
fn normalize_tag_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Check whether any cause in the chain is a database uniqueness
/// violation.
fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        matches!(
            cause.downcast_ref::<sqlx::Error>(),
            Some(sqlx::Error::Database(db)) if db.is_unique_violation()
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{
        SqlxCommentRepository, SqlxPostRepository, SqlxTagRepository, SqlxUserRepository,
        UserRepository,
    };
    use crate::db::{create_test_pool, migrations};

    async fn setup() -> (PostService, User, User, User) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let users = SqlxUserRepository::new(pool.clone());
        let author = users
            .create(&User::new("author@example.com".to_string(), "hash".to_string()))
            .await
            .expect("Failed to create author");
        let stranger = users
            .create(&User::new("stranger@example.com".to_string(), "hash".to_string()))
            .await
            .expect("Failed to create stranger");
        let mut admin = User::new("admin@example.com".to_string(), "hash".to_string());
        admin.is_superuser = true;
        let admin = users.create(&admin).await.expect("Failed to create admin");

        let service = PostService::new(
            SqlxPostRepository::boxed(pool.clone()),
            SqlxTagRepository::boxed(pool.clone()),
            SqlxCommentRepository::boxed(pool),
        );

        (service, author, stranger, admin)
    }

    fn post_input(title: &str) -> CreatePostInput {
        CreatePostInput {
            title: title.to_string(),
            content: "Body".to_string(),
            excerpt: None,
            status: PostStatus::Draft,
            is_featured: false,
            tag_names: None,
        }
    }

    #[tokio::test]
    async fn test_create_derives_slug() {
        let (service, author, _, _) = setup().await;

        let post = service
            .create(post_input("Hello, World!"), &author)
            .await
            .expect("Create should succeed");

        assert_eq!(post.slug, "hello-world");
        assert_eq!(post.author_id, author.id);
        assert!(post.published_at.is_none());
    }

    #[tokio::test]
    async fn test_identical_titles_get_suffixed_slugs() {
        let (service, author, _, _) = setup().await;

        let first = service.create(post_input("Same Title"), &author).await.unwrap();
        let second = service.create(post_input("Same Title"), &author).await.unwrap();
        let third = service.create(post_input("Same Title"), &author).await.unwrap();

        assert_eq!(first.slug, "same-title");
        assert_eq!(second.slug, "same-title-1");
        assert_eq!(third.slug, "same-title-2");
    }

    #[tokio::test]
    async fn test_create_published_stamps_published_at() {
        let (service, author, _, _) = setup().await;

        let mut input = post_input("Live");
        input.status = PostStatus::Published;

        let post = service.create(input, &author).await.unwrap();
        assert!(post.published_at.is_some());
    }

    #[tokio::test]
    async fn test_create_with_tags() {
        let (service, author, _, _) = setup().await;

        let mut input = post_input("Tagged");
        input.tag_names = Some(vec![
            "Rust".to_string(),
            "  rust  ".to_string(), // same tag after normalization
            "Web Dev".to_string(),
            "".to_string(),
        ]);

        let post = service.create(input, &author).await.unwrap();
        let tags = service.tags_of(post.id).await.unwrap();

        let names: Vec<&str> = tags.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["rust", "web dev"]);
        let slugs: Vec<&str> = tags.iter().map(|t| t.slug.as_str()).collect();
        assert_eq!(slugs, vec!["rust", "web-dev"]);
    }

    #[tokio::test]
    async fn test_get_by_id_or_slug() {
        let (service, author, _, _) = setup().await;
        let created = service.create(post_input("Find Me"), &author).await.unwrap();

        let by_slug = service.get("find-me").await.unwrap();
        assert_eq!(by_slug.id, created.id);

        let by_id = service.get(&created.id.to_string()).await.unwrap();
        assert_eq!(by_id.id, created.id);

        assert!(matches!(
            service.get("nope").await,
            Err(PostServiceError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_update_title_rederives_slug() {
        let (service, author, _, _) = setup().await;
        service.create(post_input("Existing Post"), &author).await.unwrap();
        let post = service.create(post_input("Old Title"), &author).await.unwrap();

        // Retitling to collide with another post's slug gets a suffix,
        // not a constraint failure
        let updated = service
            .update(
                post.id,
                UpdatePostInput {
                    title: Some("Existing Post".to_string()),
                    ..Default::default()
                },
                &author,
            )
            .await
            .expect("Update should succeed");

        assert_eq!(updated.title, "Existing Post");
        assert_eq!(updated.slug, "existing-post-1");
    }

    #[tokio::test]
    async fn test_update_same_title_keeps_slug() {
        let (service, author, _, _) = setup().await;
        let post = service.create(post_input("Stable"), &author).await.unwrap();

        let updated = service
            .update(
                post.id,
                UpdatePostInput {
                    title: Some("Stable".to_string()),
                    content: Some("Fresh body".to_string()),
                    ..Default::default()
                },
                &author,
            )
            .await
            .unwrap();

        assert_eq!(updated.slug, "stable");
        assert_eq!(updated.content, "Fresh body");
    }

    #[tokio::test]
    async fn test_publish_transition_sets_published_at_once() {
        let (service, author, _, _) = setup().await;
        let post = service.create(post_input("Lifecycle"), &author).await.unwrap();
        assert!(post.published_at.is_none());

        let published = service
            .update(
                post.id,
                UpdatePostInput {
                    status: Some(PostStatus::Published),
                    ..Default::default()
                },
                &author,
            )
            .await
            .unwrap();
        let first_published_at = published.published_at.expect("Should be stamped");

        // Archiving does not clear the timestamp
        let archived = service
            .update(
                post.id,
                UpdatePostInput {
                    status: Some(PostStatus::Archived),
                    ..Default::default()
                },
                &author,
            )
            .await
            .unwrap();
        assert_eq!(archived.published_at, Some(first_published_at));

        // Re-publishing keeps the original timestamp
        let republished = service
            .update(
                post.id,
                UpdatePostInput {
                    status: Some(PostStatus::Published),
                    ..Default::default()
                },
                &author,
            )
            .await
            .unwrap();
        assert_eq!(republished.published_at, Some(first_published_at));
    }

    #[tokio::test]
    async fn test_update_forbidden_for_stranger() {
        let (service, author, stranger, admin) = setup().await;
        let post = service.create(post_input("Protected"), &author).await.unwrap();

        let denied = service
            .update(
                post.id,
                UpdatePostInput {
                    content: Some("Defaced".to_string()),
                    ..Default::default()
                },
                &stranger,
            )
            .await;
        assert!(matches!(denied, Err(PostServiceError::Forbidden)));

        // Post left unmodified
        let unchanged = service.get_by_id(post.id).await.unwrap();
        assert_eq!(unchanged.content, "Body");

        // Superuser may edit anyone's post
        let edited = service
            .update(
                post.id,
                UpdatePostInput {
                    content: Some("Moderated".to_string()),
                    ..Default::default()
                },
                &admin,
            )
            .await
            .unwrap();
        assert_eq!(edited.content, "Moderated");
    }

    #[tokio::test]
    async fn test_delete_forbidden_for_stranger() {
        let (service, author, stranger, _) = setup().await;
        let post = service.create(post_input("Keep"), &author).await.unwrap();

        let denied = service.delete(post.id, &stranger).await;
        assert!(matches!(denied, Err(PostServiceError::Forbidden)));
        assert!(service.get_by_id(post.id).await.is_ok());

        service.delete(post.id, &author).await.expect("Owner may delete");
        assert!(matches!(
            service.get_by_id(post.id).await,
            Err(PostServiceError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_list_status_filter_with_total() {
        let (service, author, _, _) = setup().await;

        for i in 0..3 {
            let mut input = post_input(&format!("Published {}", i));
            input.status = PostStatus::Published;
            service.create(input, &author).await.unwrap();
        }
        service.create(post_input("Draft One"), &author).await.unwrap();

        let filter = PostFilter {
            status: Some(PostStatus::Published),
            ..Default::default()
        };
        let page = service.list(&filter, &ListParams::new(1, 2)).await.unwrap();

        assert_eq!(page.items.len(), 2);
        assert_eq!(page.total, 3, "total is independent of the page window");
        assert!(page.items.iter().all(|p| p.status == PostStatus::Published));
    }

    #[tokio::test]
    async fn test_create_tag_and_duplicate() {
        let (service, _, _, _) = setup().await;

        let tag = service
            .create_tag(CreateTagInput {
                name: "Rust".to_string(),
                description: Some("The language".to_string()),
            })
            .await
            .expect("Create should succeed");
        assert_eq!(tag.name, "rust");
        assert_eq!(tag.slug, "rust");

        let dup = service
            .create_tag(CreateTagInput {
                name: " RUST ".to_string(),
                description: None,
            })
            .await;
        assert!(matches!(dup, Err(PostServiceError::DuplicateTag(_))));
    }

    #[tokio::test]
    async fn test_list_tags() {
        let (service, _, _, _) = setup().await;

        for name in ["zebra", "apple", "mango"] {
            service
                .create_tag(CreateTagInput {
                    name: name.to_string(),
                    description: None,
                })
                .await
                .unwrap();
        }

        let page = service.list_tags(&ListParams::new(1, 2)).await.unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.total, 3);
        assert_eq!(page.items[0].name, "apple");
    }

    #[tokio::test]
    async fn test_comments() {
        let (service, author, stranger, _) = setup().await;
        let post = service.create(post_input("Discussed"), &author).await.unwrap();

        service
            .add_comment(
                post.id,
                CreateCommentInput {
                    content: "First!".to_string(),
                },
                &stranger,
            )
            .await
            .expect("Comment should succeed");

        let comments = service.list_comments(post.id).await.unwrap();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].author_id, stranger.id);
        assert!(comments[0].is_approved);

        let empty = service
            .add_comment(
                post.id,
                CreateCommentInput {
                    content: "   ".to_string(),
                },
                &stranger,
            )
            .await;
        assert!(matches!(empty, Err(PostServiceError::ValidationError(_))));

        let missing_post = service
            .add_comment(
                9999,
                CreateCommentInput {
                    content: "Hello".to_string(),
                },
                &stranger,
            )
            .await;
        assert!(matches!(missing_post, Err(PostServiceError::NotFound)));
    }

    #[tokio::test]
    async fn test_view_counter_is_best_effort() {
        let (service, author, _, _) = setup().await;
        let mut input = post_input("Viewed");
        input.status = PostStatus::Published;
        let post = service.create(input, &author).await.unwrap();

        service.record_view(post.id);
        service.record_view(post.id);

        // The increment runs off the request path; give it a moment
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;

        let found = service.get_by_id(post.id).await.unwrap();
        assert_eq!(found.view_count, 2);
    }
}
