//! Post model
//!
//! This module provides:
//! - `Post` entity representing a blog-style post
//! - `PostStatus` enum for publication states
//! - Input types for creating and updating posts
//! - Filter and pagination types for list queries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Post entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    /// Unique identifier
    pub id: i64,
    /// URL-friendly slug (globally unique)
    pub slug: String,
    /// Post title
    pub title: String,
    /// Post body
    pub content: String,
    /// Optional short summary
    pub excerpt: Option<String>,
    /// Publication status
    pub status: PostStatus,
    /// Whether the post is featured
    pub is_featured: bool,
    /// View count (best-effort counter)
    pub view_count: i64,
    /// Author user ID
    pub author_id: i64,
    /// Set on the first transition into published, never cleared
    pub published_at: Option<DateTime<Utc>>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// Create a new post with the given parameters.
    ///
    /// `published_at` is stamped immediately when the initial status is
    /// already published.
    pub fn new(
        slug: String,
        title: String,
        content: String,
        excerpt: Option<String>,
        status: PostStatus,
        is_featured: bool,
        author_id: i64,
    ) -> Self {
        let now = Utc::now();
        let published_at = if status == PostStatus::Published {
            Some(now)
        } else {
            None
        };

        Self {
            id: 0, // Will be set by the database
            slug,
            title,
            content,
            excerpt,
            status,
            is_featured,
            view_count: 0,
            author_id,
            published_at,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Post publication status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    /// Draft - not visible to public
    #[default]
    Draft,
    /// Published - visible to public
    Published,
    /// Archived - hidden but not deleted
    Archived,
}

impl PostStatus {
    /// Convert status to database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Published => "published",
            PostStatus::Archived => "archived",
        }
    }

    /// Parse status from database string representation
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "draft" => Some(PostStatus::Draft),
            "published" => Some(PostStatus::Published),
            "archived" => Some(PostStatus::Archived),
            _ => None,
        }
    }
}

impl std::fmt::Display for PostStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Input for creating a new post
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePostInput {
    /// Post title (the slug is derived from it)
    pub title: String,
    /// Post body
    pub content: String,
    /// Optional short summary
    pub excerpt: Option<String>,
    /// Publication status (defaults to draft)
    #[serde(default)]
    pub status: PostStatus,
    /// Whether the post is featured
    #[serde(default)]
    pub is_featured: bool,
    /// Tag names to attach; missing tags are created
    pub tag_names: Option<Vec<String>>,
}

/// Input for updating an existing post; only present fields are applied.
///
/// Slug and `published_at` are managed by the service: a title change
/// re-derives the slug, and the first transition into published stamps
/// the publication time.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePostInput {
    pub title: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    pub status: Option<PostStatus>,
    pub is_featured: Option<bool>,
    pub tag_names: Option<Vec<String>>,
}

impl UpdatePostInput {
    /// Check if any field is set
    pub fn has_changes(&self) -> bool {
        self.title.is_some()
            || self.content.is_some()
            || self.excerpt.is_some()
            || self.status.is_some()
            || self.is_featured.is_some()
            || self.tag_names.is_some()
    }

    /// Apply the plain fields onto the post, field by field.
    ///
    /// Title, status and the derived slug/published_at transitions are
    /// handled by the service before persisting.
    pub fn apply(&self, post: &mut Post) {
        if let Some(ref title) = self.title {
            post.title = title.clone();
        }
        if let Some(ref content) = self.content {
            post.content = content.clone();
        }
        if let Some(ref excerpt) = self.excerpt {
            post.excerpt = Some(excerpt.clone());
        }
        if let Some(is_featured) = self.is_featured {
            post.is_featured = is_featured;
        }
    }
}

/// Filter predicates for post listing; combined with logical AND.
#[derive(Debug, Clone, Default)]
pub struct PostFilter {
    /// Only posts with this status
    pub status: Option<PostStatus>,
    /// Only posts by this author
    pub author_id: Option<i64>,
    /// Only posts carrying the tag with this slug
    pub tag_slug: Option<String>,
    /// Case-insensitive substring match over title, content and excerpt
    pub search: Option<String>,
    /// Only featured (or only non-featured) posts
    pub is_featured: Option<bool>,
}

/// Pagination parameters for list queries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListParams {
    /// Page number (1-indexed)
    pub page: u32,
    /// Number of items per page
    pub per_page: u32,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 20,
        }
    }
}

impl ListParams {
    /// Create new pagination parameters.
    ///
    /// The page is floored at 1 and the page size clamped to 1..=100.
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, 100),
        }
    }

    /// Calculate the offset for database queries
    pub fn offset(&self) -> i64 {
        ((self.page.saturating_sub(1)) * self.per_page) as i64
    }

    /// Get the limit for database queries
    pub fn limit(&self) -> i64 {
        self.per_page as i64
    }
}

/// Paginated result container
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagedResult<T> {
    /// Items in the current page
    pub items: Vec<T>,
    /// Total number of items across all pages
    pub total: i64,
    /// Current page number (1-indexed)
    pub page: u32,
    /// Number of items per page
    pub per_page: u32,
}

impl<T> PagedResult<T> {
    /// Create a new paginated result
    pub fn new(items: Vec<T>, total: i64, params: &ListParams) -> Self {
        Self {
            items,
            total,
            page: params.page,
            per_page: params.per_page,
        }
    }

    /// Calculate the total number of pages
    pub fn total_pages(&self) -> u32 {
        if self.per_page == 0 {
            return 0;
        }
        ((self.total as u32) + self.per_page - 1) / self.per_page
    }

    /// Check if the result is empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Get the number of items in the current page
    pub fn len(&self) -> usize {
        self.items.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_new_draft_has_no_publish_time() {
        let post = Post::new(
            "my-post".to_string(),
            "My Post".to_string(),
            "Body".to_string(),
            None,
            PostStatus::Draft,
            false,
            1,
        );

        assert_eq!(post.slug, "my-post");
        assert!(post.published_at.is_none());
        assert_eq!(post.view_count, 0);
    }

    #[test]
    fn test_post_new_published_stamps_publish_time() {
        let post = Post::new(
            "live".to_string(),
            "Live".to_string(),
            "Body".to_string(),
            None,
            PostStatus::Published,
            false,
            1,
        );

        assert!(post.published_at.is_some());
    }

    #[test]
    fn test_status_round_trip() {
        for status in [PostStatus::Draft, PostStatus::Published, PostStatus::Archived] {
            assert_eq!(PostStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(PostStatus::from_str("bogus"), None);
    }

    #[test]
    fn test_list_params_clamping() {
        let params = ListParams::new(0, 500);
        assert_eq!(params.page, 1);
        assert_eq!(params.per_page, 100);
        assert_eq!(params.offset(), 0);

        let params = ListParams::new(3, 10);
        assert_eq!(params.offset(), 20);
        assert_eq!(params.limit(), 10);
    }

    #[test]
    fn test_paged_result_total_pages() {
        let params = ListParams::new(1, 10);
        let result: PagedResult<i32> = PagedResult::new(vec![], 25, &params);
        assert_eq!(result.total_pages(), 3);

        let result: PagedResult<i32> = PagedResult::new(vec![], 0, &params);
        assert_eq!(result.total_pages(), 0);
    }

    #[test]
    fn test_update_input_apply() {
        let mut post = Post::new(
            "old".to_string(),
            "Old".to_string(),
            "Body".to_string(),
            None,
            PostStatus::Draft,
            false,
            1,
        );

        let input = UpdatePostInput {
            content: Some("New body".to_string()),
            is_featured: Some(true),
            ..Default::default()
        };
        input.apply(&mut post);

        assert_eq!(post.content, "New body");
        assert!(post.is_featured);
        assert_eq!(post.title, "Old");
    }
}
