//! Post API endpoints
//!
//! Handles HTTP requests for posts, tags and comments:
//! - GET /posts - Filtered, paginated listing
//! - POST /posts - Create a post
//! - GET /posts/{id_or_slug} - Get a post (counts a view when published)
//! - PUT /posts/{id} - Update a post
//! - DELETE /posts/{id} - Delete a post
//! - GET|POST /posts/tags - Tag listing and creation
//! - GET|POST /posts/{id}/comments - Comments of a post

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::common::PaginationQuery;
use crate::api::error::ApiError;
use crate::api::middleware::{AppState, AuthenticatedUser};
use crate::models::{
    Comment, CreateCommentInput, CreatePostInput, CreateTagInput, PagedResult, Post, PostFilter,
    PostStatus, Tag, UpdatePostInput,
};

fn default_page() -> u32 {
    1
}

fn default_size() -> u32 {
    20
}

/// Query parameters for post listing; filters combine with AND.
#[derive(Debug, Deserialize)]
pub struct ListPostsQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_size")]
    pub size: u32,
    pub status: Option<PostStatus>,
    pub author_id: Option<i64>,
    /// Tag slug
    pub tag: Option<String>,
    /// Case-insensitive substring search over title, content and excerpt
    pub search: Option<String>,
    pub is_featured: Option<bool>,
}

/// Response for a single post
#[derive(Debug, Serialize)]
pub struct PostResponse {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub status: String,
    pub is_featured: bool,
    pub view_count: i64,
    pub author_id: i64,
    pub published_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<TagResponse>,
}

impl PostResponse {
    fn from_post(post: Post, tags: Vec<Tag>) -> Self {
        Self {
            id: post.id,
            slug: post.slug,
            title: post.title,
            content: post.content,
            excerpt: post.excerpt,
            status: post.status.to_string(),
            is_featured: post.is_featured,
            view_count: post.view_count,
            author_id: post.author_id,
            published_at: post.published_at.map(|dt| dt.to_rfc3339()),
            created_at: post.created_at.to_rfc3339(),
            updated_at: post.updated_at.to_rfc3339(),
            tags: tags.into_iter().map(Into::into).collect(),
        }
    }
}

/// Response for post listings
#[derive(Debug, Serialize)]
pub struct PostsListResponse {
    pub posts: Vec<PostResponse>,
    pub total: i64,
    pub page: u32,
    pub size: u32,
    pub pages: u32,
}

impl PostsListResponse {
    fn from_page(page: PagedResult<Post>) -> Self {
        let pages = page.total_pages();
        Self {
            total: page.total,
            page: page.page,
            size: page.per_page,
            pages,
            posts: page
                .items
                .into_iter()
                .map(|post| PostResponse::from_post(post, Vec::new()))
                .collect(),
        }
    }
}

/// Response for a single tag
#[derive(Debug, Serialize)]
pub struct TagResponse {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub created_at: String,
}

impl From<Tag> for TagResponse {
    fn from(tag: Tag) -> Self {
        Self {
            id: tag.id,
            name: tag.name,
            slug: tag.slug,
            description: tag.description,
            created_at: tag.created_at.to_rfc3339(),
        }
    }
}

/// Response for tag listings
#[derive(Debug, Serialize)]
pub struct TagsListResponse {
    pub tags: Vec<TagResponse>,
    pub total: i64,
    pub page: u32,
    pub size: u32,
    pub pages: u32,
}

/// Response for a single comment
#[derive(Debug, Serialize)]
pub struct CommentResponse {
    pub id: i64,
    pub post_id: i64,
    pub author_id: i64,
    pub content: String,
    pub is_approved: bool,
    pub created_at: String,
}

impl From<Comment> for CommentResponse {
    fn from(comment: Comment) -> Self {
        Self {
            id: comment.id,
            post_id: comment.post_id,
            author_id: comment.author_id,
            content: comment.content,
            is_approved: comment.is_approved,
            created_at: comment.created_at.to_rfc3339(),
        }
    }
}

/// Response for comment listings
#[derive(Debug, Serialize)]
pub struct CommentsListResponse {
    pub comments: Vec<CommentResponse>,
    pub total: i64,
}

/// Acknowledgement body for deletions
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
    pub success: bool,
}

/// Build public post routes (no auth required)
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_posts))
        .route("/tags", get(list_tags))
        .route("/{id}", get(get_post))
        .route("/{id}/comments", get(list_comments))
}

/// Build protected post routes (requires auth middleware)
pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_post))
        .route("/tags", post(create_tag))
        .route("/{id}", axum::routing::put(update_post).delete(delete_post))
        .route("/{id}/comments", post(create_comment))
}

/// GET /posts - Filtered, paginated listing
async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<ListPostsQuery>,
) -> Result<Json<PostsListResponse>, ApiError> {
    let filter = PostFilter {
        status: query.status,
        author_id: query.author_id,
        tag_slug: query.tag,
        search: query.search,
        is_featured: query.is_featured,
    };

    let params = crate::models::ListParams::new(query.page, query.size);
    let page = state.post_service.list(&filter, &params).await?;

    Ok(Json(PostsListResponse::from_page(page)))
}

/// POST /posts - Create a post
async fn create_post(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<CreatePostInput>,
) -> Result<impl IntoResponse, ApiError> {
    let post = state.post_service.create(body, &user.0).await?;
    let tags = state.post_service.tags_of(post.id).await?;

    Ok((StatusCode::CREATED, Json(PostResponse::from_post(post, tags))))
}

/// GET /posts/{id_or_slug} - Get a post
///
/// Reading a published post counts a view; the increment runs off the
/// request path and never delays or fails the response.
async fn get_post(
    State(state): State<AppState>,
    Path(ident): Path<String>,
) -> Result<Json<PostResponse>, ApiError> {
    let post = state.post_service.get(&ident).await?;

    if post.status == PostStatus::Published {
        state.post_service.record_view(post.id);
    }

    let tags = state.post_service.tags_of(post.id).await?;
    Ok(Json(PostResponse::from_post(post, tags)))
}

/// PUT /posts/{id} - Update a post (owner or superuser)
async fn update_post(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(body): Json<UpdatePostInput>,
) -> Result<Json<PostResponse>, ApiError> {
    let post = state.post_service.update(id, body, &user.0).await?;
    let tags = state.post_service.tags_of(post.id).await?;

    Ok(Json(PostResponse::from_post(post, tags)))
}

/// DELETE /posts/{id} - Delete a post (owner or superuser)
async fn delete_post(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.post_service.delete(id, &user.0).await?;

    Ok(Json(MessageResponse {
        message: "Post deleted successfully".to_string(),
        success: true,
    }))
}

/// GET /posts/tags - Paginated tag listing
async fn list_tags(
    State(state): State<AppState>,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<TagsListResponse>, ApiError> {
    let page = state.post_service.list_tags(&query.params()).await?;

    let pages = page.total_pages();
    Ok(Json(TagsListResponse {
        total: page.total,
        page: page.page,
        size: page.per_page,
        pages,
        tags: page.items.into_iter().map(Into::into).collect(),
    }))
}

/// POST /posts/tags - Create a tag
async fn create_tag(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Json(body): Json<CreateTagInput>,
) -> Result<impl IntoResponse, ApiError> {
    let tag = state.post_service.create_tag(body).await?;

    Ok((StatusCode::CREATED, Json(TagResponse::from(tag))))
}

/// GET /posts/{id}/comments - Approved comments of a post
async fn list_comments(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<CommentsListResponse>, ApiError> {
    let comments = state.post_service.list_comments(id).await?;

    Ok(Json(CommentsListResponse {
        total: comments.len() as i64,
        comments: comments.into_iter().map(Into::into).collect(),
    }))
}

/// POST /posts/{id}/comments - Comment on a post
async fn create_comment(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(body): Json<CreateCommentInput>,
) -> Result<impl IntoResponse, ApiError> {
    let comment = state.post_service.add_comment(id, body, &user.0).await?;

    Ok((StatusCode::CREATED, Json(CommentResponse::from(comment))))
}
