//! User API endpoints
//!
//! Handles HTTP requests for account administration and profiles:
//! - GET /users - Paginated account listing (superuser only)
//! - GET|PUT /users/{id} - Account read and update
//! - DELETE /users/{id} - Soft delete (superuser only)
//! - POST /users/{id}/change-password - Password change (self only)
//! - GET|PUT /users/{id}/profile - Profile read and update
//! - GET /users/{id}/with-profile - Combined account + profile read

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::auth::{MessageResponse, UserResponse};
use crate::api::error::ApiError;
use crate::api::middleware::{AppState, AuthenticatedUser};
use crate::models::{ProfilePatch, UpdateUserInput, UserProfile};

/// Query parameters for the account listing
#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_size")]
    pub size: u32,
    /// Filter by active state
    pub is_active: Option<bool>,
}

fn default_page() -> u32 {
    1
}

fn default_size() -> u32 {
    20
}

/// Request body for password changes
#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Response for account listings
#[derive(Debug, Serialize)]
pub struct UsersListResponse {
    pub users: Vec<UserResponse>,
    pub total: i64,
    pub page: u32,
    pub size: u32,
    pub pages: u32,
}

/// Response for a profile
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub id: i64,
    pub user_id: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub phone: Option<String>,
    pub date_of_birth: Option<String>,
    pub location: Option<String>,
    pub website: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<UserProfile> for ProfileResponse {
    fn from(profile: UserProfile) -> Self {
        Self {
            id: profile.id,
            user_id: profile.user_id,
            first_name: profile.first_name,
            last_name: profile.last_name,
            bio: profile.bio,
            avatar_url: profile.avatar_url,
            phone: profile.phone,
            date_of_birth: profile.date_of_birth.map(|dt| dt.to_rfc3339()),
            location: profile.location,
            website: profile.website,
            created_at: profile.created_at.to_rfc3339(),
            updated_at: profile.updated_at.to_rfc3339(),
        }
    }
}

/// Response combining an account with its profile
#[derive(Debug, Serialize)]
pub struct UserWithProfileResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub profile: Option<ProfileResponse>,
}

/// Build protected user routes (requires auth middleware).
///
/// The delete route is here rather than behind the superuser layer
/// because the service enforces the superuser rule itself and reports a
/// proper 403.
pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/{id}", get(get_user).put(update_user).delete(delete_user))
        .route("/{id}/change-password", post(change_password))
        .route("/{id}/profile", get(get_profile).put(update_profile))
        .route("/{id}/with-profile", get(get_user_with_profile))
}

/// Build superuser-only user routes
pub fn superuser_router() -> Router<AppState> {
    Router::new().route("/", get(list_users))
}

/// GET /users - Paginated account listing (superuser only)
async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<UsersListResponse>, ApiError> {
    let params = crate::models::ListParams::new(query.page, query.size);
    let page = state.user_service.list(query.is_active, &params).await?;

    let pages = page.total_pages();
    Ok(Json(UsersListResponse {
        total: page.total,
        page: page.page,
        size: page.per_page,
        pages,
        users: page.items.into_iter().map(Into::into).collect(),
    }))
}

/// GET /users/{id} - Account read
async fn get_user(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state.user_service.get(id).await?;
    Ok(Json(user.into()))
}

/// PUT /users/{id} - Account update (owner or superuser)
async fn update_user(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(body): Json<UpdateUserInput>,
) -> Result<Json<UserResponse>, ApiError> {
    let updated = state.user_service.update(id, body, &user.0).await?;
    Ok(Json(updated.into()))
}

/// DELETE /users/{id} - Soft delete (superuser only)
async fn delete_user(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.user_service.soft_delete(id, &user.0).await?;

    Ok(Json(MessageResponse {
        message: "User deleted successfully".to_string(),
        success: true,
    }))
}

/// POST /users/{id}/change-password - Password change (self only)
async fn change_password(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(body): Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .user_service
        .change_password(id, &body.current_password, &body.new_password, &user.0)
        .await?;

    Ok(Json(MessageResponse {
        message: "Password changed successfully".to_string(),
        success: true,
    }))
}

/// GET /users/{id}/profile - Profile read
///
/// Users without a saved profile get an empty scaffold so the client
/// always sees the full field set.
async fn get_profile(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let profile = state.user_service.get_profile(id).await?;
    Ok(Json(profile.into()))
}

/// PUT /users/{id}/profile - Profile update (owner or superuser)
async fn update_profile(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(body): Json<ProfilePatch>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let profile = state.user_service.update_profile(id, body, &user.0).await?;
    Ok(Json(profile.into()))
}

/// GET /users/{id}/with-profile - Combined account + profile read
async fn get_user_with_profile(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Json<UserWithProfileResponse>, ApiError> {
    let account = state.user_service.get(id).await?;
    let profile = state.user_service.get_profile(id).await?;

    // A scaffold profile (never persisted) is reported as absent
    let profile = if profile.id > 0 {
        Some(profile.into())
    } else {
        None
    };

    Ok(Json(UserWithProfileResponse {
        user: account.into(),
        profile,
    }))
}
