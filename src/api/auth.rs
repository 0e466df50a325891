//! Authentication API endpoints
//!
//! Handles HTTP requests for account authentication:
//! - POST /auth/register - Account registration
//! - POST /auth/login - Login, returns a bearer token
//! - GET /auth/me - Current account with profile status
//! - POST /auth/logout - Advisory logout (tokens are stateless)

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::middleware::{AppState, AuthenticatedUser};
use crate::models::User;
use crate::services::{AccessToken, LoginInput, PreferencesStatus, ProfileStatus, RegisterInput};

/// Request body for registration
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub date_of_birth: Option<DateTime<Utc>>,
    pub gender: Option<String>,
}

/// Request body for login
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response for account info
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub is_active: bool,
    pub is_superuser: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            is_active: user.is_active,
            is_superuser: user.is_superuser,
            created_at: user.created_at.to_rfc3339(),
            updated_at: user.updated_at.to_rfc3339(),
        }
    }
}

/// Response for successful registration
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: String,
    pub success: bool,
    pub user: UserResponse,
}

/// Response for successful login
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: UserResponse,
    pub token: AccessToken,
    pub preferences_status: PreferencesStatus,
}

/// Response for the current account
#[derive(Debug, Serialize)]
pub struct MeResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub profile_status: ProfileStatus,
}

/// Simple acknowledgement body
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
    pub success: bool,
}

/// Build public auth routes (no auth required)
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

/// Build protected auth routes (requires auth middleware)
pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/me", get(me))
        .route("/logout", post(logout))
}

/// POST /auth/register - Register a new account
async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let input = RegisterInput {
        email: body.email,
        password: body.password,
        confirm_password: body.confirm_password,
        first_name: body.first_name,
        last_name: body.last_name,
        date_of_birth: body.date_of_birth,
        gender: body.gender,
    };

    let user = state.auth_service.register(input).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "Registration successful".to_string(),
            success: true,
            user: user.into(),
        }),
    ))
}

/// POST /auth/login - Authenticate and issue a bearer token
async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let (user, token) = state
        .auth_service
        .login(LoginInput {
            email: body.email,
            password: body.password,
        })
        .await?;

    let preferences_status = state.preferences_service.status(user.id).await?;

    Ok(Json(LoginResponse {
        user: user.into(),
        token,
        preferences_status,
    }))
}

/// GET /auth/me - Current account with profile completeness
async fn me(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<MeResponse>, ApiError> {
    let profile_status = state.user_service.profile_status(user.0.id).await?;

    Ok(Json(MeResponse {
        user: user.0.into(),
        profile_status,
    }))
}

/// POST /auth/logout - Advisory logout
///
/// Tokens are stateless; the server holds no session to clear. The
/// client is expected to discard its token.
async fn logout(_user: AuthenticatedUser) -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Logout successful. Please discard your access token.".to_string(),
        success: true,
    })
}
