//! API error type
//!
//! Every failure leaving the HTTP boundary is rendered as the uniform
//! body `{"message": <string>, "success": false}` with a status drawn
//! from one of six kinds. Handlers convert service errors via `From`, so
//! the kind, not the message text, is the contract.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::services::{
    AuthServiceError, PostServiceError, PreferencesServiceError, UserServiceError,
};

/// Error categories mapped to HTTP status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// 422 Unprocessable Entity
    Validation,
    /// 404 Not Found
    NotFound,
    /// 401 Unauthorized
    Unauthorized,
    /// 403 Forbidden
    Forbidden,
    /// 409 Conflict
    Conflict,
    /// 500 Internal Server Error
    Internal,
}

impl ApiErrorKind {
    fn status(self) -> StatusCode {
        match self {
            ApiErrorKind::Validation => StatusCode::UNPROCESSABLE_ENTITY,
            ApiErrorKind::NotFound => StatusCode::NOT_FOUND,
            ApiErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ApiErrorKind::Conflict => StatusCode::CONFLICT,
            ApiErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error response for API errors
#[derive(Debug)]
pub struct ApiError {
    pub kind: ApiErrorKind,
    pub message: String,
}

/// Uniform error body
#[derive(Debug, Serialize)]
struct ErrorBody {
    message: String,
    success: bool,
}

impl ApiError {
    pub fn new(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Validation, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::NotFound, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Unauthorized, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Forbidden, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Conflict, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Internal, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.kind == ApiErrorKind::Internal {
            tracing::error!("Internal error: {}", self.message);
        }

        let body = ErrorBody {
            message: self.message,
            success: false,
        };
        (self.kind.status(), Json(body)).into_response()
    }
}

impl From<AuthServiceError> for ApiError {
    fn from(err: AuthServiceError) -> Self {
        match err {
            AuthServiceError::AuthenticationFailed => {
                ApiError::unauthorized("Authentication failed")
            }
            AuthServiceError::ValidationError(msg) => ApiError::validation(msg),
            AuthServiceError::EmailTaken => {
                ApiError::conflict("User with this email already exists")
            }
            AuthServiceError::InternalError(e) => ApiError::internal(e.to_string()),
        }
    }
}

impl From<UserServiceError> for ApiError {
    fn from(err: UserServiceError) -> Self {
        match err {
            UserServiceError::NotFound => ApiError::not_found("User not found"),
            UserServiceError::Forbidden => ApiError::forbidden("Not enough permissions"),
            UserServiceError::ValidationError(msg) => ApiError::validation(msg),
            UserServiceError::EmailTaken => ApiError::conflict("Email already taken"),
            UserServiceError::InternalError(e) => ApiError::internal(e.to_string()),
        }
    }
}

impl From<PostServiceError> for ApiError {
    fn from(err: PostServiceError) -> Self {
        match err {
            PostServiceError::NotFound => ApiError::not_found("Post not found"),
            PostServiceError::Forbidden => ApiError::forbidden("Not enough permissions"),
            PostServiceError::ValidationError(msg) => ApiError::validation(msg),
            PostServiceError::DuplicateTag(name) => {
                ApiError::conflict(format!("Tag already exists: {}", name))
            }
            PostServiceError::InternalError(e) => ApiError::internal(e.to_string()),
        }
    }
}

impl From<PreferencesServiceError> for ApiError {
    fn from(err: PreferencesServiceError) -> Self {
        match err {
            PreferencesServiceError::InternalError(e) => ApiError::internal(e.to_string()),
        }
    }
}
