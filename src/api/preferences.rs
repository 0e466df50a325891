//! Preferences API endpoints
//!
//! Handles HTTP requests for the questionnaire, always scoped to the
//! authenticated account:
//! - GET /preferences - Current answers
//! - PUT /preferences - Partial update
//! - GET /preferences/status - Per-section completion report
//! - POST /preferences/basic|text|visual - Section updates

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::middleware::{AppState, AuthenticatedUser};
use crate::models::{PreferencesPatch, UserPreferences};
use crate::services::PreferencesStatus;

/// Envelope used by all preferences endpoints
#[derive(Debug, Serialize)]
pub struct PreferencesEnvelope<T: Serialize> {
    pub message: String,
    pub data: T,
    pub success: bool,
}

impl<T: Serialize> PreferencesEnvelope<T> {
    fn new(message: &str, data: T) -> Json<Self> {
        Json(Self {
            message: message.to_string(),
            data,
            success: true,
        })
    }
}

/// Build the preferences router (requires auth middleware)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_preferences).put(update_preferences))
        .route("/status", get(get_status))
        .route("/basic", post(update_basic))
        .route("/text", post(update_text))
        .route("/visual", post(update_visual))
}

/// GET /preferences - Current answers, `null` when none saved yet
async fn get_preferences(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<PreferencesEnvelope<Option<UserPreferences>>>, ApiError> {
    let prefs = state.preferences_service.get(user.0.id).await?;

    let message = if prefs.is_some() {
        "Preferences retrieved successfully"
    } else {
        "No preferences found"
    };
    Ok(PreferencesEnvelope::new(message, prefs))
}

/// PUT /preferences - Partial update across sections
async fn update_preferences(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(patch): Json<PreferencesPatch>,
) -> Result<Json<PreferencesEnvelope<UserPreferences>>, ApiError> {
    let prefs = state.preferences_service.update(user.0.id, patch).await?;
    Ok(PreferencesEnvelope::new("Preferences updated successfully", prefs))
}

/// GET /preferences/status - Per-section completion report
async fn get_status(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<PreferencesEnvelope<PreferencesStatus>>, ApiError> {
    let status = state.preferences_service.status(user.0.id).await?;
    Ok(PreferencesEnvelope::new(
        "Preferences status retrieved successfully",
        status,
    ))
}

/// POST /preferences/basic - Basic section update
async fn update_basic(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(patch): Json<PreferencesPatch>,
) -> Result<Json<PreferencesEnvelope<UserPreferences>>, ApiError> {
    let prefs = state.preferences_service.update(user.0.id, patch).await?;
    Ok(PreferencesEnvelope::new(
        "Basic preferences updated successfully",
        prefs,
    ))
}

/// POST /preferences/text - Text section update
async fn update_text(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(patch): Json<PreferencesPatch>,
) -> Result<Json<PreferencesEnvelope<UserPreferences>>, ApiError> {
    let prefs = state.preferences_service.update(user.0.id, patch).await?;
    Ok(PreferencesEnvelope::new(
        "Text preferences updated successfully",
        prefs,
    ))
}

/// POST /preferences/visual - Store visual test results
///
/// The only operation that marks the visual section completed.
async fn update_visual(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(data): Json<serde_json::Value>,
) -> Result<Json<PreferencesEnvelope<UserPreferences>>, ApiError> {
    let prefs = state
        .preferences_service
        .update_visual(user.0.id, data)
        .await?;
    Ok(PreferencesEnvelope::new(
        "Visual preferences updated successfully",
        prefs,
    ))
}
