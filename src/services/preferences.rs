//! Preferences service
//!
//! Implements the questionnaire workflow: reading a user's answers,
//! applying partial updates, and keeping the per-section completion
//! flags persisted in step with the data. The record is created lazily
//! on the first update.

use crate::db::repositories::PreferencesRepository;
use crate::models::{PreferencesPatch, UserPreferences};
use crate::services::completion::{recompute_flags, PreferencesStatus};
use anyhow::Context;
use std::sync::Arc;

/// Error types for preferences service operations
#[derive(Debug, thiserror::Error)]
pub enum PreferencesServiceError {
    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Preferences service
pub struct PreferencesService {
    prefs_repo: Arc<dyn PreferencesRepository>,
}

impl PreferencesService {
    /// Create a new preferences service with the given repository
    pub fn new(prefs_repo: Arc<dyn PreferencesRepository>) -> Self {
        Self { prefs_repo }
    }

    /// Get a user's preferences, if any have been saved.
    pub async fn get(&self, user_id: i64) -> Result<Option<UserPreferences>, PreferencesServiceError> {
        self.prefs_repo
            .get_by_user_id(user_id)
            .await
            .context("Failed to get preferences")
            .map_err(Into::into)
    }

    /// Apply a partial update, creating the record on first write.
    ///
    /// After the patch is applied the touched sections' completion flags
    /// are recomputed and persisted together with the derived
    /// `all_completed` flag.
    pub async fn update(
        &self,
        user_id: i64,
        patch: PreferencesPatch,
    ) -> Result<UserPreferences, PreferencesServiceError> {
        let existing = self
            .prefs_repo
            .get_by_user_id(user_id)
            .await
            .context("Failed to get preferences")?;

        match existing {
            Some(mut prefs) => {
                patch.apply(&mut prefs);
                recompute_flags(&mut prefs, &patch);
                self.prefs_repo
                    .update(&prefs)
                    .await
                    .context("Failed to update preferences")
                    .map_err(Into::into)
            }
            None => {
                let mut prefs = UserPreferences::empty(user_id);
                patch.apply(&mut prefs);
                recompute_flags(&mut prefs, &patch);
                self.prefs_repo
                    .create(&prefs)
                    .await
                    .context("Failed to create preferences")
                    .map_err(Into::into)
            }
        }
    }

    /// Store visual test results and mark the visual section completed.
    ///
    /// This is the only way the visual flag is ever set; it is never
    /// inferred from data presence.
    pub async fn update_visual(
        &self,
        user_id: i64,
        visual_data: serde_json::Value,
    ) -> Result<UserPreferences, PreferencesServiceError> {
        let patch = PreferencesPatch {
            visual_preferences: Some(visual_data.to_string()),
            visual_test_completed: Some(true),
            ..Default::default()
        };
        self.update(user_id, patch).await
    }

    /// Report the completion status of a user's questionnaire.
    pub async fn status(&self, user_id: i64) -> Result<PreferencesStatus, PreferencesServiceError> {
        let prefs = self
            .prefs_repo
            .get_by_user_id(user_id)
            .await
            .context("Failed to get preferences")?;

        Ok(match prefs {
            Some(ref prefs) => PreferencesStatus::of(prefs),
            None => PreferencesStatus::absent(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxPreferencesRepository, SqlxUserRepository, UserRepository};
    use crate::db::{create_test_pool, migrations};
    use crate::models::User;

    async fn setup() -> (PreferencesService, i64) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let users = SqlxUserRepository::new(pool.clone());
        let user = users
            .create(&User::new("prefs@example.com".to_string(), "hash".to_string()))
            .await
            .expect("Failed to create user");

        (
            PreferencesService::new(SqlxPreferencesRepository::boxed(pool)),
            user.id,
        )
    }

    fn full_basic_patch() -> PreferencesPatch {
        PreferencesPatch {
            gender: Some("female".to_string()),
            age: Some(30),
            age_min: Some(25),
            age_max: Some(40),
            location: Some("Berlin".to_string()),
            education: Some("masters".to_string()),
            occupation: Some("engineer".to_string()),
            income: Some("mid".to_string()),
            religion: Some("none".to_string()),
            smoking: Some("never".to_string()),
            drinking: Some("social".to_string()),
            exercise: Some("weekly".to_string()),
            relationship_type: Some("serious".to_string()),
            ..Default::default()
        }
    }

    fn full_text_patch() -> PreferencesPatch {
        PreferencesPatch {
            communication_style: Some("direct".to_string()),
            love_language: Some("time".to_string()),
            conflict_resolution: Some("talk".to_string()),
            social_preference: Some("small groups".to_string()),
            travel_preference: Some("often".to_string()),
            food_preference: Some("anything".to_string()),
            weekend_activity: Some("hiking".to_string()),
            financial_approach: Some("saver".to_string()),
            future_goals: Some("family".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_get_absent() {
        let (service, user_id) = setup().await;

        assert!(service.get(user_id).await.unwrap().is_none());

        let status = service.status(user_id).await.unwrap();
        assert!(!status.has_preferences);
        assert!(!status.all_completed);
    }

    #[tokio::test]
    async fn test_update_creates_lazily() {
        let (service, user_id) = setup().await;

        let patch = PreferencesPatch {
            gender: Some("male".to_string()),
            ..Default::default()
        };
        let prefs = service.update(user_id, patch).await.unwrap();

        assert!(prefs.id > 0);
        assert_eq!(prefs.gender.as_deref(), Some("male"));
        assert!(!prefs.basic_completed, "partial basic section is incomplete");
    }

    #[tokio::test]
    async fn test_full_basic_section_completes() {
        let (service, user_id) = setup().await;

        let prefs = service.update(user_id, full_basic_patch()).await.unwrap();
        assert!(prefs.basic_completed);
        assert!(!prefs.text_completed);
        assert!(!prefs.all_completed);
    }

    #[tokio::test]
    async fn test_all_completed_requires_all_three_sections() {
        let (service, user_id) = setup().await;

        service.update(user_id, full_basic_patch()).await.unwrap();
        service.update(user_id, full_text_patch()).await.unwrap();

        let status = service.status(user_id).await.unwrap();
        assert!(status.basic_completed);
        assert!(status.text_completed);
        assert!(!status.visual_completed);
        assert!(!status.all_completed);

        let prefs = service
            .update_visual(user_id, serde_json::json!({"choices": [1, 2, 3]}))
            .await
            .unwrap();
        assert!(prefs.visual_test_completed);
        assert!(prefs.all_completed);

        let status = service.status(user_id).await.unwrap();
        assert!(status.all_completed);
    }

    #[tokio::test]
    async fn test_toggling_visual_off_clears_all_completed() {
        let (service, user_id) = setup().await;

        service.update(user_id, full_basic_patch()).await.unwrap();
        service.update(user_id, full_text_patch()).await.unwrap();
        service
            .update_visual(user_id, serde_json::json!({}))
            .await
            .unwrap();
        assert!(service.status(user_id).await.unwrap().all_completed);

        let patch = PreferencesPatch {
            visual_test_completed: Some(false),
            ..Default::default()
        };
        let prefs = service.update(user_id, patch).await.unwrap();

        assert!(!prefs.all_completed);
        assert!(prefs.basic_completed, "other sections are untouched");
        assert!(prefs.text_completed);
    }

    #[tokio::test]
    async fn test_section_update_does_not_rederive_others() {
        let (service, user_id) = setup().await;

        let prefs = service.update(user_id, full_basic_patch()).await.unwrap();
        assert!(prefs.basic_completed);

        // A text-only update leaves the basic flag alone
        let prefs = service
            .update(
                user_id,
                PreferencesPatch {
                    love_language: Some("time".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(prefs.basic_completed);
        assert!(!prefs.text_completed, "partial text section is incomplete");
    }

    #[tokio::test]
    async fn test_visual_data_round_trip() {
        let (service, user_id) = setup().await;

        let data = serde_json::json!({"pairs": [[1, 2], [3, 4]], "winner": "left"});
        let prefs = service.update_visual(user_id, data.clone()).await.unwrap();

        let stored: serde_json::Value =
            serde_json::from_str(prefs.visual_preferences.as_deref().unwrap())
                .expect("Stored visual data should be valid JSON");
        assert_eq!(stored, data);
    }
}
