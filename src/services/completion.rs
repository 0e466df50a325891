//! Completion evaluators
//!
//! Two independent completeness policies live here:
//!
//! - the post-registration **profile** check, which gates the page a user
//!   is redirected to after login, and
//! - the **preferences questionnaire** check, which tracks three sections
//!   (basic, text, visual) with persisted per-section flags.
//!
//! The two are deliberately separate concepts and are never merged.

use crate::models::{PreferencesPatch, UserPreferences, UserProfile};
use serde::Serialize;

/// Profile fields required for a complete profile, in reporting order.
const REQUIRED_PROFILE_FIELDS: [&str; 3] = ["first_name", "bio", "avatar_url"];

/// Redirect target while the profile is incomplete
const PROFILE_SETUP_REDIRECT: &str = "/edit-profile";

/// Redirect target once the profile is complete
const PROFILE_COMPLETE_REDIRECT: &str = "/welcome";

/// Result of evaluating a user's profile completeness
#[derive(Debug, Clone, Serialize)]
pub struct ProfileStatus {
    pub is_complete: bool,
    /// Names of the failing required fields, in declared order
    pub missing_fields: Vec<String>,
    pub redirect_to: String,
}

/// Evaluate profile completeness.
///
/// A profile is complete iff `first_name`, `bio` and `avatar_url` are all
/// present and non-blank. A user without a profile record is simply
/// missing every required field.
pub fn evaluate_profile(profile: Option<&UserProfile>) -> ProfileStatus {
    let missing_fields: Vec<String> = REQUIRED_PROFILE_FIELDS
        .iter()
        .filter(|&&field| {
            let value = match (field, profile) {
                (_, None) => None,
                ("first_name", Some(p)) => p.first_name.as_deref(),
                ("bio", Some(p)) => p.bio.as_deref(),
                ("avatar_url", Some(p)) => p.avatar_url.as_deref(),
                _ => None,
            };
            value.map_or(true, |v| v.trim().is_empty())
        })
        .map(|&field| field.to_string())
        .collect();

    let is_complete = missing_fields.is_empty();
    ProfileStatus {
        is_complete,
        missing_fields,
        redirect_to: if is_complete {
            PROFILE_COMPLETE_REDIRECT.to_string()
        } else {
            PROFILE_SETUP_REDIRECT.to_string()
        },
    }
}

/// Completion status of a user's preferences questionnaire
#[derive(Debug, Clone, Serialize)]
pub struct PreferencesStatus {
    pub has_preferences: bool,
    pub basic_completed: bool,
    pub text_completed: bool,
    pub visual_completed: bool,
    pub all_completed: bool,
}

impl PreferencesStatus {
    /// Status for a user who has never saved any preferences
    pub fn absent() -> Self {
        Self {
            has_preferences: false,
            basic_completed: false,
            text_completed: false,
            visual_completed: false,
            all_completed: false,
        }
    }

    /// Status read off a persisted preferences record
    pub fn of(prefs: &UserPreferences) -> Self {
        Self {
            has_preferences: true,
            basic_completed: prefs.basic_completed,
            text_completed: prefs.text_completed,
            visual_completed: prefs.visual_test_completed,
            all_completed: prefs.all_completed,
        }
    }
}

/// Check whether every basic-section answer is present.
pub fn basic_complete(prefs: &UserPreferences) -> bool {
    prefs.gender.is_some()
        && prefs.age.is_some()
        && prefs.age_min.is_some()
        && prefs.age_max.is_some()
        && prefs.location.is_some()
        && prefs.education.is_some()
        && prefs.occupation.is_some()
        && prefs.income.is_some()
        && prefs.religion.is_some()
        && prefs.smoking.is_some()
        && prefs.drinking.is_some()
        && prefs.exercise.is_some()
        && prefs.relationship_type.is_some()
}

/// Check whether every text-section answer is present.
pub fn text_complete(prefs: &UserPreferences) -> bool {
    prefs.communication_style.is_some()
        && prefs.love_language.is_some()
        && prefs.conflict_resolution.is_some()
        && prefs.social_preference.is_some()
        && prefs.travel_preference.is_some()
        && prefs.food_preference.is_some()
        && prefs.weekend_activity.is_some()
        && prefs.financial_approach.is_some()
        && prefs.future_goals.is_some()
}

/// Check whether a patch touches any basic-section field.
pub fn patch_touches_basic(patch: &PreferencesPatch) -> bool {
    patch.gender.is_some()
        || patch.age.is_some()
        || patch.age_min.is_some()
        || patch.age_max.is_some()
        || patch.location.is_some()
        || patch.education.is_some()
        || patch.occupation.is_some()
        || patch.income.is_some()
        || patch.religion.is_some()
        || patch.smoking.is_some()
        || patch.drinking.is_some()
        || patch.exercise.is_some()
        || patch.relationship_type.is_some()
}

/// Check whether a patch touches any text-section field.
pub fn patch_touches_text(patch: &PreferencesPatch) -> bool {
    patch.communication_style.is_some()
        || patch.love_language.is_some()
        || patch.conflict_resolution.is_some()
        || patch.social_preference.is_some()
        || patch.travel_preference.is_some()
        || patch.food_preference.is_some()
        || patch.weekend_activity.is_some()
        || patch.financial_approach.is_some()
        || patch.future_goals.is_some()
}

/// Recompute the persisted completion flags after a patch was applied.
///
/// A section flag is re-derived from its fields only when the patch
/// touched that section; the visual flag is only ever set explicitly by
/// its own update. `all_completed` is always re-derived from the three.
pub fn recompute_flags(prefs: &mut UserPreferences, patch: &PreferencesPatch) {
    if patch_touches_basic(patch) {
        prefs.basic_completed = basic_complete(prefs);
    }
    if patch_touches_text(patch) {
        prefs.text_completed = text_complete(prefs);
    }
    prefs.all_completed =
        prefs.basic_completed && prefs.text_completed && prefs.visual_test_completed;
}
