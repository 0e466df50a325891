//! User preferences model
//!
//! Questionnaire answers attached to a user account, split into three
//! sections: basic (single/multiple-choice lifestyle answers), text
//! (free-form answers) and a visual test. Each section tracks its own
//! completion flag; `all_completed` is derived from the three and
//! persisted whenever any section is updated.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Preferences entity; at most one per user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPreferences {
    /// Unique identifier
    pub id: i64,
    /// Owning user (unique)
    pub user_id: i64,

    // Basic section
    pub gender: Option<String>,
    pub age: Option<i64>,
    pub age_min: Option<i64>,
    pub age_max: Option<i64>,
    pub location: Option<String>,
    pub education: Option<String>,
    pub occupation: Option<String>,
    pub income: Option<String>,
    pub religion: Option<String>,
    pub smoking: Option<String>,
    pub drinking: Option<String>,
    pub exercise: Option<String>,
    pub relationship_type: Option<String>,

    // Additional choice answers, not part of any completion check
    pub children: Option<String>,
    pub pets: Option<String>,
    pub personality_type: Option<String>,
    pub hobbies: Option<String>,
    pub music_taste: Option<String>,
    pub movie_preference: Option<String>,

    // Text section
    pub communication_style: Option<String>,
    pub love_language: Option<String>,
    pub conflict_resolution: Option<String>,
    pub social_preference: Option<String>,
    pub travel_preference: Option<String>,
    pub food_preference: Option<String>,
    pub weekend_activity: Option<String>,
    pub financial_approach: Option<String>,
    pub future_goals: Option<String>,

    // Visual test
    pub visual_test_completed: bool,
    /// Serialized visual test results (JSON string)
    pub visual_preferences: Option<String>,

    // Completion flags, recomputed on every relevant update
    pub basic_completed: bool,
    pub text_completed: bool,
    pub all_completed: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserPreferences {
    /// Create an empty preferences record for the given user.
    pub fn empty(user_id: i64) -> Self {
        let now = Utc::now();
        Self {
            id: 0, // Will be set by the database
            user_id,
            gender: None,
            age: None,
            age_min: None,
            age_max: None,
            location: None,
            education: None,
            occupation: None,
            income: None,
            religion: None,
            smoking: None,
            drinking: None,
            exercise: None,
            relationship_type: None,
            children: None,
            pets: None,
            personality_type: None,
            hobbies: None,
            music_taste: None,
            movie_preference: None,
            communication_style: None,
            love_language: None,
            conflict_resolution: None,
            social_preference: None,
            travel_preference: None,
            food_preference: None,
            weekend_activity: None,
            financial_approach: None,
            future_goals: None,
            visual_test_completed: false,
            visual_preferences: None,
            basic_completed: false,
            text_completed: false,
            all_completed: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Patch for preferences; only present fields are applied.
///
/// Section handlers deserialize their payloads into this type and force
/// the relevant completion flag; the generic update endpoint leaves the
/// flags to the evaluator.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PreferencesPatch {
    pub gender: Option<String>,
    pub age: Option<i64>,
    pub age_min: Option<i64>,
    pub age_max: Option<i64>,
    pub location: Option<String>,
    pub education: Option<String>,
    pub occupation: Option<String>,
    pub income: Option<String>,
    pub religion: Option<String>,
    pub smoking: Option<String>,
    pub drinking: Option<String>,
    pub exercise: Option<String>,
    pub relationship_type: Option<String>,
    pub children: Option<String>,
    pub pets: Option<String>,
    pub personality_type: Option<String>,
    pub hobbies: Option<String>,
    pub music_taste: Option<String>,
    pub movie_preference: Option<String>,
    pub communication_style: Option<String>,
    pub love_language: Option<String>,
    pub conflict_resolution: Option<String>,
    pub social_preference: Option<String>,
    pub travel_preference: Option<String>,
    pub food_preference: Option<String>,
    pub weekend_activity: Option<String>,
    pub financial_approach: Option<String>,
    pub future_goals: Option<String>,
    pub visual_preferences: Option<String>,
    pub visual_test_completed: Option<bool>,
    pub basic_completed: Option<bool>,
    pub text_completed: Option<bool>,
}

impl PreferencesPatch {
    /// Apply the present fields onto the record, field by field.
    pub fn apply(&self, prefs: &mut UserPreferences) {
        if let Some(ref v) = self.gender {
            prefs.gender = Some(v.clone());
        }
        if let Some(v) = self.age {
            prefs.age = Some(v);
        }
        if let Some(v) = self.age_min {
            prefs.age_min = Some(v);
        }
        if let Some(v) = self.age_max {
            prefs.age_max = Some(v);
        }
        if let Some(ref v) = self.location {
            prefs.location = Some(v.clone());
        }
        if let Some(ref v) = self.education {
            prefs.education = Some(v.clone());
        }
        if let Some(ref v) = self.occupation {
            prefs.occupation = Some(v.clone());
        }
        if let Some(ref v) = self.income {
            prefs.income = Some(v.clone());
        }
        if let Some(ref v) = self.religion {
            prefs.religion = Some(v.clone());
        }
        if let Some(ref v) = self.smoking {
            prefs.smoking = Some(v.clone());
        }
        if let Some(ref v) = self.drinking {
            prefs.drinking = Some(v.clone());
        }
        if let Some(ref v) = self.exercise {
            prefs.exercise = Some(v.clone());
        }
        if let Some(ref v) = self.relationship_type {
            prefs.relationship_type = Some(v.clone());
        }
        if let Some(ref v) = self.children {
            prefs.children = Some(v.clone());
        }
        if let Some(ref v) = self.pets {
            prefs.pets = Some(v.clone());
        }
        if let Some(ref v) = self.personality_type {
            prefs.personality_type = Some(v.clone());
        }
        if let Some(ref v) = self.hobbies {
            prefs.hobbies = Some(v.clone());
        }
        if let Some(ref v) = self.music_taste {
            prefs.music_taste = Some(v.clone());
        }
        if let Some(ref v) = self.movie_preference {
            prefs.movie_preference = Some(v.clone());
        }
        if let Some(ref v) = self.communication_style {
            prefs.communication_style = Some(v.clone());
        }
        if let Some(ref v) = self.love_language {
            prefs.love_language = Some(v.clone());
        }
        if let Some(ref v) = self.conflict_resolution {
            prefs.conflict_resolution = Some(v.clone());
        }
        if let Some(ref v) = self.social_preference {
            prefs.social_preference = Some(v.clone());
        }
        if let Some(ref v) = self.travel_preference {
            prefs.travel_preference = Some(v.clone());
        }
        if let Some(ref v) = self.food_preference {
            prefs.food_preference = Some(v.clone());
        }
        if let Some(ref v) = self.weekend_activity {
            prefs.weekend_activity = Some(v.clone());
        }
        if let Some(ref v) = self.financial_approach {
            prefs.financial_approach = Some(v.clone());
        }
        if let Some(ref v) = self.future_goals {
            prefs.future_goals = Some(v.clone());
        }
        if let Some(ref v) = self.visual_preferences {
            prefs.visual_preferences = Some(v.clone());
        }
        if let Some(v) = self.visual_test_completed {
            prefs.visual_test_completed = v;
        }
        if let Some(v) = self.basic_completed {
            prefs.basic_completed = v;
        }
        if let Some(v) = self.text_completed {
            prefs.text_completed = v;
        }
    }
}
