//! User preferences repository
//!
//! The column list is long but mechanical; `row_to_preferences` and the
//! two write statements are the only places that enumerate it.

use crate::db::DbPool;
use crate::models::UserPreferences;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use std::sync::Arc;

/// Preferences repository trait
#[async_trait]
pub trait PreferencesRepository: Send + Sync {
    /// Get the preferences owned by a user, if any
    async fn get_by_user_id(&self, user_id: i64) -> Result<Option<UserPreferences>>;

    /// Create a preferences record; fails if the user already owns one
    async fn create(&self, prefs: &UserPreferences) -> Result<UserPreferences>;

    /// Update an existing preferences record
    async fn update(&self, prefs: &UserPreferences) -> Result<UserPreferences>;
}

/// SQLx-based preferences repository implementation
pub struct SqlxPreferencesRepository {
    pool: DbPool,
}

impl SqlxPreferencesRepository {
    /// Create a new SQLx preferences repository
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DbPool) -> Arc<dyn PreferencesRepository> {
        Arc::new(Self::new(pool))
    }
}

const SELECT_COLUMNS: &str = r#"
    id, user_id, gender, age, age_min, age_max, location, education, occupation,
    income, religion, smoking, drinking, exercise, relationship_type, children,
    pets, personality_type, hobbies, music_taste, movie_preference,
    communication_style, love_language, conflict_resolution, social_preference,
    travel_preference, food_preference, weekend_activity, financial_approach,
    future_goals, visual_test_completed, visual_preferences, basic_completed,
    text_completed, all_completed, created_at, updated_at
"#;

#[async_trait]
impl PreferencesRepository for SqlxPreferencesRepository {
    async fn get_by_user_id(&self, user_id: i64) -> Result<Option<UserPreferences>> {
        let sql = format!(
            "SELECT {} FROM user_preferences WHERE user_id = ?",
            SELECT_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get preferences by user ID")?;

        match row {
            Some(row) => Ok(Some(row_to_preferences(&row))),
            None => Ok(None),
        }
    }

    async fn create(&self, prefs: &UserPreferences) -> Result<UserPreferences> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO user_preferences
                (user_id, gender, age, age_min, age_max, location, education,
                 occupation, income, religion, smoking, drinking, exercise,
                 relationship_type, children, pets, personality_type, hobbies,
                 music_taste, movie_preference, communication_style, love_language,
                 conflict_resolution, social_preference, travel_preference,
                 food_preference, weekend_activity, financial_approach, future_goals,
                 visual_test_completed, visual_preferences, basic_completed,
                 text_completed, all_completed, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?,
                    ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(prefs.user_id)
        .bind(&prefs.gender)
        .bind(prefs.age)
        .bind(prefs.age_min)
        .bind(prefs.age_max)
        .bind(&prefs.location)
        .bind(&prefs.education)
        .bind(&prefs.occupation)
        .bind(&prefs.income)
        .bind(&prefs.religion)
        .bind(&prefs.smoking)
        .bind(&prefs.drinking)
        .bind(&prefs.exercise)
        .bind(&prefs.relationship_type)
        .bind(&prefs.children)
        .bind(&prefs.pets)
        .bind(&prefs.personality_type)
        .bind(&prefs.hobbies)
        .bind(&prefs.music_taste)
        .bind(&prefs.movie_preference)
        .bind(&prefs.communication_style)
        .bind(&prefs.love_language)
        .bind(&prefs.conflict_resolution)
        .bind(&prefs.social_preference)
        .bind(&prefs.travel_preference)
        .bind(&prefs.food_preference)
        .bind(&prefs.weekend_activity)
        .bind(&prefs.financial_approach)
        .bind(&prefs.future_goals)
        .bind(prefs.visual_test_completed)
        .bind(&prefs.visual_preferences)
        .bind(prefs.basic_completed)
        .bind(prefs.text_completed)
        .bind(prefs.all_completed)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to create preferences")?;

        let mut created = prefs.clone();
        created.id = result.last_insert_rowid();
        created.created_at = now;
        created.updated_at = now;
        Ok(created)
    }

    async fn update(&self, prefs: &UserPreferences) -> Result<UserPreferences> {
        let now = Utc::now();

        sqlx::query(
            r#"
            UPDATE user_preferences
            SET gender = ?, age = ?, age_min = ?, age_max = ?, location = ?,
                education = ?, occupation = ?, income = ?, religion = ?,
                smoking = ?, drinking = ?, exercise = ?, relationship_type = ?,
                children = ?, pets = ?, personality_type = ?, hobbies = ?,
                music_taste = ?, movie_preference = ?, communication_style = ?,
                love_language = ?, conflict_resolution = ?, social_preference = ?,
                travel_preference = ?, food_preference = ?, weekend_activity = ?,
                financial_approach = ?, future_goals = ?, visual_test_completed = ?,
                visual_preferences = ?, basic_completed = ?, text_completed = ?,
                all_completed = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&prefs.gender)
        .bind(prefs.age)
        .bind(prefs.age_min)
        .bind(prefs.age_max)
        .bind(&prefs.location)
        .bind(&prefs.education)
        .bind(&prefs.occupation)
        .bind(&prefs.income)
        .bind(&prefs.religion)
        .bind(&prefs.smoking)
        .bind(&prefs.drinking)
        .bind(&prefs.exercise)
        .bind(&prefs.relationship_type)
        .bind(&prefs.children)
        .bind(&prefs.pets)
        .bind(&prefs.personality_type)
        .bind(&prefs.hobbies)
        .bind(&prefs.music_taste)
        .bind(&prefs.movie_preference)
        .bind(&prefs.communication_style)
        .bind(&prefs.love_language)
        .bind(&prefs.conflict_resolution)
        .bind(&prefs.social_preference)
        .bind(&prefs.travel_preference)
        .bind(&prefs.food_preference)
        .bind(&prefs.weekend_activity)
        .bind(&prefs.financial_approach)
        .bind(&prefs.future_goals)
        .bind(prefs.visual_test_completed)
        .bind(&prefs.visual_preferences)
        .bind(prefs.basic_completed)
        .bind(prefs.text_completed)
        .bind(prefs.all_completed)
        .bind(now)
        .bind(prefs.id)
        .execute(&self.pool)
        .await
        .context("Failed to update preferences")?;

        self.get_by_user_id(prefs.user_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Preferences not found after update"))
    }
}

fn row_to_preferences(row: &sqlx::sqlite::SqliteRow) -> UserPreferences {
    UserPreferences {
        id: row.get("id"),
        user_id: row.get("user_id"),
        gender: row.get("gender"),
        age: row.get("age"),
        age_min: row.get("age_min"),
        age_max: row.get("age_max"),
        location: row.get("location"),
        education: row.get("education"),
        occupation: row.get("occupation"),
        income: row.get("income"),
        religion: row.get("religion"),
        smoking: row.get("smoking"),
        drinking: row.get("drinking"),
        exercise: row.get("exercise"),
        relationship_type: row.get("relationship_type"),
        children: row.get("children"),
        pets: row.get("pets"),
        personality_type: row.get("personality_type"),
        hobbies: row.get("hobbies"),
        music_taste: row.get("music_taste"),
        movie_preference: row.get("movie_preference"),
        communication_style: row.get("communication_style"),
        love_language: row.get("love_language"),
        conflict_resolution: row.get("conflict_resolution"),
        social_preference: row.get("social_preference"),
        travel_preference: row.get("travel_preference"),
        food_preference: row.get("food_preference"),
        weekend_activity: row.get("weekend_activity"),
        financial_approach: row.get("financial_approach"),
        future_goals: row.get("future_goals"),
        visual_test_completed: row.get("visual_test_completed"),
        visual_preferences: row.get("visual_preferences"),
        basic_completed: row.get("basic_completed"),
        text_completed: row.get("text_completed"),
        all_completed: row.get("all_completed"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}
