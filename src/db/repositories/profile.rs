//! User profile repository

use crate::db::DbPool;
use crate::models::UserProfile;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use std::sync::Arc;

/// Profile repository trait
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Get the profile owned by a user, if one has been created
    async fn get_by_user_id(&self, user_id: i64) -> Result<Option<UserProfile>>;

    /// Create a profile; fails if the user already owns one
    async fn create(&self, profile: &UserProfile) -> Result<UserProfile>;

    /// Update an existing profile
    async fn update(&self, profile: &UserProfile) -> Result<UserProfile>;
}

/// SQLx-based profile repository implementation
pub struct SqlxProfileRepository {
    pool: DbPool,
}

impl SqlxProfileRepository {
    /// Create a new SQLx profile repository
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DbPool) -> Arc<dyn ProfileRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ProfileRepository for SqlxProfileRepository {
    async fn get_by_user_id(&self, user_id: i64) -> Result<Option<UserProfile>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, first_name, last_name, bio, avatar_url, phone,
                   date_of_birth, location, website, created_at, updated_at
            FROM user_profiles
            WHERE user_id = ?
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get profile by user ID")?;

        match row {
            Some(row) => Ok(Some(row_to_profile(&row))),
            None => Ok(None),
        }
    }

    async fn create(&self, profile: &UserProfile) -> Result<UserProfile> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO user_profiles
                (user_id, first_name, last_name, bio, avatar_url, phone,
                 date_of_birth, location, website, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(profile.user_id)
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(&profile.bio)
        .bind(&profile.avatar_url)
        .bind(&profile.phone)
        .bind(profile.date_of_birth)
        .bind(&profile.location)
        .bind(&profile.website)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to create profile")?;

        let mut created = profile.clone();
        created.id = result.last_insert_rowid();
        created.created_at = now;
        created.updated_at = now;
        Ok(created)
    }

    async fn update(&self, profile: &UserProfile) -> Result<UserProfile> {
        let now = Utc::now();

        sqlx::query(
            r#"
            UPDATE user_profiles
            SET first_name = ?, last_name = ?, bio = ?, avatar_url = ?, phone = ?,
                date_of_birth = ?, location = ?, website = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(&profile.bio)
        .bind(&profile.avatar_url)
        .bind(&profile.phone)
        .bind(profile.date_of_birth)
        .bind(&profile.location)
        .bind(&profile.website)
        .bind(now)
        .bind(profile.id)
        .execute(&self.pool)
        .await
        .context("Failed to update profile")?;

        self.get_by_user_id(profile.user_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Profile not found after update"))
    }
}

fn row_to_profile(row: &sqlx::sqlite::SqliteRow) -> UserProfile {
    UserProfile {
        id: row.get("id"),
        user_id: row.get("user_id"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        bio: row.get("bio"),
        avatar_url: row.get("avatar_url"),
        phone: row.get("phone"),
        date_of_birth: row.get("date_of_birth"),
        location: row.get("location"),
        website: row.get("website"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxUserRepository, UserRepository};
    use crate::db::{create_test_pool, migrations};
    use crate::models::User;

    async fn setup() -> (DbPool, SqlxProfileRepository, i64) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let users = SqlxUserRepository::new(pool.clone());
        let user = users
            .create(&User::new("owner@example.com".to_string(), "hash".to_string()))
            .await
            .expect("Failed to create user");

        (pool.clone(), SqlxProfileRepository::new(pool), user.id)
    }

    #[tokio::test]
    async fn test_get_missing_profile() {
        let (_pool, repo, user_id) = setup().await;

        let found = repo.get_by_user_id(user_id).await.expect("Failed to query");
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_create_and_get_profile() {
        let (_pool, repo, user_id) = setup().await;

        let mut profile = UserProfile::empty(user_id);
        profile.first_name = Some("Ada".to_string());
        profile.bio = Some("Engineer".to_string());

        let created = repo.create(&profile).await.expect("Failed to create profile");
        assert!(created.id > 0);

        let found = repo
            .get_by_user_id(user_id)
            .await
            .expect("Failed to query")
            .expect("Profile not found");
        assert_eq!(found.first_name.as_deref(), Some("Ada"));
        assert_eq!(found.bio.as_deref(), Some("Engineer"));
    }

    #[tokio::test]
    async fn test_update_profile() {
        let (_pool, repo, user_id) = setup().await;

        let mut profile = repo
            .create(&UserProfile::empty(user_id))
            .await
            .expect("Failed to create profile");

        profile.avatar_url = Some("https://example.com/a.png".to_string());
        let updated = repo.update(&profile).await.expect("Failed to update profile");

        assert_eq!(
            updated.avatar_url.as_deref(),
            Some("https://example.com/a.png")
        );
    }

    #[tokio::test]
    async fn test_one_profile_per_user() {
        let (_pool, repo, user_id) = setup().await;

        repo.create(&UserProfile::empty(user_id))
            .await
            .expect("First profile should succeed");
        let result = repo.create(&UserProfile::empty(user_id)).await;

        assert!(result.is_err(), "Second profile for same user should fail");
    }
}
