//! User repository
//!
//! Database operations for user accounts:
//! - `UserRepository` trait defining the interface for user data access
//! - `SqlxUserRepository` implementing the trait over SQLite

use crate::db::DbPool;
use crate::models::User;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use std::sync::Arc;

/// User repository trait
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a new user
    async fn create(&self, user: &User) -> Result<User>;

    /// Get user by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<User>>;

    /// Get user by email
    async fn get_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Update a user
    async fn update(&self, user: &User) -> Result<User>;

    /// List users with pagination and an optional active-state filter
    async fn list(&self, is_active: Option<bool>, offset: i64, limit: i64) -> Result<Vec<User>>;

    /// Count users matching the same filter as `list`
    async fn count(&self, is_active: Option<bool>) -> Result<i64>;
}

/// SQLx-based user repository implementation
pub struct SqlxUserRepository {
    pool: DbPool,
}

impl SqlxUserRepository {
    /// Create a new SQLx user repository
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DbPool) -> Arc<dyn UserRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl UserRepository for SqlxUserRepository {
    async fn create(&self, user: &User) -> Result<User> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO users (email, password_hash, is_active, is_superuser, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.is_active)
        .bind(user.is_superuser)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to create user")?;

        let id = result.last_insert_rowid();

        Ok(User {
            id,
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            is_active: user.is_active,
            is_superuser: user.is_superuser,
            created_at: now,
            updated_at: now,
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT id, email, password_hash, is_active, is_superuser, created_at, updated_at
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get user by ID")?;

        match row {
            Some(row) => Ok(Some(row_to_user(&row)?)),
            None => Ok(None),
        }
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT id, email, password_hash, is_active, is_superuser, created_at, updated_at
            FROM users
            WHERE email = ?
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get user by email")?;

        match row {
            Some(row) => Ok(Some(row_to_user(&row)?)),
            None => Ok(None),
        }
    }

    async fn update(&self, user: &User) -> Result<User> {
        let now = Utc::now();

        sqlx::query(
            r#"
            UPDATE users
            SET email = ?, password_hash = ?, is_active = ?, is_superuser = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.is_active)
        .bind(user.is_superuser)
        .bind(now)
        .bind(user.id)
        .execute(&self.pool)
        .await
        .context("Failed to update user")?;

        self.get_by_id(user.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("User not found after update"))
    }

    async fn list(&self, is_active: Option<bool>, offset: i64, limit: i64) -> Result<Vec<User>> {
        let mut sql = String::from(
            "SELECT id, email, password_hash, is_active, is_superuser, created_at, updated_at FROM users",
        );
        if is_active.is_some() {
            sql.push_str(" WHERE is_active = ?");
        }
        sql.push_str(" ORDER BY created_at DESC LIMIT ? OFFSET ?");

        let mut query = sqlx::query(&sql);
        if let Some(active) = is_active {
            query = query.bind(active);
        }
        let rows = query
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list users")?;

        let mut users = Vec::new();
        for row in rows {
            users.push(row_to_user(&row)?);
        }
        Ok(users)
    }

    async fn count(&self, is_active: Option<bool>) -> Result<i64> {
        let mut sql = String::from("SELECT COUNT(*) as count FROM users");
        if is_active.is_some() {
            sql.push_str(" WHERE is_active = ?");
        }

        let mut query = sqlx::query(&sql);
        if let Some(active) = is_active {
            query = query.bind(active);
        }
        let row = query
            .fetch_one(&self.pool)
            .await
            .context("Failed to count users")?;

        Ok(row.get("count"))
    }
}

fn row_to_user(row: &sqlx::sqlite::SqliteRow) -> Result<User> {
    Ok(User {
        id: row.get("id"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        is_active: row.get("is_active"),
        is_superuser: row.get("is_superuser"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};
    use crate::services::password::hash_password;

    async fn setup_test_repo() -> (DbPool, SqlxUserRepository) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let repo = SqlxUserRepository::new(pool.clone());
        (pool, repo)
    }

    fn test_user(email: &str) -> User {
        User::new(
            email.to_string(),
            hash_password("test_password").expect("Failed to hash password"),
        )
    }

    #[tokio::test]
    async fn test_create_user() {
        let (_pool, repo) = setup_test_repo().await;

        let created = repo
            .create(&test_user("test@example.com"))
            .await
            .expect("Failed to create user");

        assert!(created.id > 0);
        assert_eq!(created.email, "test@example.com");
        assert!(created.is_active);
        assert!(!created.is_superuser);
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let (_pool, repo) = setup_test_repo().await;

        let found = repo.get_by_id(999).await.expect("Failed to get user");
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_get_by_email() {
        let (_pool, repo) = setup_test_repo().await;
        repo.create(&test_user("findme@example.com"))
            .await
            .expect("Failed to create user");

        let found = repo
            .get_by_email("findme@example.com")
            .await
            .expect("Failed to get user")
            .expect("User not found");

        assert_eq!(found.email, "findme@example.com");
    }

    #[tokio::test]
    async fn test_update_user() {
        let (_pool, repo) = setup_test_repo().await;
        let mut created = repo
            .create(&test_user("update@example.com"))
            .await
            .expect("Failed to create user");

        created.is_active = false;
        created.is_superuser = true;

        let updated = repo.update(&created).await.expect("Failed to update user");
        assert!(!updated.is_active);
        assert!(updated.is_superuser);
    }

    #[tokio::test]
    async fn test_unique_email_constraint() {
        let (_pool, repo) = setup_test_repo().await;

        repo.create(&test_user("dup@example.com"))
            .await
            .expect("Failed to create first user");
        let result = repo.create(&test_user("dup@example.com")).await;

        assert!(result.is_err(), "Should fail due to duplicate email");
    }

    #[tokio::test]
    async fn test_list_and_count_with_filter() {
        let (_pool, repo) = setup_test_repo().await;

        repo.create(&test_user("a@example.com")).await.unwrap();
        repo.create(&test_user("b@example.com")).await.unwrap();
        let mut inactive = repo.create(&test_user("c@example.com")).await.unwrap();
        inactive.is_active = false;
        repo.update(&inactive).await.unwrap();

        let all = repo.list(None, 0, 10).await.expect("Failed to list");
        assert_eq!(all.len(), 3);
        assert_eq!(repo.count(None).await.unwrap(), 3);

        let active = repo.list(Some(true), 0, 10).await.expect("Failed to list");
        assert_eq!(active.len(), 2);
        assert_eq!(repo.count(Some(true)).await.unwrap(), 2);
        assert_eq!(repo.count(Some(false)).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_list_respects_pagination() {
        let (_pool, repo) = setup_test_repo().await;

        for i in 0..5 {
            repo.create(&test_user(&format!("user{}@example.com", i)))
                .await
                .unwrap();
        }

        let page = repo.list(None, 2, 2).await.expect("Failed to list");
        assert_eq!(page.len(), 2);
        // Count is independent of the pagination window
        assert_eq!(repo.count(None).await.unwrap(), 5);
    }
}
