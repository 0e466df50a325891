//! User service
//!
//! Implements business logic for account and profile management:
//! - lookup and paginated listing
//! - partial updates with email-conflict checks
//! - soft deletion (accounts are deactivated, never removed)
//! - password changes (self only)
//! - lazy profile creation and the profile completeness report

use crate::db::repositories::{ProfileRepository, UserRepository};
use crate::models::{ListParams, PagedResult, ProfilePatch, UpdateUserInput, User, UserProfile};
use crate::services::completion::{evaluate_profile, ProfileStatus};
use crate::services::password::{hash_password, verify_password};
use anyhow::Context;
use std::sync::Arc;

/// Error types for user service operations
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    /// User not found
    #[error("User not found")]
    NotFound,

    /// Caller lacks permission for the operation
    #[error("Not enough permissions")]
    Forbidden,

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Email already taken by another account
    #[error("Email already taken")]
    EmailTaken,

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// User service for account management
pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
    profile_repo: Arc<dyn ProfileRepository>,
}

impl UserService {
    /// Create a new user service with the given repositories
    pub fn new(user_repo: Arc<dyn UserRepository>, profile_repo: Arc<dyn ProfileRepository>) -> Self {
        Self {
            user_repo,
            profile_repo,
        }
    }

    /// Get a user by id.
    pub async fn get(&self, id: i64) -> Result<User, UserServiceError> {
        self.user_repo
            .get_by_id(id)
            .await
            .context("Failed to get user")?
            .ok_or(UserServiceError::NotFound)
    }

    /// List users with pagination and an optional active-state filter.
    ///
    /// The total is established by a separate count query over the same
    /// filter, so it is independent of the pagination window.
    pub async fn list(
        &self,
        is_active: Option<bool>,
        params: &ListParams,
    ) -> Result<PagedResult<User>, UserServiceError> {
        let users = self
            .user_repo
            .list(is_active, params.offset(), params.limit())
            .await
            .context("Failed to list users")?;
        let total = self
            .user_repo
            .count(is_active)
            .await
            .context("Failed to count users")?;

        Ok(PagedResult::new(users, total, params))
    }

    /// Update a user's account fields.
    ///
    /// Owner or superuser only. An email change is rejected when another
    /// account already holds the new address.
    pub async fn update(
        &self,
        id: i64,
        input: UpdateUserInput,
        current: &User,
    ) -> Result<User, UserServiceError> {
        let mut user = self.get(id).await?;

        if !current.can_modify(user.id) {
            return Err(UserServiceError::Forbidden);
        }

        if let Some(ref new_email) = input.email {
            let new_email = new_email.trim().to_lowercase();
            if new_email != user.email {
                if let Some(existing) = self
                    .user_repo
                    .get_by_email(&new_email)
                    .await
                    .context("Failed to check email")?
                {
                    if existing.id != id {
                        return Err(UserServiceError::EmailTaken);
                    }
                }
            }
        }

        if !input.has_changes() {
            return Ok(user);
        }

        input.apply(&mut user);
        user.email = user.email.trim().to_lowercase();

        self.user_repo
            .update(&user)
            .await
            .context("Failed to update user")
            .map_err(Into::into)
    }

    /// Soft-delete a user: the account is marked inactive, the row stays.
    ///
    /// Superuser only; deleting the own account is rejected.
    pub async fn soft_delete(&self, id: i64, current: &User) -> Result<(), UserServiceError> {
        if !current.is_superuser {
            return Err(UserServiceError::Forbidden);
        }
        if id == current.id {
            return Err(UserServiceError::ValidationError(
                "Cannot delete your own account".to_string(),
            ));
        }

        let mut user = self.get(id).await?;
        user.is_active = false;

        self.user_repo
            .update(&user)
            .await
            .context("Failed to deactivate user")?;
        Ok(())
    }

    /// Change a user's password.
    ///
    /// Self only, even for superusers; the current password must verify.
    pub async fn change_password(
        &self,
        id: i64,
        current_password: &str,
        new_password: &str,
        current: &User,
    ) -> Result<(), UserServiceError> {
        if id != current.id {
            return Err(UserServiceError::Forbidden);
        }

        let mut user = self.get(id).await?;

        if !verify_password(current_password, &user.password_hash) {
            return Err(UserServiceError::ValidationError(
                "Current password is incorrect".to_string(),
            ));
        }

        if new_password.len() < 8 {
            return Err(UserServiceError::ValidationError(
                "Password must be at least 8 characters long".to_string(),
            ));
        }

        user.password_hash = hash_password(new_password).context("Failed to hash password")?;

        self.user_repo
            .update(&user)
            .await
            .context("Failed to update password")?;
        Ok(())
    }

    /// Get a user's profile.
    ///
    /// A user who has never saved a profile gets an empty scaffold so
    /// callers always see the full field set.
    pub async fn get_profile(&self, user_id: i64) -> Result<UserProfile, UserServiceError> {
        // Ensure the user exists before synthesizing a scaffold
        self.get(user_id).await?;

        let profile = self
            .profile_repo
            .get_by_user_id(user_id)
            .await
            .context("Failed to get profile")?;

        Ok(profile.unwrap_or_else(|| UserProfile::empty(user_id)))
    }

    /// Update a user's profile, creating it lazily on first write.
    ///
    /// Owner or superuser only.
    pub async fn update_profile(
        &self,
        user_id: i64,
        patch: ProfilePatch,
        current: &User,
    ) -> Result<UserProfile, UserServiceError> {
        if !current.can_modify(user_id) {
            return Err(UserServiceError::Forbidden);
        }

        self.get(user_id).await?;

        let existing = self
            .profile_repo
            .get_by_user_id(user_id)
            .await
            .context("Failed to get profile")?;

        match existing {
            Some(mut profile) => {
                if !patch.has_changes() {
                    return Ok(profile);
                }
                patch.apply(&mut profile);
                self.profile_repo
                    .update(&profile)
                    .await
                    .context("Failed to update profile")
                    .map_err(Into::into)
            }
            None => {
                let mut profile = UserProfile::empty(user_id);
                patch.apply(&mut profile);
                self.profile_repo
                    .create(&profile)
                    .await
                    .context("Failed to create profile")
                    .map_err(Into::into)
            }
        }
    }

    /// Evaluate the profile completeness of a user.
    pub async fn profile_status(&self, user_id: i64) -> Result<ProfileStatus, UserServiceError> {
        let profile = self
            .profile_repo
            .get_by_user_id(user_id)
            .await
            .context("Failed to get profile")?;

        Ok(evaluate_profile(profile.as_ref()))
    }
}
