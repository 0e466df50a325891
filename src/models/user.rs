//! User model
//!
//! Defines the User entity and its update input. Identity (the id and the
//! creation timestamp) is immutable once created; the email must stay
//! unique across all accounts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User entity representing a registered account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier
    pub id: i64,
    /// Email address (unique)
    pub email: String,
    /// Password hash (argon2)
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Whether the account can log in; soft delete clears this
    pub is_active: bool,
    /// Whether the account holds administrative privileges
    pub is_superuser: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new User with the given email and password hash.
    ///
    /// The password must already be hashed; use
    /// `services::password::hash_password()`.
    pub fn new(email: String, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: 0, // Will be set by the database
            email,
            password_hash,
            is_active: true,
            is_superuser: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if the user may modify a record owned by `owner_id`.
    ///
    /// Superusers can modify anything; everyone else only their own.
    pub fn can_modify(&self, owner_id: i64) -> bool {
        self.is_superuser || self.id == owner_id
    }
}

/// Input for updating a user; every field is optional and only the
/// present fields are applied.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUserInput {
    /// New email (optional, must stay unique)
    pub email: Option<String>,
    /// New active flag (optional)
    pub is_active: Option<bool>,
    /// New superuser flag (optional)
    pub is_superuser: Option<bool>,
}

impl UpdateUserInput {
    /// Check if any field is set
    pub fn has_changes(&self) -> bool {
        self.email.is_some() || self.is_active.is_some() || self.is_superuser.is_some()
    }

    /// Apply the present fields onto the user, field by field.
    pub fn apply(&self, user: &mut User) {
        if let Some(ref email) = self.email {
            user.email = email.clone();
        }
        if let Some(is_active) = self.is_active {
            user.is_active = is_active;
        }
        if let Some(is_superuser) = self.is_superuser {
            user.is_superuser = is_superuser;
        }
    }
}
