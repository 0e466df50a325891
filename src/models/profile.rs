//! User profile model
//!
//! Optional extension of a user account. Created lazily on first update;
//! at most one profile per user, enforced by a uniqueness constraint on
//! `user_id`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Profile entity holding the optional personal fields of a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    /// Unique identifier
    pub id: i64,
    /// Owning user (unique)
    pub user_id: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub phone: Option<String>,
    pub date_of_birth: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub website: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    /// Create an empty profile scaffold for the given user.
    ///
    /// Used both when lazily creating a profile on first update and when
    /// rendering an empty profile for a user who has never saved one.
    pub fn empty(user_id: i64) -> Self {
        let now = Utc::now();
        Self {
            id: 0, // Will be set by the database
            user_id,
            first_name: None,
            last_name: None,
            bio: None,
            avatar_url: None,
            phone: None,
            date_of_birth: None,
            location: None,
            website: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Patch for a profile; only present fields are applied.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfilePatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub phone: Option<String>,
    pub date_of_birth: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub website: Option<String>,
}

impl ProfilePatch {
    /// Check if any field is set
    pub fn has_changes(&self) -> bool {
        self.first_name.is_some()
            || self.last_name.is_some()
            || self.bio.is_some()
            || self.avatar_url.is_some()
            || self.phone.is_some()
            || self.date_of_birth.is_some()
            || self.location.is_some()
            || self.website.is_some()
    }

    /// Apply the present fields onto the profile, field by field.
    pub fn apply(&self, profile: &mut UserProfile) {
        if let Some(ref v) = self.first_name {
            profile.first_name = Some(v.clone());
        }
        if let Some(ref v) = self.last_name {
            profile.last_name = Some(v.clone());
        }
        if let Some(ref v) = self.bio {
            profile.bio = Some(v.clone());
        }
        if let Some(ref v) = self.avatar_url {
            profile.avatar_url = Some(v.clone());
        }
        if let Some(ref v) = self.phone {
            profile.phone = Some(v.clone());
        }
        if let Some(v) = self.date_of_birth {
            profile.date_of_birth = Some(v);
        }
        if let Some(ref v) = self.location {
            profile.location = Some(v.clone());
        }
        if let Some(ref v) = self.website {
            profile.website = Some(v.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_profile() {
        let profile = UserProfile::empty(42);
        assert_eq!(profile.user_id, 42);
        assert!(profile.first_name.is_none());
        assert!(profile.bio.is_none());
    }

    #[test]
    fn test_patch_apply_partial() {
        let mut profile = UserProfile::empty(1);
        profile.last_name = Some("Existing".to_string());

        let patch = ProfilePatch {
            first_name: Some("Ada".to_string()),
            bio: Some("Engineer".to_string()),
            ..Default::default()
        };
        assert!(patch.has_changes());

        patch.apply(&mut profile);
        assert_eq!(profile.first_name.as_deref(), Some("Ada"));
        assert_eq!(profile.bio.as_deref(), Some("Engineer"));
        // Fields absent from the patch are untouched
        assert_eq!(profile.last_name.as_deref(), Some("Existing"));
    }

    #[test]
    fn test_empty_patch_has_no_changes() {
        assert!(!ProfilePatch::default().has_changes());
    }
}
