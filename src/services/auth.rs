//! Auth service
//!
//! Implements registration, login and token-based identification.
//!
//! Every authentication failure (unknown email, wrong password, inactive
//! account, bad token) surfaces as the single `AuthenticationFailed`
//! variant so the boundary can never leak which check rejected the
//! request.

use crate::db::repositories::{PreferencesRepository, ProfileRepository, UserRepository};
use crate::models::{User, UserPreferences, UserProfile};
use crate::services::password::{hash_password, verify_password};
use crate::services::token::{AccessToken, TokenService};
use anyhow::Context;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Error types for auth service operations
#[derive(Debug, thiserror::Error)]
pub enum AuthServiceError {
    /// Uniform authentication failure; intentionally message-free
    #[error("Authentication failed")]
    AuthenticationFailed,

    /// Validation error (invalid input)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Email already registered
    #[error("User with this email already exists")]
    EmailTaken,

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Input for registering a new account.
///
/// The optional fields seed the profile and preferences records so the
/// post-registration setup flow starts pre-filled.
#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub date_of_birth: Option<DateTime<Utc>>,
    pub gender: Option<String>,
}

/// Input for logging in
#[derive(Debug, Clone)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// Auth service for account creation and credential checks
pub struct AuthService {
    user_repo: Arc<dyn UserRepository>,
    profile_repo: Arc<dyn ProfileRepository>,
    prefs_repo: Arc<dyn PreferencesRepository>,
    tokens: TokenService,
}

impl AuthService {
    /// Create a new auth service with the given repositories and token service
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        profile_repo: Arc<dyn ProfileRepository>,
        prefs_repo: Arc<dyn PreferencesRepository>,
        tokens: TokenService,
    ) -> Self {
        Self {
            user_repo,
            profile_repo,
            prefs_repo,
            tokens,
        }
    }

    /// Register a new account.
    ///
    /// # Errors
    ///
    /// - `ValidationError` on malformed email, weak password or a
    ///   password/confirmation mismatch
    /// - `EmailTaken` when the email is already registered
    pub async fn register(&self, input: RegisterInput) -> Result<User, AuthServiceError> {
        let email = sanitize_email(&input.email);

        if !is_valid_email(&email) {
            return Err(AuthServiceError::ValidationError(
                "Invalid email address".to_string(),
            ));
        }

        if input.password != input.confirm_password {
            return Err(AuthServiceError::ValidationError(
                "Passwords do not match".to_string(),
            ));
        }

        validate_password_strength(&input.password)?;

        if self
            .user_repo
            .get_by_email(&email)
            .await
            .context("Failed to check email")?
            .is_some()
        {
            return Err(AuthServiceError::EmailTaken);
        }

        let password_hash = hash_password(&input.password).context("Failed to hash password")?;

        let user = self
            .user_repo
            .create(&User::new(email, password_hash))
            .await
            .context("Failed to create user")?;

        self.seed_profile(&user, &input).await?;
        self.seed_preferences(&user, &input).await?;

        Ok(user)
    }

    /// Authenticate credentials and issue an access token.
    ///
    /// Returns the user together with the token. Unknown email, wrong
    /// password and inactive accounts are indistinguishable to the
    /// caller.
    pub async fn login(&self, input: LoginInput) -> Result<(User, AccessToken), AuthServiceError> {
        let email = sanitize_email(&input.email);

        let user = self
            .user_repo
            .get_by_email(&email)
            .await
            .context("Failed to look up user")?
            .ok_or(AuthServiceError::AuthenticationFailed)?;

        if !verify_password(&input.password, &user.password_hash) {
            return Err(AuthServiceError::AuthenticationFailed);
        }

        if !user.is_active {
            return Err(AuthServiceError::AuthenticationFailed);
        }

        let token = self
            .tokens
            .issue(&user.email)
            .map_err(|_| AuthServiceError::AuthenticationFailed)?;

        Ok((user, token))
    }

    /// Resolve a bearer token to its active account.
    pub async fn authenticate(&self, token: &str) -> Result<User, AuthServiceError> {
        let email = self
            .tokens
            .verify(token)
            .map_err(|_| AuthServiceError::AuthenticationFailed)?;

        let user = self
            .user_repo
            .get_by_email(&email)
            .await
            .context("Failed to look up user")?
            .ok_or(AuthServiceError::AuthenticationFailed)?;

        if !user.is_active {
            return Err(AuthServiceError::AuthenticationFailed);
        }

        Ok(user)
    }

    async fn seed_profile(
        &self,
        user: &User,
        input: &RegisterInput,
    ) -> Result<(), AuthServiceError> {
        if input.first_name.is_none()
            && input.last_name.is_none()
            && input.date_of_birth.is_none()
        {
            return Ok(());
        }

        let mut profile = UserProfile::empty(user.id);
        profile.first_name = input.first_name.clone();
        profile.last_name = input.last_name.clone();
        profile.date_of_birth = input.date_of_birth;

        self.profile_repo
            .create(&profile)
            .await
            .context("Failed to seed profile")?;
        Ok(())
    }

    async fn seed_preferences(
        &self,
        user: &User,
        input: &RegisterInput,
    ) -> Result<(), AuthServiceError> {
        let Some(ref gender) = input.gender else {
            return Ok(());
        };

        let mut prefs = UserPreferences::empty(user.id);
        prefs.gender = Some(gender.clone());

        self.prefs_repo
            .create(&prefs)
            .await
            .context("Failed to seed preferences")?;
        Ok(())
    }
}

/// Lowercase and trim an email address before any lookup or store.
pub fn sanitize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Minimal structural email check: one `@`, non-empty local part, and a
/// domain containing a dot with characters on both sides.
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };
    !host.is_empty() && tld.len() >= 2 && !email.contains(char::is_whitespace)
}

/// Enforce the password strength rules: 8..=100 characters with at least
/// one uppercase letter, one lowercase letter and one digit.
fn validate_password_strength(password: &str) -> Result<(), AuthServiceError> {
    let mut errors = Vec::new();

    if password.len() < 8 {
        errors.push("Password must be at least 8 characters long");
    }
    if password.len() > 100 {
        errors.push("Password must be less than 100 characters long");
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        errors.push("Password must contain at least one uppercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        errors.push("Password must contain at least one lowercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        errors.push("Password must contain at least one digit");
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(AuthServiceError::ValidationError(errors.join("; ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{
        SqlxPreferencesRepository, SqlxProfileRepository, SqlxUserRepository,
    };
    use crate::db::{create_test_pool, migrations};

    async fn setup() -> AuthService {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        AuthService::new(
            SqlxUserRepository::boxed(pool.clone()),
            SqlxProfileRepository::boxed(pool.clone()),
            SqlxPreferencesRepository::boxed(pool),
            TokenService::new("test-secret-that-is-long-enough", 30),
        )
    }

    fn register_input(email: &str) -> RegisterInput {
        RegisterInput {
            email: email.to_string(),
            password: "Str0ngPass".to_string(),
            confirm_password: "Str0ngPass".to_string(),
            first_name: None,
            last_name: None,
            date_of_birth: None,
            gender: None,
        }
    }

    #[tokio::test]
    async fn test_register_and_login() {
        let service = setup().await;

        let user = service
            .register(register_input("new@example.com"))
            .await
            .expect("Registration should succeed");
        assert_eq!(user.email, "new@example.com");
        assert!(user.is_active);
        assert_ne!(user.password_hash, "Str0ngPass");

        let (logged_in, token) = service
            .login(LoginInput {
                email: "new@example.com".to_string(),
                password: "Str0ngPass".to_string(),
            })
            .await
            .expect("Login should succeed");
        assert_eq!(logged_in.id, user.id);
        assert_eq!(token.token_type, "bearer");
    }

    #[tokio::test]
    async fn test_register_normalizes_email() {
        let service = setup().await;

        let user = service
            .register(register_input("  MiXeD@Example.COM "))
            .await
            .expect("Registration should succeed");
        assert_eq!(user.email, "mixed@example.com");
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let service = setup().await;

        service
            .register(register_input("dup@example.com"))
            .await
            .expect("First registration should succeed");

        let result = service.register(register_input("dup@example.com")).await;
        assert!(matches!(result, Err(AuthServiceError::EmailTaken)));
    }

    #[tokio::test]
    async fn test_register_password_mismatch() {
        let service = setup().await;

        let mut input = register_input("user@example.com");
        input.confirm_password = "Different1".to_string();

        let result = service.register(input).await;
        assert!(matches!(result, Err(AuthServiceError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_register_weak_password() {
        let service = setup().await;

        for weak in ["short1A", "nouppercase1", "NOLOWERCASE1", "NoDigitsHere"] {
            let mut input = register_input("weak@example.com");
            input.password = weak.to_string();
            input.confirm_password = weak.to_string();

            let result = service.register(input).await;
            assert!(
                matches!(result, Err(AuthServiceError::ValidationError(_))),
                "password {:?} should be rejected",
                weak
            );
        }
    }

    #[tokio::test]
    async fn test_register_invalid_email() {
        let service = setup().await;

        for bad in ["plainaddress", "@no-local.com", "user@nodot", "a b@c.de"] {
            let result = service.register(register_input(bad)).await;
            assert!(
                matches!(result, Err(AuthServiceError::ValidationError(_))),
                "email {:?} should be rejected",
                bad
            );
        }
    }

    #[tokio::test]
    async fn test_login_failures_are_uniform() {
        let service = setup().await;
        service
            .register(register_input("known@example.com"))
            .await
            .expect("Registration should succeed");

        // Unknown email
        let unknown = service
            .login(LoginInput {
                email: "unknown@example.com".to_string(),
                password: "Str0ngPass".to_string(),
            })
            .await;
        assert!(matches!(unknown, Err(AuthServiceError::AuthenticationFailed)));

        // Wrong password
        let wrong = service
            .login(LoginInput {
                email: "known@example.com".to_string(),
                password: "WrongPass1".to_string(),
            })
            .await;
        assert!(matches!(wrong, Err(AuthServiceError::AuthenticationFailed)));
    }

    #[tokio::test]
    async fn test_login_inactive_account_rejected() {
        let service = setup().await;
        let mut user = service
            .register(register_input("inactive@example.com"))
            .await
            .expect("Registration should succeed");

        user.is_active = false;
        service
            .user_repo
            .update(&user)
            .await
            .expect("Failed to deactivate");

        let result = service
            .login(LoginInput {
                email: "inactive@example.com".to_string(),
                password: "Str0ngPass".to_string(),
            })
            .await;
        assert!(matches!(result, Err(AuthServiceError::AuthenticationFailed)));
    }

    #[tokio::test]
    async fn test_authenticate_round_trip() {
        let service = setup().await;
        service
            .register(register_input("token@example.com"))
            .await
            .expect("Registration should succeed");

        let (_, token) = service
            .login(LoginInput {
                email: "token@example.com".to_string(),
                password: "Str0ngPass".to_string(),
            })
            .await
            .expect("Login should succeed");

        let user = service
            .authenticate(&token.access_token)
            .await
            .expect("Token should authenticate");
        assert_eq!(user.email, "token@example.com");

        let garbage = service.authenticate("garbage").await;
        assert!(matches!(garbage, Err(AuthServiceError::AuthenticationFailed)));
    }

    #[tokio::test]
    async fn test_register_seeds_profile_and_preferences() {
        let service = setup().await;

        let mut input = register_input("seeded@example.com");
        input.first_name = Some("Ada".to_string());
        input.last_name = Some("Lovelace".to_string());
        input.gender = Some("female".to_string());

        let user = service.register(input).await.expect("Registration should succeed");

        let profile = service
            .profile_repo
            .get_by_user_id(user.id)
            .await
            .expect("Failed to load profile")
            .expect("Profile should have been seeded");
        assert_eq!(profile.first_name.as_deref(), Some("Ada"));

        let prefs = service
            .prefs_repo
            .get_by_user_id(user.id)
            .await
            .expect("Failed to load preferences")
            .expect("Preferences should have been seeded");
        assert_eq!(prefs.gender.as_deref(), Some("female"));
        assert!(!prefs.all_completed);
    }

    #[tokio::test]
    async fn test_register_without_extras_seeds_nothing() {
        let service = setup().await;

        let user = service
            .register(register_input("bare@example.com"))
            .await
            .expect("Registration should succeed");

        assert!(service
            .profile_repo
            .get_by_user_id(user.id)
            .await
            .unwrap()
            .is_none());
        assert!(service
            .prefs_repo
            .get_by_user_id(user.id)
            .await
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_is_valid_email() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("first.last+tag@sub.example.org"));
        assert!(!is_valid_email("user@@example.com"));
        assert!(!is_valid_email("user@.xy"));
    }
}
