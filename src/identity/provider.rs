use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AppError;

/// Identity store errors
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("Identity store error: {0}")]
    Store(String),

    #[error("Password hashing failed: {0}")]
    Hashing(String),
}

impl From<sqlx::Error> for IdentityError {
    fn from(err: sqlx::Error) -> Self {
        IdentityError::Store(err.to_string())
    }
}

impl From<IdentityError> for AppError {
    fn from(err: IdentityError) -> Self {
        AppError::Internal(err.to_string())
    }
}

/// Result of a registration attempt; `errors` lists every rejected rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateUserOutcome {
    pub succeeded: bool,
    pub user_id: Option<Uuid>,
    pub errors: Vec<String>,
}

impl CreateUserOutcome {
    pub fn success(user_id: Uuid) -> Self {
        Self {
            succeeded: true,
            user_id: Some(user_id),
            errors: Vec::new(),
        }
    }

    pub fn failed(errors: Vec<String>) -> Self {
        Self {
            succeeded: false,
            user_id: None,
            errors,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub user_id: Uuid,
    pub user_name: String,
    pub email: Option<String>,
}

/// Trait defining identity provider operations
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Register a user; rule violations are reported in the outcome, not as errors
    async fn create_user(
        &self,
        email: &str,
        user_name: Option<&str>,
        password: &str,
    ) -> Result<CreateUserOutcome, IdentityError>;

    /// Id of the user when the email exists and the password matches
    async fn validate_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<Uuid>, IdentityError>;

    /// Roles granted to the user; empty for unknown users
    async fn get_roles(&self, user_id: Uuid) -> Result<Vec<String>, IdentityError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<UserProfile>, IdentityError>;
}

/// Lookup key for emails and user names
pub fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

/// The display name falls back to the email when none is given
pub fn display_name(email: &str, user_name: Option<&str>) -> String {
    match user_name.map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => email.trim().to_string(),
    }
}

/// Password rules beyond the request's length check
pub fn password_policy_errors(password: &str) -> Vec<String> {
    let mut errors = Vec::new();
    if !password.chars().any(|c| c.is_ascii_digit()) {
        errors.push("Passwords must have at least one digit ('0'-'9').".to_string());
    }
    if !password.chars().any(char::is_alphabetic) {
        errors.push("Passwords must have at least one letter.".to_string());
    }
    errors
}

pub fn email_taken(email: &str) -> String {
    format!("Email '{}' is already taken.", email.trim())
}

pub fn user_name_taken(user_name: &str) -> String {
    format!("Username '{}' is already taken.", user_name)
}

/// Hash a password with bcrypt on the blocking pool
pub async fn hash_password(password: &str, cost: u32) -> Result<String, IdentityError> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| IdentityError::Hashing(e.to_string()))?
        .map_err(|e| IdentityError::Hashing(e.to_string()))
}

/// Verify a password against a bcrypt hash on the blocking pool
pub async fn verify_password(password: &str, hash: &str) -> Result<bool, IdentityError> {
    let password = password.to_string();
    let hash = hash.to_string();
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| IdentityError::Hashing(e.to_string()))?
        .map_err(|e| IdentityError::Hashing(e.to_string()))
}
