use async_trait::async_trait;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::identity::provider::{
    CreateUserOutcome, IdentityError, IdentityProvider, UserProfile, display_name, email_taken,
    hash_password, normalize, password_policy_errors, user_name_taken, verify_password,
};

/// Lowest cost bcrypt accepts
pub const FAST_BCRYPT_COST: u32 = 4;

#[derive(Debug, Clone)]
struct StoredUser {
    id: Uuid,
    user_name: String,
    email: String,
    password_hash: String,
    roles: Vec<String>,
}

/// Process-local identity provider, for tests and database-less runs
pub struct InMemoryIdentityProvider {
    users: Mutex<Vec<StoredUser>>,
    bcrypt_cost: u32,
}

impl Default for InMemoryIdentityProvider {
    fn default() -> Self {
        Self::with_cost(FAST_BCRYPT_COST)
    }
}

impl InMemoryIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cost(bcrypt_cost: u32) -> Self {
        Self {
            users: Mutex::new(Vec::new()),
            bcrypt_cost,
        }
    }

    /// Attach a role to an existing user
    pub fn grant_role(&self, user_id: Uuid, role: &str) -> Result<(), IdentityError> {
        let mut users = self.lock()?;
        if let Some(user) = users.iter_mut().find(|u| u.id == user_id) {
            if !user.roles.iter().any(|r| r == role) {
                user.roles.push(role.to_string());
                user.roles.sort();
            }
        }
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<StoredUser>>, IdentityError> {
        self.users
            .lock()
            .map_err(|_| IdentityError::Store("in-memory identity store poisoned".to_string()))
    }

    fn find(&self, email: &str) -> Result<Option<StoredUser>, IdentityError> {
        let key = normalize(email);
        Ok(self
            .lock()?
            .iter()
            .find(|u| normalize(&u.email) == key)
            .cloned())
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    async fn create_user(
        &self,
        email: &str,
        user_name: Option<&str>,
        password: &str,
    ) -> Result<CreateUserOutcome, IdentityError> {
        let user_name = display_name(email, user_name);
        let mut errors = password_policy_errors(password);
        {
            let users = self.lock()?;
            if users
                .iter()
                .any(|u| normalize(&u.user_name) == normalize(&user_name))
            {
                errors.push(user_name_taken(&user_name));
            }
            if users.iter().any(|u| normalize(&u.email) == normalize(email)) {
                errors.push(email_taken(email));
            }
        }
        if !errors.is_empty() {
            return Ok(CreateUserOutcome::failed(errors));
        }

        let password_hash = hash_password(password, self.bcrypt_cost).await?;
        let user = StoredUser {
            id: Uuid::new_v4(),
            user_name,
            email: email.trim().to_string(),
            password_hash,
            roles: Vec::new(),
        };

        let mut users = self.lock()?;
        if users.iter().any(|u| normalize(&u.email) == normalize(email)) {
            return Ok(CreateUserOutcome::failed(vec![email_taken(email)]));
        }
        let id = user.id;
        users.push(user);
        Ok(CreateUserOutcome::success(id))
    }

    async fn validate_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<Uuid>, IdentityError> {
        let Some(user) = self.find(email)? else {
            return Ok(None);
        };

        let valid = verify_password(password, &user.password_hash).await?;
        Ok(valid.then_some(user.id))
    }

    async fn get_roles(&self, user_id: Uuid) -> Result<Vec<String>, IdentityError> {
        Ok(self
            .lock()?
            .iter()
            .find(|u| u.id == user_id)
            .map(|u| u.roles.clone())
            .unwrap_or_default())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserProfile>, IdentityError> {
        Ok(self.find(email)?.map(|user| UserProfile {
            user_id: user.id,
            user_name: user.user_name,
            email: Some(user.email),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_and_validate() {
        let provider = InMemoryIdentityProvider::new();
        let outcome = provider
            .create_user("Ann@Example.com", Some("ann"), "password123")
            .await
            .unwrap();
        assert!(outcome.succeeded);
        let user_id = outcome.user_id.unwrap();

        assert_eq!(
            provider
                .validate_credentials("ann@example.com", "password123")
                .await
                .unwrap(),
            Some(user_id)
        );
        assert_eq!(
            provider
                .validate_credentials("ann@example.com", "wrong_password1")
                .await
                .unwrap(),
            None
        );
        assert_eq!(
            provider
                .validate_credentials("nobody@example.com", "password123")
                .await
                .unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn test_duplicate_registration_reports_every_reason() {
        let provider = InMemoryIdentityProvider::new();
        provider
            .create_user("ann@example.com", None, "password123")
            .await
            .unwrap();

        let outcome = provider
            .create_user("ann@example.com", None, "password123")
            .await
            .unwrap();
        assert!(!outcome.succeeded);
        assert_eq!(outcome.user_id, None);
        assert_eq!(
            outcome.errors,
            vec![
                "Username 'ann@example.com' is already taken.".to_string(),
                "Email 'ann@example.com' is already taken.".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_roles_and_profile() {
        let provider = InMemoryIdentityProvider::new();
        let user_id = provider
            .create_user("ann@example.com", None, "password123")
            .await
            .unwrap()
            .user_id
            .unwrap();

        assert!(provider.get_roles(user_id).await.unwrap().is_empty());
        provider.grant_role(user_id, "Admin").unwrap();
        assert_eq!(provider.get_roles(user_id).await.unwrap(), vec!["Admin"]);
        assert!(provider.get_roles(Uuid::new_v4()).await.unwrap().is_empty());

        let profile = provider.find_by_email("ANN@example.com").await.unwrap().unwrap();
        assert_eq!(profile.user_id, user_id);
        assert_eq!(profile.user_name, "ann@example.com");
        assert_eq!(profile.email.as_deref(), Some("ann@example.com"));
    }
}
