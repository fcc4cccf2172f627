use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::identity::provider::{
    CreateUserOutcome, IdentityError, IdentityProvider, UserProfile, display_name, email_taken,
    hash_password, normalize, password_policy_errors, user_name_taken, verify_password,
};

const USER_NAME_UNIQUE: &str = "users_normalized_user_name_key";

/// Reason reported when an insert loses a race on one of the users unique indexes
fn taken_reason(constraint: Option<&str>, email: &str, user_name: &str) -> String {
    match constraint {
        Some(USER_NAME_UNIQUE) => user_name_taken(user_name),
        _ => email_taken(email),
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UserRecord {
    id: Uuid,
    user_name: String,
    email: String,
    password_hash: String,
}

/// PostgreSQL implementation of IdentityProvider, storing bcrypt hashes
pub struct PostgresIdentityProvider {
    pool: PgPool,
    bcrypt_cost: u32,
}

impl PostgresIdentityProvider {
    pub fn new(pool: PgPool, bcrypt_cost: u32) -> Self {
        Self { pool, bcrypt_cost }
    }

    async fn find_record(&self, email: &str) -> Result<Option<UserRecord>, IdentityError> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT id, user_name, email, password_hash FROM users WHERE normalized_email = $1",
        )
        .bind(normalize(email))
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }
}

#[async_trait]
impl IdentityProvider for PostgresIdentityProvider {
    async fn create_user(
        &self,
        email: &str,
        user_name: Option<&str>,
        password: &str,
    ) -> Result<CreateUserOutcome, IdentityError> {
        let user_name = display_name(email, user_name);
        let mut errors = password_policy_errors(password);

        let user_name_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM users WHERE normalized_user_name = $1)",
        )
        .bind(normalize(&user_name))
        .fetch_one(&self.pool)
        .await?;
        if user_name_exists {
            errors.push(user_name_taken(&user_name));
        }
        if self.find_record(email).await?.is_some() {
            errors.push(email_taken(email));
        }
        if !errors.is_empty() {
            return Ok(CreateUserOutcome::failed(errors));
        }

        let password_hash = hash_password(password, self.bcrypt_cost).await?;
        let id = Uuid::new_v4();

        let result = sqlx::query(
            "INSERT INTO users \
                (id, email, normalized_email, user_name, normalized_user_name, password_hash, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(id)
        .bind(email.trim())
        .bind(normalize(email))
        .bind(&user_name)
        .bind(normalize(&user_name))
        .bind(&password_hash)
        .bind(Utc::now())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(CreateUserOutcome::success(id)),
            // Lost a race against a concurrent registration
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Ok(CreateUserOutcome::failed(vec![taken_reason(
                    db_err.constraint(),
                    email,
                    &user_name,
                )]))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn validate_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<Uuid>, IdentityError> {
        let Some(record) = self.find_record(email).await? else {
            return Ok(None);
        };

        let valid = verify_password(password, &record.password_hash).await?;
        Ok(valid.then_some(record.id))
    }

    async fn get_roles(&self, user_id: Uuid) -> Result<Vec<String>, IdentityError> {
        let roles = sqlx::query_scalar::<_, String>(
            "SELECT role FROM user_roles WHERE user_id = $1 ORDER BY role",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(roles)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserProfile>, IdentityError> {
        Ok(self.find_record(email).await?.map(|record| UserProfile {
            user_id: record.id,
            user_name: record.user_name,
            email: Some(record.email),
        }))
    }
}
