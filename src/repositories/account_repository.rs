use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::account::Account;
use crate::repositories::{RepositoryError, Scope, ScopedLookup};

const ACCOUNT_COLUMNS: &str = "id, user_id, name, currency, is_archived, created_at, updated_at";

/// Trait defining account repository operations
#[async_trait]
pub trait AccountRepository: ScopedLookup<Account> {
    /// Insert a new account; a taken (user, name) pair is a constraint violation
    async fn create(&self, account: Account) -> Result<Account, RepositoryError>;

    /// Whether the user already has an account with exactly this name
    async fn exists_with_name(&self, user_id: Uuid, name: &str) -> Result<bool, RepositoryError>;

    /// Non-archived accounts of a user, ordered by name (ordinal)
    async fn list_active(&self, user_id: Uuid) -> Result<Vec<Account>, RepositoryError>;
}

/// PostgreSQL implementation of AccountRepository
pub struct PostgresAccountRepository {
    pool: PgPool,
}

impl PostgresAccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ScopedLookup<Account> for PostgresAccountRepository {
    async fn find_owned(
        &self,
        id: Uuid,
        user_id: Uuid,
        scope: Scope,
    ) -> Result<Option<Account>, RepositoryError> {
        let sql = format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts \
             WHERE id = $1 AND user_id = $2 AND ($3 = FALSE OR is_archived = FALSE)"
        );

        let account = sqlx::query_as::<_, Account>(&sql)
            .bind(id)
            .bind(user_id)
            .bind(scope == Scope::Active)
            .fetch_optional(&self.pool)
            .await?;

        Ok(account)
    }
}

#[async_trait]
impl AccountRepository for PostgresAccountRepository {
    async fn create(&self, account: Account) -> Result<Account, RepositoryError> {
        let sql = format!(
            "INSERT INTO accounts (id, user_id, name, currency, is_archived, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {ACCOUNT_COLUMNS}"
        );

        let created = sqlx::query_as::<_, Account>(&sql)
            .bind(account.id)
            .bind(account.user_id)
            .bind(&account.name)
            .bind(&account.currency)
            .bind(account.is_archived)
            .bind(account.created_at)
            .bind(account.updated_at)
            .fetch_one(&self.pool)
            .await?;

        Ok(created)
    }

    async fn exists_with_name(&self, user_id: Uuid, name: &str) -> Result<bool, RepositoryError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM accounts WHERE user_id = $1 AND name = $2)",
        )
        .bind(user_id)
        .bind(name)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn list_active(&self, user_id: Uuid) -> Result<Vec<Account>, RepositoryError> {
        let sql = format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts \
             WHERE user_id = $1 AND is_archived = FALSE \
             ORDER BY name COLLATE \"C\" ASC"
        );

        let accounts = sqlx::query_as::<_, Account>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(accounts)
    }
}
