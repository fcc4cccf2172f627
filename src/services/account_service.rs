use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::account::{Account, AccountDto, CreateAccountRequest};
use crate::repositories::{AccountRepository, RepositoryError};
use crate::services::cancellable;
use crate::validation::validate_request;

pub const ACCOUNT_NAME_TAKEN: &str = "AccountWithTheSameNameExists";

/// Trait defining account service operations
#[async_trait]
pub trait AccountService: Send + Sync {
    /// Create an account for the user; names are unique per user
    async fn create(
        &self,
        user_id: Uuid,
        request: CreateAccountRequest,
        cancel: &CancellationToken,
    ) -> Result<AccountDto, AppError>;

    /// Non-archived accounts of the user, ordered by name
    async fn list(
        &self,
        user_id: Uuid,
        cancel: &CancellationToken,
    ) -> Result<Vec<AccountDto>, AppError>;
}

/// Implementation of AccountService
pub struct AccountServiceImpl {
    account_repository: Arc<dyn AccountRepository>,
}

impl AccountServiceImpl {
    pub fn new(account_repository: Arc<dyn AccountRepository>) -> Self {
        Self { account_repository }
    }
}

fn name_taken(err: RepositoryError) -> AppError {
    match err {
        RepositoryError::ConstraintViolation(_) => AppError::Conflict(ACCOUNT_NAME_TAKEN.to_string()),
        other => other.into(),
    }
}

#[async_trait]
impl AccountService for AccountServiceImpl {
    async fn create(
        &self,
        user_id: Uuid,
        request: CreateAccountRequest,
        cancel: &CancellationToken,
    ) -> Result<AccountDto, AppError> {
        validate_request(&request)?;

        let name = request.name.trim().to_string();
        if cancellable(cancel, self.account_repository.exists_with_name(user_id, &name)).await?? {
            return Err(AppError::Conflict(ACCOUNT_NAME_TAKEN.to_string()));
        }

        let now = Utc::now();
        let account = Account {
            id: Uuid::new_v4(),
            user_id,
            name,
            currency: request.currency.trim().to_uppercase(),
            is_archived: false,
            created_at: now,
            updated_at: now,
        };

        let created = cancellable(cancel, self.account_repository.create(account))
            .await?
            .map_err(name_taken)?;

        tracing::info!(
            user_id = %user_id,
            account_id = %created.id,
            currency = %created.currency,
            "Account created"
        );

        Ok(created.into())
    }

    async fn list(
        &self,
        user_id: Uuid,
        cancel: &CancellationToken,
    ) -> Result<Vec<AccountDto>, AppError> {
        let accounts = cancellable(cancel, self.account_repository.list_active(user_id)).await??;

        tracing::info!(user_id = %user_id, count = accounts.len(), "Listed accounts");

        Ok(accounts.into_iter().map(AccountDto::from).collect())
    }
}
