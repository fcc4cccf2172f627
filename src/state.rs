use axum::extract::FromRef;
use sqlx::PgPool;
use std::sync::Arc;

use crate::config::{Environment, JwtSettings, Settings};
use crate::handlers::error_mapper::ErrorMapper;
use crate::identity::{IdentityProvider, JwtTokenSigner, PostgresIdentityProvider};
use crate::repositories::{
    AccountRepository, CategoryRepository, InMemoryStore, PostgresAccountRepository,
    PostgresCategoryRepository, PostgresTransactionRepository, TransactionRepository,
};
use crate::services::{
    AccountService, AccountServiceImpl, AuthService, AuthServiceImpl, CategoryService,
    CategoryServiceImpl, TransactionService, TransactionServiceImpl,
};

/// Shared application state; handlers extract the service they need through `FromRef`
#[derive(Clone)]
pub struct AppState {
    pub account_service: Arc<dyn AccountService>,
    pub category_service: Arc<dyn CategoryService>,
    pub transaction_service: Arc<dyn TransactionService>,
    pub auth_service: Arc<dyn AuthService>,
    pub error_mapper: ErrorMapper,
}

impl AppState {
    /// Wire every service from the given repositories and identity provider
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        categories: Arc<dyn CategoryRepository>,
        transactions: Arc<dyn TransactionRepository>,
        identity_provider: Arc<dyn IdentityProvider>,
        jwt: &JwtSettings,
        environment: Environment,
    ) -> Self {
        let token_signer = Arc::new(JwtTokenSigner::new(jwt));

        Self {
            account_service: Arc::new(AccountServiceImpl::new(accounts.clone())),
            category_service: Arc::new(CategoryServiceImpl::new(categories.clone())),
            transaction_service: Arc::new(TransactionServiceImpl::new(
                transactions,
                accounts,
                categories,
            )),
            auth_service: Arc::new(AuthServiceImpl::new(identity_provider, token_signer)),
            error_mapper: ErrorMapper::new(environment),
        }
    }

    pub fn postgres(pool: PgPool, settings: &Settings) -> Self {
        Self::new(
            Arc::new(PostgresAccountRepository::new(pool.clone())),
            Arc::new(PostgresCategoryRepository::new(pool.clone())),
            Arc::new(PostgresTransactionRepository::new(pool.clone())),
            Arc::new(PostgresIdentityProvider::new(pool, settings.bcrypt_cost)),
            &settings.jwt,
            settings.environment,
        )
    }

    /// Database-less state backed by a single in-memory store
    pub fn in_memory(
        store: Arc<InMemoryStore>,
        identity_provider: Arc<dyn IdentityProvider>,
        jwt: &JwtSettings,
        environment: Environment,
    ) -> Self {
        Self::new(
            store.clone(),
            store.clone(),
            store,
            identity_provider,
            jwt,
            environment,
        )
    }
}

impl FromRef<AppState> for Arc<dyn AccountService> {
    fn from_ref(state: &AppState) -> Self {
        state.account_service.clone()
    }
}

impl FromRef<AppState> for Arc<dyn CategoryService> {
    fn from_ref(state: &AppState) -> Self {
        state.category_service.clone()
    }
}

impl FromRef<AppState> for Arc<dyn TransactionService> {
    fn from_ref(state: &AppState) -> Self {
        state.transaction_service.clone()
    }
}

impl FromRef<AppState> for Arc<dyn AuthService> {
    fn from_ref(state: &AppState) -> Self {
        state.auth_service.clone()
    }
}

impl FromRef<AppState> for ErrorMapper {
    fn from_ref(state: &AppState) -> Self {
        state.error_mapper
    }
}
