//! In-process record store with the same constraints as the PostgreSQL schema.
//!
//! Used by the test suites and for running the API without a database.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::models::account::Account;
use crate::models::category::{Category, CategoryType};
use crate::models::paging::PageRequest;
use crate::models::transaction::{Transaction, TransactionFilter};
use crate::repositories::{
    AccountRepository, CategoryRepository, RepositoryError, Scope, ScopedLookup,
    TransactionRepository,
};

#[derive(Default)]
pub struct InMemoryStore {
    accounts: Mutex<HashMap<Uuid, Account>>,
    categories: Mutex<HashMap<Uuid, Category>>,
    transactions: Mutex<HashMap<Uuid, Transaction>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored transaction, including soft-deleted ones
    pub fn transactions(&self) -> Result<Vec<Transaction>, RepositoryError> {
        Ok(lock(&self.transactions)?.values().cloned().collect())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, RepositoryError> {
    mutex
        .lock()
        .map_err(|_| RepositoryError::DatabaseError("in-memory store poisoned".to_string()))
}

fn in_scope(is_archived: bool, scope: Scope) -> bool {
    match scope {
        Scope::Any => true,
        Scope::Active => !is_archived,
    }
}

#[async_trait]
impl ScopedLookup<Account> for InMemoryStore {
    async fn find_owned(
        &self,
        id: Uuid,
        user_id: Uuid,
        scope: Scope,
    ) -> Result<Option<Account>, RepositoryError> {
        let accounts = lock(&self.accounts)?;
        Ok(accounts
            .get(&id)
            .filter(|a| a.user_id == user_id && in_scope(a.is_archived, scope))
            .cloned())
    }
}

#[async_trait]
impl AccountRepository for InMemoryStore {
    async fn create(&self, account: Account) -> Result<Account, RepositoryError> {
        let mut accounts = lock(&self.accounts)?;
        if accounts
            .values()
            .any(|a| a.user_id == account.user_id && a.name == account.name)
        {
            return Err(RepositoryError::ConstraintViolation(
                "accounts_user_id_name_key".to_string(),
            ));
        }
        accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn exists_with_name(&self, user_id: Uuid, name: &str) -> Result<bool, RepositoryError> {
        let accounts = lock(&self.accounts)?;
        Ok(accounts
            .values()
            .any(|a| a.user_id == user_id && a.name == name))
    }

    async fn list_active(&self, user_id: Uuid) -> Result<Vec<Account>, RepositoryError> {
        let accounts = lock(&self.accounts)?;
        let mut result: Vec<Account> = accounts
            .values()
            .filter(|a| a.user_id == user_id && !a.is_archived)
            .cloned()
            .collect();
        result.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(result)
    }
}

#[async_trait]
impl ScopedLookup<Category> for InMemoryStore {
    async fn find_owned(
        &self,
        id: Uuid,
        user_id: Uuid,
        scope: Scope,
    ) -> Result<Option<Category>, RepositoryError> {
        let categories = lock(&self.categories)?;
        Ok(categories
            .get(&id)
            .filter(|c| c.user_id == user_id && in_scope(c.is_archived, scope))
            .cloned())
    }
}

#[async_trait]
impl CategoryRepository for InMemoryStore {
    async fn create(&self, category: Category) -> Result<Category, RepositoryError> {
        let mut categories = lock(&self.categories)?;
        if categories.values().any(|c| {
            c.user_id == category.user_id
                && c.name == category.name
                && c.category_type == category.category_type
        }) {
            return Err(RepositoryError::ConstraintViolation(
                "categories_user_id_name_category_type_key".to_string(),
            ));
        }
        categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn exists_with_name(
        &self,
        user_id: Uuid,
        name: &str,
        category_type: CategoryType,
    ) -> Result<bool, RepositoryError> {
        let categories = lock(&self.categories)?;
        Ok(categories.values().any(|c| {
            c.user_id == user_id && c.name == name && c.category_type == category_type
        }))
    }

    async fn list_active(&self, user_id: Uuid) -> Result<Vec<Category>, RepositoryError> {
        let categories = lock(&self.categories)?;
        let mut result: Vec<Category> = categories
            .values()
            .filter(|c| c.user_id == user_id && !c.is_archived)
            .cloned()
            .collect();
        result.sort_by(|a, b| {
            a.category_type
                .cmp(&b.category_type)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(result)
    }
}

#[async_trait]
impl TransactionRepository for InMemoryStore {
    async fn create(&self, transaction: Transaction) -> Result<Transaction, RepositoryError> {
        let mut transactions = lock(&self.transactions)?;
        if transactions.contains_key(&transaction.id) {
            return Err(RepositoryError::ConstraintViolation(
                "transactions_pkey".to_string(),
            ));
        }
        transactions.insert(transaction.id, transaction.clone());
        Ok(transaction)
    }

    async fn count(&self, filter: &TransactionFilter) -> Result<i64, RepositoryError> {
        let transactions = lock(&self.transactions)?;
        Ok(transactions.values().filter(|t| filter.matches(t)).count() as i64)
    }

    async fn find_page(
        &self,
        filter: &TransactionFilter,
        page: PageRequest,
    ) -> Result<Vec<Transaction>, RepositoryError> {
        let transactions = lock(&self.transactions)?;
        let mut matching: Vec<Transaction> = transactions
            .values()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect();
        matching.sort_by(|a, b| {
            b.occurred_at
                .cmp(&a.occurred_at)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });

        let offset = usize::try_from(page.offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(page.limit).unwrap_or(0);
        Ok(matching.into_iter().skip(offset).take(limit).collect())
    }
}
