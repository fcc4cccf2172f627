use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::account::Account;
use crate::models::category::Category;
use crate::models::paging::{PageRequest, PagedResult};
use crate::models::transaction::{
    CreateTransactionRequest, Transaction, TransactionDto, TransactionFilter, TransactionQuery,
};
use crate::repositories::{AccountRepository, CategoryRepository, Scope, TransactionRepository};
use crate::services::{cancellable, scoped};
use crate::validation::validate_request;

pub const ACCOUNT_NOT_FOUND: &str = "Account not found";
pub const CURRENCY_MISMATCH: &str = "Currency does not match the account currency";
pub const CATEGORY_NOT_FOUND: &str = "Category not found";
pub const CATEGORY_TYPE_MISMATCH: &str = "Category type must match transaction type";

/// Trait defining transaction service operations
#[async_trait]
pub trait TransactionService: Send + Sync {
    /// Record a transaction on one of the user's active accounts
    async fn create(
        &self,
        user_id: Uuid,
        request: CreateTransactionRequest,
        cancel: &CancellationToken,
    ) -> Result<TransactionDto, AppError>;

    /// Filtered, paged listing of the user's live transactions
    async fn query(
        &self,
        user_id: Uuid,
        query: TransactionQuery,
        cancel: &CancellationToken,
    ) -> Result<PagedResult<TransactionDto>, AppError>;
}

/// Implementation of TransactionService
pub struct TransactionServiceImpl {
    transaction_repository: Arc<dyn TransactionRepository>,
    account_repository: Arc<dyn AccountRepository>,
    category_repository: Arc<dyn CategoryRepository>,
}

impl TransactionServiceImpl {
    pub fn new(
        transaction_repository: Arc<dyn TransactionRepository>,
        account_repository: Arc<dyn AccountRepository>,
        category_repository: Arc<dyn CategoryRepository>,
    ) -> Self {
        Self {
            transaction_repository,
            account_repository,
            category_repository,
        }
    }
}

fn normalize_note(note: Option<String>) -> Option<String> {
    note.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())
}

#[async_trait]
impl TransactionService for TransactionServiceImpl {
    async fn create(
        &self,
        user_id: Uuid,
        request: CreateTransactionRequest,
        cancel: &CancellationToken,
    ) -> Result<TransactionDto, AppError> {
        validate_request(&request)?;

        // Each rule reports its own message, so the order of these checks is observable
        let account: Account = scoped::require(
            self.account_repository.as_ref(),
            request.account_id,
            user_id,
            Scope::Active,
            ACCOUNT_NOT_FOUND,
            cancel,
        )
        .await?;

        let currency = request.currency.trim().to_uppercase();
        if currency != account.currency {
            return Err(AppError::Conflict(CURRENCY_MISMATCH.to_string()));
        }

        if let Some(category_id) = request.category_id {
            let category: Category = scoped::require(
                self.category_repository.as_ref(),
                category_id,
                user_id,
                Scope::Active,
                CATEGORY_NOT_FOUND,
                cancel,
            )
            .await?;

            if !request.transaction_type.matches(category.category_type) {
                return Err(AppError::Conflict(CATEGORY_TYPE_MISMATCH.to_string()));
            }
        }

        let now = Utc::now();
        let occurred_at = request
            .occurred_at_utc
            .map(|at| at.with_timezone(&Utc))
            .unwrap_or(now);

        let transaction = Transaction {
            id: Uuid::new_v4(),
            user_id,
            account_id: account.id,
            transaction_type: request.transaction_type,
            amount: request.amount,
            currency,
            category_id: request.category_id,
            occurred_at,
            note: normalize_note(request.note),
            is_deleted: false,
            created_at: now,
            updated_at: now,
        };

        let created = cancellable(cancel, self.transaction_repository.create(transaction)).await??;

        tracing::info!(
            user_id = %user_id,
            transaction_id = %created.id,
            account_id = %created.account_id,
            transaction_type = ?created.transaction_type,
            amount = %created.amount,
            "Transaction created"
        );

        Ok(created.into())
    }

    async fn query(
        &self,
        user_id: Uuid,
        query: TransactionQuery,
        cancel: &CancellationToken,
    ) -> Result<PagedResult<TransactionDto>, AppError> {
        validate_request(&query)?;

        let filter = TransactionFilter::from_query(user_id, &query);
        let page = PageRequest::new(query.page, query.page_size);

        let total_count = cancellable(cancel, self.transaction_repository.count(&filter)).await??;
        let transactions =
            cancellable(cancel, self.transaction_repository.find_page(&filter, page)).await??;

        tracing::info!(
            user_id = %user_id,
            total_count,
            returned = transactions.len(),
            page = query.page,
            page_size = query.page_size,
            "Queried transactions"
        );

        Ok(PagedResult {
            items: transactions.into_iter().map(TransactionDto::from).collect(),
            total_count,
            page: query.page,
            page_size: query.page_size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::account::CreateAccountRequest;
    use crate::models::category::{CategoryType, CreateCategoryRequest};
    use crate::models::transaction::TransactionType;
    use crate::repositories::InMemoryStore;
    use crate::services::{
        AccountService, AccountServiceImpl, CategoryService, CategoryServiceImpl,
    };
    use chrono::{DateTime, Duration, FixedOffset, TimeZone};
    use rust_decimal::Decimal;

    struct Fixture {
        store: Arc<InMemoryStore>,
        accounts: AccountServiceImpl,
        categories: CategoryServiceImpl,
        transactions: TransactionServiceImpl,
        cancel: CancellationToken,
    }

    impl Fixture {
        fn new() -> Self {
            let store = Arc::new(InMemoryStore::new());
            Self {
                accounts: AccountServiceImpl::new(store.clone()),
                categories: CategoryServiceImpl::new(store.clone()),
                transactions: TransactionServiceImpl::new(
                    store.clone(),
                    store.clone(),
                    store.clone(),
                ),
                store,
                cancel: CancellationToken::new(),
            }
        }

        async fn account(&self, user_id: Uuid, name: &str, currency: &str) -> Uuid {
            self.accounts
                .create(
                    user_id,
                    CreateAccountRequest {
                        name: name.to_string(),
                        currency: currency.to_string(),
                    },
                    &self.cancel,
                )
                .await
                .unwrap()
                .id
        }

        async fn category(&self, user_id: Uuid, name: &str, category_type: CategoryType) -> Uuid {
            self.categories
                .create(
                    user_id,
                    CreateCategoryRequest {
                        name: name.to_string(),
                        category_type,
                        parent_id: None,
                    },
                    &self.cancel,
                )
                .await
                .unwrap()
                .id
        }

        async fn record(
            &self,
            user_id: Uuid,
            request: CreateTransactionRequest,
        ) -> Result<TransactionDto, AppError> {
            self.transactions.create(user_id, request, &self.cancel).await
        }
    }

    fn expense(account_id: Uuid, amount: i64, currency: &str) -> CreateTransactionRequest {
        CreateTransactionRequest {
            account_id,
            transaction_type: TransactionType::Expense,
            amount: Decimal::new(amount, 2),
            currency: currency.to_string(),
            category_id: None,
            occurred_at_utc: None,
            note: None,
        }
    }

    fn at(day: u32, hour: u32) -> DateTime<FixedOffset> {
        Utc.with_ymd_and_hms(2024, 1, day, hour, 0, 0)
            .unwrap()
            .fixed_offset()
    }

    #[tokio::test]
    async fn test_create_defaults_and_trims() {
        let fx = Fixture::new();
        let user_id = Uuid::new_v4();
        let account_id = fx.account(user_id, "Card", "USD").await;

        let mut request = expense(account_id, 4250, "usd");
        request.note = Some("  weekly groceries  ".to_string());

        let before = Utc::now();
        let created = fx.record(user_id, request).await.unwrap();
        let after = Utc::now();

        assert_eq!(created.currency, "USD");
        assert_eq!(created.amount, Decimal::new(4250, 2));
        assert_eq!(created.note.as_deref(), Some("weekly groceries"));
        assert!(created.occurred_at_utc >= before && created.occurred_at_utc <= after);

        let stored = fx.store.transactions().unwrap();
        assert_eq!(stored.len(), 1);
        assert!(!stored[0].is_deleted);
    }

    #[tokio::test]
    async fn test_blank_note_is_dropped_and_offset_converted() {
        let fx = Fixture::new();
        let user_id = Uuid::new_v4();
        let account_id = fx.account(user_id, "Card", "USD").await;

        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        let mut request = expense(account_id, 100, "USD");
        request.note = Some("   ".to_string());
        request.occurred_at_utc = Some(offset.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap());

        let created = fx.record(user_id, request).await.unwrap();
        assert_eq!(created.note, None);
        assert_eq!(
            created.occurred_at_utc,
            Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap()
        );
    }

    #[tokio::test]
    async fn test_missing_foreign_and_archived_accounts_are_not_found() {
        let fx = Fixture::new();
        let user_id = Uuid::new_v4();
        let foreign = fx.account(Uuid::new_v4(), "Card", "USD").await;

        let now = Utc::now();
        let archived = AccountRepository::create(
            fx.store.as_ref(),
            Account {
                id: Uuid::new_v4(),
                user_id,
                name: "Closed".to_string(),
                currency: "USD".to_string(),
                is_archived: true,
                created_at: now,
                updated_at: now,
            },
        )
        .await
        .unwrap();

        for account_id in [Uuid::new_v4(), foreign, archived.id] {
            let err = fx.record(user_id, expense(account_id, 100, "USD")).await.unwrap_err();
            assert!(matches!(err, AppError::NotFound(ref msg) if msg == ACCOUNT_NOT_FOUND));
        }
        assert!(fx.store.transactions().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_currency_mismatch_conflicts() {
        let fx = Fixture::new();
        let user_id = Uuid::new_v4();
        let account_id = fx.account(user_id, "Card", "EUR").await;

        let err = fx.record(user_id, expense(account_id, 100, "usd")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(ref msg) if msg == CURRENCY_MISMATCH));
    }

    #[tokio::test]
    async fn test_currency_checked_before_category() {
        let fx = Fixture::new();
        let user_id = Uuid::new_v4();
        let account_id = fx.account(user_id, "Card", "EUR").await;

        let mut request = expense(account_id, 100, "USD");
        request.category_id = Some(Uuid::new_v4());

        let err = fx.record(user_id, request).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(ref msg) if msg == CURRENCY_MISMATCH));
    }

    #[tokio::test]
    async fn test_category_rules() {
        let fx = Fixture::new();
        let user_id = Uuid::new_v4();
        let account_id = fx.account(user_id, "Card", "USD").await;
        let salary = fx.category(user_id, "Salary", CategoryType::Income).await;
        let food = fx.category(user_id, "Food", CategoryType::Expense).await;

        let mut request = expense(account_id, 100, "USD");
        request.category_id = Some(Uuid::new_v4());
        let err = fx.record(user_id, request.clone()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(ref msg) if msg == CATEGORY_NOT_FOUND));

        request.category_id = Some(salary);
        let err = fx.record(user_id, request.clone()).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(ref msg) if msg == CATEGORY_TYPE_MISMATCH));

        request.category_id = Some(food);
        let created = fx.record(user_id, request).await.unwrap();
        assert_eq!(created.category_id, Some(food));
    }

    #[tokio::test]
    async fn test_invalid_amount_is_a_validation_error() {
        let fx = Fixture::new();
        let user_id = Uuid::new_v4();

        let mut request = expense(Uuid::nil(), 0, "US");
        request.amount = Decimal::ZERO;

        let err = fx.record(user_id, request).await.unwrap_err();
        let detail = err.validation().expect("validation error");
        assert!(detail.messages("amount").is_some());
        assert!(detail.messages("currency").is_some());
        assert!(detail.messages("accountId").is_some());
    }

    #[tokio::test]
    async fn test_query_filters_orders_and_pages() {
        let fx = Fixture::new();
        let user_id = Uuid::new_v4();
        let card = fx.account(user_id, "Card", "USD").await;
        let cash = fx.account(user_id, "Cash", "USD").await;

        for (account_id, day) in [(card, 2), (card, 5), (card, 9), (cash, 4)] {
            let mut request = expense(account_id, 1000, "USD");
            request.occurred_at_utc = Some(at(day, 12));
            fx.record(user_id, request).await.unwrap();
        }
        // Another user's row inside the window
        let other = Uuid::new_v4();
        let other_account = fx.account(other, "Card", "USD").await;
        let mut request = expense(other_account, 1000, "USD");
        request.occurred_at_utc = Some(at(4, 12));
        fx.record(other, request).await.unwrap();

        let query = TransactionQuery {
            from_utc: Some(at(3, 0).with_timezone(&Utc)),
            to_utc: Some(at(9, 12).with_timezone(&Utc)),
            account_id: Some(card),
            page: 2,
            page_size: 1,
            ..TransactionQuery::default()
        };

        let result = fx.transactions.query(user_id, query, &fx.cancel).await.unwrap();
        assert_eq!(result.total_count, 2);
        assert_eq!(result.page, 2);
        assert_eq!(result.page_size, 1);
        assert_eq!(result.items.len(), 1);
        assert_eq!(result.items[0].occurred_at_utc, at(5, 12).with_timezone(&Utc));
    }

    #[tokio::test]
    async fn test_query_breaks_ties_by_creation() {
        let fx = Fixture::new();
        let user_id = Uuid::new_v4();
        let card = fx.account(user_id, "Card", "USD").await;

        let mut ids = Vec::new();
        for _ in 0..3 {
            let mut request = expense(card, 500, "USD");
            request.occurred_at_utc = Some(at(1, 8));
            ids.push(fx.record(user_id, request).await.unwrap().id);
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }

        let result = fx
            .transactions
            .query(user_id, TransactionQuery::default(), &fx.cancel)
            .await
            .unwrap();
        let listed: Vec<Uuid> = result.items.iter().map(|t| t.id).collect();
        ids.reverse();
        assert_eq!(listed, ids);
    }

    #[tokio::test]
    async fn test_query_excludes_deleted_and_echoes_empty_page() {
        let fx = Fixture::new();
        let user_id = Uuid::new_v4();
        let card = fx.account(user_id, "Card", "USD").await;

        let now = Utc::now();
        TransactionRepository::create(
            fx.store.as_ref(),
            Transaction {
                id: Uuid::new_v4(),
                user_id,
                account_id: card,
                transaction_type: TransactionType::Income,
                amount: Decimal::ONE,
                currency: "USD".to_string(),
                category_id: None,
                occurred_at: now - Duration::days(1),
                note: None,
                is_deleted: true,
                created_at: now,
                updated_at: now,
            },
        )
        .await
        .unwrap();

        let query = TransactionQuery {
            page: 7,
            page_size: 50,
            ..TransactionQuery::default()
        };
        let result = fx.transactions.query(user_id, query, &fx.cancel).await.unwrap();
        assert_eq!(result.total_count, 0);
        assert!(result.items.is_empty());
        assert_eq!(result.page, 7);
        assert_eq!(result.page_size, 50);
    }

    #[tokio::test]
    async fn test_query_rejects_bad_paging_and_window() {
        let fx = Fixture::new();
        let query = TransactionQuery {
            from_utc: Some(at(9, 0).with_timezone(&Utc)),
            to_utc: Some(at(1, 0).with_timezone(&Utc)),
            page: 0,
            page_size: 201,
            ..TransactionQuery::default()
        };

        let err = fx
            .transactions
            .query(Uuid::new_v4(), query, &fx.cancel)
            .await
            .unwrap_err();
        let detail = err.validation().expect("validation error");
        assert!(detail.messages("page").is_some());
        assert!(detail.messages("pageSize").is_some());
        assert_eq!(
            detail.messages(""),
            Some(&["FromUtc must be before ToUtc.".to_string()][..])
        );
    }
}
