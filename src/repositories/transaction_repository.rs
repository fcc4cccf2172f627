use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::models::paging::PageRequest;
use crate::models::transaction::{Transaction, TransactionFilter};
use crate::repositories::RepositoryError;

const TRANSACTION_COLUMNS: &str = "id, user_id, account_id, transaction_type, amount, currency, \
     category_id, occurred_at, note, is_deleted, created_at, updated_at";

/// Trait defining transaction repository operations
#[async_trait]
pub trait TransactionRepository: Send + Sync {
    /// Insert a new transaction
    async fn create(&self, transaction: Transaction) -> Result<Transaction, RepositoryError>;

    /// Number of transactions matching the filter, ignoring paging
    async fn count(&self, filter: &TransactionFilter) -> Result<i64, RepositoryError>;

    /// One page of matching transactions, newest occurrence first, ties broken by
    /// newest creation first
    async fn find_page(
        &self,
        filter: &TransactionFilter,
        page: PageRequest,
    ) -> Result<Vec<Transaction>, RepositoryError>;
}

/// PostgreSQL implementation of TransactionRepository
pub struct PostgresTransactionRepository {
    pool: PgPool,
}

impl PostgresTransactionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Append the WHERE clause for `filter`; each present filter adds one AND condition.
fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &TransactionFilter) {
    builder
        .push(" WHERE user_id = ")
        .push_bind(filter.user_id)
        .push(" AND is_deleted = FALSE");

    if let Some(from) = filter.from {
        builder.push(" AND occurred_at >= ").push_bind(from);
    }
    if let Some(to) = filter.to {
        builder.push(" AND occurred_at <= ").push_bind(to);
    }
    if let Some(transaction_type) = filter.transaction_type {
        builder
            .push(" AND transaction_type = ")
            .push_bind(transaction_type);
    }
    if let Some(account_id) = filter.account_id {
        builder.push(" AND account_id = ").push_bind(account_id);
    }
    if let Some(category_id) = filter.category_id {
        builder.push(" AND category_id = ").push_bind(category_id);
    }
}

#[async_trait]
impl TransactionRepository for PostgresTransactionRepository {
    async fn create(&self, transaction: Transaction) -> Result<Transaction, RepositoryError> {
        let sql = format!(
            "INSERT INTO transactions ({TRANSACTION_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
             RETURNING {TRANSACTION_COLUMNS}"
        );

        let created = sqlx::query_as::<_, Transaction>(&sql)
            .bind(transaction.id)
            .bind(transaction.user_id)
            .bind(transaction.account_id)
            .bind(transaction.transaction_type)
            .bind(transaction.amount)
            .bind(&transaction.currency)
            .bind(transaction.category_id)
            .bind(transaction.occurred_at)
            .bind(&transaction.note)
            .bind(transaction.is_deleted)
            .bind(transaction.created_at)
            .bind(transaction.updated_at)
            .fetch_one(&self.pool)
            .await?;

        Ok(created)
    }

    async fn count(&self, filter: &TransactionFilter) -> Result<i64, RepositoryError> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM transactions");
        push_filter(&mut builder, filter);

        let total = builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        Ok(total)
    }

    async fn find_page(
        &self,
        filter: &TransactionFilter,
        page: PageRequest,
    ) -> Result<Vec<Transaction>, RepositoryError> {
        let mut builder =
            QueryBuilder::<Postgres>::new(format!("SELECT {TRANSACTION_COLUMNS} FROM transactions"));
        push_filter(&mut builder, filter);
        builder
            .push(" ORDER BY occurred_at DESC, created_at DESC")
            .push(" LIMIT ")
            .push_bind(page.limit)
            .push(" OFFSET ")
            .push_bind(page.offset);

        let transactions = builder
            .build_query_as::<Transaction>()
            .fetch_all(&self.pool)
            .await?;

        Ok(transactions)
    }
}
