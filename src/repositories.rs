use async_trait::async_trait;
use uuid::Uuid;

pub mod account_repository;
pub mod category_repository;
pub mod memory;
pub mod transaction_repository;

pub use account_repository::{AccountRepository, PostgresAccountRepository};
pub use category_repository::{CategoryRepository, PostgresCategoryRepository};
pub use memory::InMemoryStore;
pub use transaction_repository::{PostgresTransactionRepository, TransactionRepository};

/// Repository errors for database operations
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Resource not found")]
    NotFound,

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => RepositoryError::NotFound,
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                RepositoryError::ConstraintViolation(
                    db_err
                        .constraint()
                        .map(str::to_string)
                        .unwrap_or_else(|| db_err.to_string()),
                )
            }
            other => RepositoryError::DatabaseError(other.to_string()),
        }
    }
}

/// Extra predicate applied on top of an id + owner lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Any record owned by the user, archived or not
    Any,
    /// Only records that are not archived
    Active,
}

/// Lookup of a record by id, restricted to records owned by `user_id`.
///
/// A record owned by somebody else is indistinguishable from a missing one.
#[async_trait]
pub trait ScopedLookup<T>: Send + Sync {
    async fn find_owned(
        &self,
        id: Uuid,
        user_id: Uuid,
        scope: Scope,
    ) -> Result<Option<T>, RepositoryError>;
}
