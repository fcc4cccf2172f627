use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::error::AppError;
use crate::repositories::RepositoryError;

pub mod account_service;
pub mod auth_service;
pub mod category_service;
pub mod scoped;
pub mod transaction_service;

pub use account_service::{AccountService, AccountServiceImpl};
pub use auth_service::{AuthService, AuthServiceImpl};
pub use category_service::{CategoryService, CategoryServiceImpl};
pub use transaction_service::{TransactionService, TransactionServiceImpl};

/// Run one I/O step unless the caller has given up.
///
/// The token is checked before the step starts and raced against it while it
/// runs; a cancelled token yields `AppError::Canceled` and drops the step.
pub async fn cancellable<F: Future>(
    cancel: &CancellationToken,
    operation: F,
) -> Result<F::Output, AppError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(AppError::Canceled),
        output = operation => Ok(output),
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => AppError::NotFound("Resource not found".to_string()),
            RepositoryError::ConstraintViolation(constraint) => {
                AppError::Conflict(format!("Constraint violation: {}", constraint))
            }
            RepositoryError::DatabaseError(msg) => AppError::Internal(msg),
        }
    }
}
