use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::AppError;
use crate::repositories::{Scope, ScopedLookup};
use crate::services::cancellable;

/// Resolve `id` among the records owned by `user_id`, or fail with `NotFound(reason)`.
///
/// Records owned by another user are reported exactly like missing ones.
pub async fn require<T, R>(
    repository: &R,
    id: Uuid,
    user_id: Uuid,
    scope: Scope,
    reason: &str,
    cancel: &CancellationToken,
) -> Result<T, AppError>
where
    R: ScopedLookup<T> + ?Sized,
{
    cancellable(cancel, repository.find_owned(id, user_id, scope))
        .await??
        .ok_or_else(|| AppError::NotFound(reason.to_string()))
}
