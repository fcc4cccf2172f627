use axum::{
    Json,
    extract::{
        Extension, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;

use crate::error::AppError;
use crate::handlers::error_mapper::ProblemDetails;
use crate::handlers::location;
use crate::middleware::{AuthenticatedUser, RequestContext};
use crate::models::paging::PagedResult;
use crate::models::transaction::{CreateTransactionRequest, TransactionDto, TransactionQuery};
use crate::services::TransactionService;

/// Handler for recording a transaction
#[utoipa::path(
    post,
    path = "/api/transactions",
    request_body = CreateTransactionRequest,
    responses(
        (status = 201, description = "Transaction created", body = TransactionDto),
        (status = 400, description = "Validation failed or malformed JSON", body = ProblemDetails),
        (status = 401, description = "Missing or invalid token", body = ProblemDetails),
        (status = 404, description = "Account or category not found", body = ProblemDetails),
        (status = 409, description = "Currency or category type does not match", body = ProblemDetails)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "transactions"
)]
pub async fn create_transaction_handler(
    State(transaction_service): State<Arc<dyn TransactionService>>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Extension(context): Extension<RequestContext>,
    payload: Result<Json<CreateTransactionRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(request) = payload?;

    let transaction = transaction_service
        .create(auth_user.user_id, request, &context.cancel)
        .await?;

    Ok((
        StatusCode::CREATED,
        location("transactions", transaction.id),
        Json(transaction),
    ))
}

/// Handler for querying transactions
///
/// Newest occurrence first; rows with the same occurrence time are ordered by
/// creation time, newest first.
#[utoipa::path(
    get,
    path = "/api/transactions",
    params(TransactionQuery),
    responses(
        (status = 200, description = "One page of matching transactions", body = PagedResult<TransactionDto>),
        (status = 400, description = "Invalid paging or time window", body = ProblemDetails),
        (status = 401, description = "Missing or invalid token", body = ProblemDetails)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "transactions"
)]
pub async fn query_transactions_handler(
    State(transaction_service): State<Arc<dyn TransactionService>>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Extension(context): Extension<RequestContext>,
    query: Result<Query<TransactionQuery>, QueryRejection>,
) -> Result<Json<PagedResult<TransactionDto>>, AppError> {
    let Query(query) = query?;

    let page = transaction_service
        .query(auth_user.user_id, query, &context.cancel)
        .await?;
    Ok(Json(page))
}
