use axum::{
    Json,
    extract::{Extension, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;

use crate::error::AppError;
use crate::handlers::error_mapper::ProblemDetails;
use crate::handlers::location;
use crate::middleware::{AuthenticatedUser, RequestContext};
use crate::models::account::{AccountDto, CreateAccountRequest};
use crate::services::AccountService;

/// Handler for creating an account
#[utoipa::path(
    post,
    path = "/api/accounts",
    request_body = CreateAccountRequest,
    responses(
        (status = 201, description = "Account created", body = AccountDto),
        (status = 400, description = "Validation failed or malformed JSON", body = ProblemDetails),
        (status = 401, description = "Missing or invalid token", body = ProblemDetails),
        (status = 409, description = "An account with this name already exists", body = ProblemDetails)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "accounts"
)]
pub async fn create_account_handler(
    State(account_service): State<Arc<dyn AccountService>>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Extension(context): Extension<RequestContext>,
    payload: Result<Json<CreateAccountRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(request) = payload?;

    let account = account_service
        .create(auth_user.user_id, request, &context.cancel)
        .await?;

    Ok((
        StatusCode::CREATED,
        location("accounts", account.id),
        Json(account),
    ))
}

/// Handler for listing the caller's active accounts
#[utoipa::path(
    get,
    path = "/api/accounts",
    responses(
        (status = 200, description = "Active accounts ordered by name", body = Vec<AccountDto>),
        (status = 401, description = "Missing or invalid token", body = ProblemDetails)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "accounts"
)]
pub async fn list_accounts_handler(
    State(account_service): State<Arc<dyn AccountService>>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Extension(context): Extension<RequestContext>,
) -> Result<Json<Vec<AccountDto>>, AppError> {
    let accounts = account_service
        .list(auth_user.user_id, &context.cancel)
        .await?;
    Ok(Json(accounts))
}
