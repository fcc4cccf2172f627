use axum::{
    Json,
    extract::{Extension, State, rejection::JsonRejection},
};
use std::sync::Arc;

use crate::error::AppError;
use crate::handlers::error_mapper::ProblemDetails;
use crate::middleware::{AuthenticatedUser, RequestContext};
use crate::models::auth::{AuthenticationResult, CurrentUser, LoginRequest, RegisterRequest};
use crate::services::AuthService;

/// Handler for user registration
///
/// Creates the user and returns an access token for them.
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "User registered and signed in", body = AuthenticationResult),
        (status = 400, description = "Validation failed or malformed JSON", body = ProblemDetails),
        (status = 500, description = "Registration rejected by the identity store", body = ProblemDetails)
    ),
    tag = "auth"
)]
pub async fn register_handler(
    State(auth_service): State<Arc<dyn AuthService>>,
    Extension(context): Extension<RequestContext>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<AuthenticationResult>, AppError> {
    let Json(request) = payload?;
    let result = auth_service.register(request, &context.cancel).await?;
    Ok(Json(result))
}

/// Handler for user login
///
/// Authenticates the user and returns an access token.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthenticationResult),
        (status = 400, description = "Validation failed or malformed JSON", body = ProblemDetails),
        (status = 401, description = "Invalid credentials", body = ProblemDetails)
    ),
    tag = "auth"
)]
pub async fn login_handler(
    State(auth_service): State<Arc<dyn AuthService>>,
    Extension(context): Extension<RequestContext>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthenticationResult>, AppError> {
    let Json(request) = payload?;
    let result = auth_service.login(request, &context.cancel).await?;
    Ok(Json(result))
}

/// Handler returning the caller as identified by their token
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current user", body = CurrentUser),
        (status = 401, description = "Missing or invalid token", body = ProblemDetails)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "auth"
)]
pub async fn me_handler(Extension(auth_user): Extension<AuthenticatedUser>) -> Json<CurrentUser> {
    Json(auth_user.into())
}
