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
use crate::models::category::{CategoryDto, CreateCategoryRequest};
use crate::services::CategoryService;

/// Handler for creating a category
#[utoipa::path(
    post,
    path = "/api/categories",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Category created", body = CategoryDto),
        (status = 400, description = "Validation failed or malformed JSON", body = ProblemDetails),
        (status = 401, description = "Missing or invalid token", body = ProblemDetails),
        (status = 404, description = "Parent category not found", body = ProblemDetails),
        (status = 409, description = "Parent type differs or the name is taken", body = ProblemDetails)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "categories"
)]
pub async fn create_category_handler(
    State(category_service): State<Arc<dyn CategoryService>>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Extension(context): Extension<RequestContext>,
    payload: Result<Json<CreateCategoryRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(request) = payload?;

    let category = category_service
        .create(auth_user.user_id, request, &context.cancel)
        .await?;

    Ok((
        StatusCode::CREATED,
        location("categories", category.id),
        Json(category),
    ))
}

/// Handler for listing the caller's active categories
#[utoipa::path(
    get,
    path = "/api/categories",
    responses(
        (status = 200, description = "Active categories ordered by type, then name", body = Vec<CategoryDto>),
        (status = 401, description = "Missing or invalid token", body = ProblemDetails)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "categories"
)]
pub async fn list_categories_handler(
    State(category_service): State<Arc<dyn CategoryService>>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Extension(context): Extension<RequestContext>,
) -> Result<Json<Vec<CategoryDto>>, AppError> {
    let categories = category_service
        .list(auth_user.user_id, &context.cancel)
        .await?;
    Ok(Json(categories))
}
