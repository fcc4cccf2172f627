use axum::{
    Router, middleware,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::error::ValidationDetail;
use crate::handlers::account_handlers::{create_account_handler, list_accounts_handler};
use crate::handlers::auth_handlers::{login_handler, me_handler, register_handler};
use crate::handlers::category_handlers::{create_category_handler, list_categories_handler};
use crate::handlers::error_mapper::ProblemDetails;
use crate::handlers::transaction_handlers::{
    create_transaction_handler, query_transactions_handler,
};
use crate::middleware::{auth_middleware, problem_details_middleware, request_context_middleware};
use crate::models::{
    AccountDto, AuthenticationResult, CategoryDto, CategoryType, CreateAccountRequest,
    CreateCategoryRequest, CreateTransactionRequest, CurrentUser, LoginRequest, RegisterRequest,
    TransactionDto, TransactionType,
};
use crate::state::AppState;

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::auth_handlers::register_handler,
        crate::handlers::auth_handlers::login_handler,
        crate::handlers::auth_handlers::me_handler,
        crate::handlers::account_handlers::create_account_handler,
        crate::handlers::account_handlers::list_accounts_handler,
        crate::handlers::category_handlers::create_category_handler,
        crate::handlers::category_handlers::list_categories_handler,
        crate::handlers::transaction_handlers::create_transaction_handler,
        crate::handlers::transaction_handlers::query_transactions_handler,
    ),
    components(
        schemas(
            RegisterRequest, LoginRequest, AuthenticationResult, CurrentUser,
            CreateAccountRequest, AccountDto,
            CreateCategoryRequest, CategoryDto, CategoryType,
            CreateTransactionRequest, TransactionDto, TransactionType,
            ProblemDetails, ValidationDetail
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Registration, login and the current user"),
        (name = "accounts", description = "Accounts holding money in one currency"),
        (name = "categories", description = "Expense and income categories"),
        (name = "transactions", description = "Recording and querying transactions")
    ),
    info(
        title = "Budget Tracker API",
        version = "0.1.0",
        description = "REST API for tracking personal budgets",
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Build the full HTTP application
pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/api/auth/me", get(me_handler))
        .route(
            "/api/accounts",
            post(create_account_handler).get(list_accounts_handler),
        )
        .route(
            "/api/categories",
            post(create_category_handler).get(list_categories_handler),
        )
        .route(
            "/api/transactions",
            post(create_transaction_handler).get(query_transactions_handler),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/api/auth/register", post(register_handler))
        .route("/api/auth/login", post(login_handler))
        .merge(protected)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            problem_details_middleware,
        ))
        .layer(middleware::from_fn(request_context_middleware))
        .with_state(state)
        .merge(SwaggerUi::new("/api/docs").url("/api/docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/auth/register",
            "/api/auth/login",
            "/api/auth/me",
            "/api/accounts",
            "/api/categories",
            "/api/transactions",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
        assert!(
            doc.components
                .as_ref()
                .unwrap()
                .security_schemes
                .contains_key("bearer_auth")
        );
    }
}
