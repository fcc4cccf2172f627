use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::handlers::error_mapper::{ErrorMapper, PendingError};
use crate::middleware::request_context::RequestContext;

/// Render any `AppError` returned below this layer as a problem-details body
pub async fn problem_details_middleware(
    State(mapper): State<ErrorMapper>,
    request: Request,
    next: Next,
) -> Response {
    let context = request
        .extensions()
        .get::<RequestContext>()
        .cloned()
        .unwrap_or_else(|| {
            RequestContext::new(Uuid::new_v4().simple().to_string(), request.uri().path())
        });

    let mut response = next.run(request).await;
    match response.extensions_mut().remove::<PendingError>() {
        Some(PendingError(error)) => mapper.into_response(&error, &context),
        None => response,
    }
}
