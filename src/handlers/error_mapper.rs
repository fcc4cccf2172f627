use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::header,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::config::Environment;
use crate::error::{AppError, ErrorKind, ValidationDetail};
use crate::middleware::request_context::RequestContext;

pub const PROBLEM_CONTENT_TYPE: &str = "application/problem+json";

/// Failure body returned for every error response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(example = json!({
    "status": 404,
    "title": "Not Found",
    "detail": "Account not found",
    "instance": "/api/transactions",
    "type": "https://httpstatuses.com/404",
    "code": "common.not_found",
    "traceId": "4bf92f3577b34da6a3ce929d0e0e4736"
}))]
pub struct ProblemDetails {
    pub status: u16,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub instance: String,
    #[serde(rename = "type")]
    pub problem_type: String,
    pub code: String,
    pub trace_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<ValidationDetail>,
}

/// Response marker carrying the error until the problem-details layer renders it
#[derive(Clone, Debug)]
pub struct PendingError(pub Arc<AppError>);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut response = self.kind().status().into_response();
        response.extensions_mut().insert(PendingError(Arc::new(self)));
        response
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(_) | JsonRejection::JsonSyntaxError(_) => {
                AppError::InvalidJson(rejection.body_text())
            }
            _ => AppError::BadRequest(rejection.body_text()),
        }
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

/// Turns any `AppError` into a logged problem-details response
#[derive(Debug, Clone, Copy)]
pub struct ErrorMapper {
    expose_details: bool,
}

impl ErrorMapper {
    pub fn new(environment: Environment) -> Self {
        Self {
            expose_details: !environment.is_production(),
        }
    }

    /// Build the problem body; `None` when the caller already abandoned the request
    pub fn problem(&self, error: &AppError, context: &RequestContext) -> Option<ProblemDetails> {
        let kind = error.kind();

        if kind == ErrorKind::Canceled && context.cancel.is_cancelled() {
            tracing::info!(
                trace_id = %context.trace_id,
                path = %context.path,
                "Request canceled by the client"
            );
            return None;
        }

        let status = kind.status();
        if status.is_server_error() {
            tracing::error!(
                trace_id = %context.trace_id,
                path = %context.path,
                code = kind.code(),
                error = %error,
                "Unhandled error"
            );
        } else {
            tracing::warn!(
                trace_id = %context.trace_id,
                path = %context.path,
                status = status.as_u16(),
                code = kind.code(),
                "{}",
                kind.title()
            );
        }

        let detail = (status.is_client_error() || self.expose_details).then(|| error.to_string());

        Some(ProblemDetails {
            status: status.as_u16(),
            title: kind.title().to_string(),
            detail,
            instance: context.path.clone(),
            problem_type: format!("https://httpstatuses.com/{}", status.as_u16()),
            code: kind.code().to_string(),
            trace_id: context.trace_id.clone(),
            errors: error.validation().cloned(),
        })
    }

    pub fn into_response(&self, error: &AppError, context: &RequestContext) -> Response {
        let status = error.kind().status();
        match self.problem(error, context) {
            Some(problem) => (
                status,
                [(header::CONTENT_TYPE, PROBLEM_CONTENT_TYPE)],
                Json(problem),
            )
                .into_response(),
            None => status.into_response(),
        }
    }
}

impl Default for ErrorMapper {
    fn default() -> Self {
        Self::new(Environment::Production)
    }
}
