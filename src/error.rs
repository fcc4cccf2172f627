use std::collections::BTreeMap;
use std::fmt;

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Field-level validation failures, keyed by the wire name of the field.
///
/// Failures that do not belong to a single field are stored under the empty key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct ValidationDetail(BTreeMap<String, Vec<String>>);

impl ValidationDetail {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single failure not attached to any field.
    pub fn general(message: impl Into<String>) -> Self {
        let mut detail = Self::new();
        detail.add("", message);
        detail
    }

    /// Record a message for `field`, keeping messages distinct per field.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        let field = field.trim();
        let message = message.into();
        let messages = self.0.entry(field.to_string()).or_default();
        if !messages.contains(&message) {
            messages.push(message);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> &BTreeMap<String, Vec<String>> {
        &self.0
    }

    pub fn messages(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }
}

impl fmt::Display for ValidationDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            first = false;
            if field.is_empty() {
                write!(f, "{}", messages.join(", "))?;
            } else {
                write!(f, "{}: {}", field, messages.join(", "))?;
            }
        }
        Ok(())
    }
}

/// Every failure the application can report to a caller.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    InvalidJson(String),

    #[error("One or more validation errors occurred: {0}")]
    Validation(ValidationDetail),

    #[error("{0}")]
    Conflict(String),

    #[error("The request was canceled")]
    Canceled,

    #[error("{0}")]
    InvalidOperation(String),

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Unauthorized(_) => ErrorKind::Unauthorized,
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::BadRequest(_) => ErrorKind::BadRequest,
            AppError::InvalidJson(_) => ErrorKind::InvalidJson,
            AppError::Validation(_) => ErrorKind::Validation,
            AppError::Conflict(_) => ErrorKind::Conflict,
            AppError::Canceled => ErrorKind::Canceled,
            AppError::InvalidOperation(_) | AppError::Internal(_) => ErrorKind::Unhandled,
        }
    }

    pub fn validation(&self) -> Option<&ValidationDetail> {
        match self {
            AppError::Validation(detail) => Some(detail),
            _ => None,
        }
    }
}

/// Closed classification of failures, each with a fixed HTTP status, title and code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Unauthorized,
    NotFound,
    BadRequest,
    InvalidJson,
    Validation,
    Conflict,
    Canceled,
    Unhandled,
}

impl ErrorKind {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::BadRequest | ErrorKind::InvalidJson | ErrorKind::Validation => {
                StatusCode::BAD_REQUEST
            }
            ErrorKind::Conflict => StatusCode::CONFLICT,
            // 499 is not registered with IANA, so it is built from the raw code.
            ErrorKind::Canceled => {
                StatusCode::from_u16(499).unwrap_or(StatusCode::BAD_REQUEST)
            }
            ErrorKind::Unhandled => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            ErrorKind::Unauthorized => "Unauthorized",
            ErrorKind::NotFound => "Not Found",
            ErrorKind::BadRequest => "Bad Request",
            ErrorKind::InvalidJson => "Invalid JSON",
            ErrorKind::Validation => "Validation Failed",
            ErrorKind::Conflict => "Conflict",
            ErrorKind::Canceled => "Client Closed Request",
            ErrorKind::Unhandled => "Internal Server Error",
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::Unauthorized => "auth.unauthorized",
            ErrorKind::NotFound => "common.not_found",
            ErrorKind::BadRequest => "http.bad_request",
            ErrorKind::InvalidJson => "http.invalid_json",
            ErrorKind::Validation => "validation.failed",
            ErrorKind::Conflict => "db.conflict",
            ErrorKind::Canceled => "request.canceled",
            ErrorKind::Unhandled => "common.unhandled",
        }
    }
}
