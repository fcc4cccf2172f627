pub mod account_handlers;
pub mod auth_handlers;
pub mod category_handlers;
pub mod error_mapper;
pub mod transaction_handlers;

use axum::http::{HeaderValue, header};

/// `Location` header for a newly created resource
pub(crate) fn location(collection: &str, id: uuid::Uuid) -> [(header::HeaderName, HeaderValue); 1] {
    let value = HeaderValue::from_str(&format!("/api/{}/{}", collection, id))
        .unwrap_or_else(|_| HeaderValue::from_static("/"));
    [(header::LOCATION, value)]
}
