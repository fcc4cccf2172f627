use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Offset/limit window derived from a validated page number and size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub offset: i64,
    pub limit: i64,
}

impl PageRequest {
    /// `page` is 1-based; callers validate `page >= 1` and `page_size >= 1` first.
    pub fn new(page: i64, page_size: i64) -> Self {
        Self {
            offset: (page - 1).saturating_mul(page_size),
            limit: page_size,
        }
    }
}

/// One page of results together with the total number of matches
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PagedResult<T> {
    pub items: Vec<T>,
    pub total_count: i64,
    pub page: i64,
    pub page_size: i64,
}
