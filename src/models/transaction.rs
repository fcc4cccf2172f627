use chrono::{DateTime, FixedOffset, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::Type;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::category::CategoryType;
use crate::validation::{validate_currency_code, validate_not_nil, validate_positive_amount};

pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Whether a transaction takes money out of or puts money into an account
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq, Hash, Type)]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
pub enum TransactionType {
    Expense,
    Income,
}

impl TransactionType {
    /// A transaction may only be filed under a category of the same direction.
    pub fn matches(self, category_type: CategoryType) -> bool {
        matches!(
            (self, category_type),
            (TransactionType::Expense, CategoryType::Expense)
                | (TransactionType::Income, CategoryType::Income)
        )
    }
}

/// Transaction entity representing a single movement of money on an account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub account_id: Uuid,
    pub transaction_type: TransactionType,
    pub amount: Decimal,
    pub currency: String,
    pub category_id: Option<Uuid>,
    pub occurred_at: DateTime<Utc>,
    pub note: Option<String>,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request payload for creating a transaction
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(example = json!({
    "accountId": "550e8400-e29b-41d4-a716-446655440000",
    "type": "Expense",
    "amount": "42.50",
    "currency": "USD",
    "categoryId": null,
    "occurredAtUtc": "2024-01-15T12:00:00Z",
    "note": "Weekly groceries"
}))]
pub struct CreateTransactionRequest {
    #[validate(custom(function = "validate_not_nil"))]
    pub account_id: Uuid,

    #[serde(rename = "type")]
    pub transaction_type: TransactionType,

    #[validate(custom(function = "validate_positive_amount"))]
    #[schema(value_type = String, example = "42.50")]
    pub amount: Decimal,

    #[serde(default)]
    #[validate(custom(function = "validate_currency_code"))]
    #[schema(min_length = 3, max_length = 3, example = "USD")]
    pub currency: String,

    pub category_id: Option<Uuid>,

    /// Defaults to the time of creation; offsets are converted to UTC
    pub occurred_at_utc: Option<DateTime<FixedOffset>>,

    #[validate(length(max = 500, message = "Note must be at most 500 characters"))]
    #[schema(max_length = 500)]
    pub note: Option<String>,
}

/// Transaction as returned to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDto {
    pub id: Uuid,
    pub account_id: Uuid,
    pub transaction_type: TransactionType,
    #[schema(value_type = String, example = "42.50")]
    pub amount: Decimal,
    pub currency: String,
    pub category_id: Option<Uuid>,
    pub occurred_at_utc: DateTime<Utc>,
    pub note: Option<String>,
}

impl From<Transaction> for TransactionDto {
    fn from(transaction: Transaction) -> Self {
        Self {
            id: transaction.id,
            account_id: transaction.account_id,
            transaction_type: transaction.transaction_type,
            amount: transaction.amount,
            currency: transaction.currency,
            category_id: transaction.category_id,
            occurred_at_utc: transaction.occurred_at,
            note: transaction.note,
        }
    }
}

/// Query parameters for listing transactions
#[derive(Debug, Clone, Serialize, Deserialize, Validate, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
#[validate(schema(function = "validate_time_window", skip_on_field_errors = false))]
pub struct TransactionQuery {
    /// Inclusive lower bound on the occurrence time
    pub from_utc: Option<DateTime<Utc>>,
    /// Inclusive upper bound on the occurrence time
    pub to_utc: Option<DateTime<Utc>>,
    #[serde(rename = "type")]
    pub transaction_type: Option<TransactionType>,
    pub account_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    #[serde(default = "default_page")]
    #[validate(range(min = 1, message = "Page must be greater than 0"))]
    #[param(minimum = 1, default = 1)]
    pub page: i64,
    #[serde(default = "default_page_size")]
    #[validate(range(min = 1, max = 200, message = "PageSize must be between 1 and 200"))]
    #[param(minimum = 1, maximum = 200, default = 20)]
    pub page_size: i64,
}

impl Default for TransactionQuery {
    fn default() -> Self {
        Self {
            from_utc: None,
            to_utc: None,
            transaction_type: None,
            account_id: None,
            category_id: None,
            page: default_page(),
            page_size: default_page_size(),
        }
    }
}

fn default_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    DEFAULT_PAGE_SIZE
}

fn validate_time_window(query: &TransactionQuery) -> Result<(), ValidationError> {
    if let (Some(from), Some(to)) = (query.from_utc, query.to_utc) {
        if from > to {
            let mut error = ValidationError::new("invalid_range");
            error.message = Some("FromUtc must be before ToUtc.".into());
            return Err(error);
        }
    }
    Ok(())
}

/// Predicate selecting a user's live transactions, narrowed by optional filters.
///
/// Filters combine with AND; an absent filter imposes no constraint. The same
/// predicate backs the in-memory store (`matches`) and the SQL query builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionFilter {
    pub user_id: Uuid,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub transaction_type: Option<TransactionType>,
    pub account_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
}

impl TransactionFilter {
    pub fn for_user(user_id: Uuid) -> Self {
        Self {
            user_id,
            from: None,
            to: None,
            transaction_type: None,
            account_id: None,
            category_id: None,
        }
    }

    pub fn from_query(user_id: Uuid, query: &TransactionQuery) -> Self {
        Self {
            user_id,
            from: query.from_utc,
            to: query.to_utc,
            transaction_type: query.transaction_type,
            account_id: query.account_id,
            category_id: query.category_id,
        }
    }

    pub fn matches(&self, transaction: &Transaction) -> bool {
        transaction.user_id == self.user_id
            && !transaction.is_deleted
            && self.from.is_none_or(|from| transaction.occurred_at >= from)
            && self.to.is_none_or(|to| transaction.occurred_at <= to)
            && self
                .transaction_type
                .is_none_or(|t| transaction.transaction_type == t)
            && self
                .account_id
                .is_none_or(|id| transaction.account_id == id)
            && self
                .category_id
                .is_none_or(|id| transaction.category_id == Some(id))
    }
}
