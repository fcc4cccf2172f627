use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::validation::{validate_currency_code, validate_not_blank};

/// Account entity: a place money is held, in a single currency
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Account {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub currency: String,
    pub is_archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request payload for creating an account
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(example = json!({
    "name": "Main card",
    "currency": "usd"
}))]
pub struct CreateAccountRequest {
    #[serde(default)]
    #[validate(
        custom(function = "validate_not_blank"),
        length(max = 120, message = "Name must be at most 120 characters")
    )]
    #[schema(max_length = 120, example = "Main card")]
    pub name: String,

    #[serde(default)]
    #[validate(custom(function = "validate_currency_code"))]
    #[schema(min_length = 3, max_length = 3, example = "USD")]
    pub currency: String,
}

/// Account as returned to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountDto {
    pub id: Uuid,
    pub name: String,
    pub currency: String,
    pub is_archived: bool,
}

impl From<Account> for AccountDto {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            name: account.name,
            currency: account.currency,
            is_archived: account.is_archived,
        }
    }
}
