use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Type;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::validation::validate_not_blank;

/// Direction of money a category classifies. Expense sorts before Income.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq, PartialOrd, Ord, Hash, Type,
)]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
pub enum CategoryType {
    Expense,
    Income,
}

/// Category entity; categories form a per-user tree through `parent_id`
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub category_type: CategoryType,
    /// Parent of the same user and type; cleared when the parent is removed
    pub parent_id: Option<Uuid>,
    pub is_archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request payload for creating a category
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(example = json!({
    "name": "Groceries",
    "type": "Expense",
    "parentId": null
}))]
pub struct CreateCategoryRequest {
    #[serde(default)]
    #[validate(
        custom(function = "validate_not_blank"),
        length(max = 120, message = "Name must be at most 120 characters")
    )]
    #[schema(max_length = 120, example = "Groceries")]
    pub name: String,

    #[serde(rename = "type")]
    pub category_type: CategoryType,

    pub parent_id: Option<Uuid>,
}

/// Category as returned to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDto {
    pub id: Uuid,
    pub name: String,
    pub category_type: CategoryType,
    pub parent_id: Option<Uuid>,
    pub is_archived: bool,
}

impl From<Category> for CategoryDto {
    fn from(category: Category) -> Self {
        Self {
            id: category.id,
            name: category.name,
            category_type: category.category_type,
            parent_id: category.parent_id,
            is_archived: category.is_archived,
        }
    }
}
