use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::category::{Category, CategoryDto, CreateCategoryRequest};
use crate::repositories::{CategoryRepository, RepositoryError, Scope};
use crate::services::{cancellable, scoped};
use crate::validation::validate_request;

pub const PARENT_NOT_FOUND: &str = "ParentCategoryNotFound";
pub const PARENT_TYPE_MISMATCH: &str = "ParentAndChildCategoryMustMatch";
pub const CATEGORY_NAME_TAKEN: &str = "CategoryWithTheSameNameAlreadyExists";

/// Trait defining category service operations
#[async_trait]
pub trait CategoryService: Send + Sync {
    /// Create a category, optionally nested under a parent of the same type
    async fn create(
        &self,
        user_id: Uuid,
        request: CreateCategoryRequest,
        cancel: &CancellationToken,
    ) -> Result<CategoryDto, AppError>;

    /// Non-archived categories of the user, ordered by type then name
    async fn list(
        &self,
        user_id: Uuid,
        cancel: &CancellationToken,
    ) -> Result<Vec<CategoryDto>, AppError>;
}

/// Implementation of CategoryService
pub struct CategoryServiceImpl {
    category_repository: Arc<dyn CategoryRepository>,
}

impl CategoryServiceImpl {
    pub fn new(category_repository: Arc<dyn CategoryRepository>) -> Self {
        Self {
            category_repository,
        }
    }
}

#[async_trait]
impl CategoryService for CategoryServiceImpl {
    async fn create(
        &self,
        user_id: Uuid,
        request: CreateCategoryRequest,
        cancel: &CancellationToken,
    ) -> Result<CategoryDto, AppError> {
        validate_request(&request)?;

        // Archived parents are still valid anchors
        if let Some(parent_id) = request.parent_id {
            let parent: Category = scoped::require(
                self.category_repository.as_ref(),
                parent_id,
                user_id,
                Scope::Any,
                PARENT_NOT_FOUND,
                cancel,
            )
            .await?;

            if parent.category_type != request.category_type {
                return Err(AppError::Conflict(PARENT_TYPE_MISMATCH.to_string()));
            }
        }

        let name = request.name.trim().to_string();
        let taken = cancellable(
            cancel,
            self.category_repository
                .exists_with_name(user_id, &name, request.category_type),
        )
        .await??;
        if taken {
            return Err(AppError::Conflict(CATEGORY_NAME_TAKEN.to_string()));
        }

        let now = Utc::now();
        let category = Category {
            id: Uuid::new_v4(),
            user_id,
            name,
            category_type: request.category_type,
            parent_id: request.parent_id,
            is_archived: false,
            created_at: now,
            updated_at: now,
        };

        let created = cancellable(cancel, self.category_repository.create(category))
            .await?
            .map_err(|e| match e {
                RepositoryError::ConstraintViolation(_) => {
                    AppError::Conflict(CATEGORY_NAME_TAKEN.to_string())
                }
                other => other.into(),
            })?;

        tracing::info!(
            user_id = %user_id,
            category_id = %created.id,
            category_type = ?created.category_type,
            parent_id = ?created.parent_id,
            "Category created"
        );

        Ok(created.into())
    }

    async fn list(
        &self,
        user_id: Uuid,
        cancel: &CancellationToken,
    ) -> Result<Vec<CategoryDto>, AppError> {
        let categories =
            cancellable(cancel, self.category_repository.list_active(user_id)).await??;

        tracing::info!(user_id = %user_id, count = categories.len(), "Listed categories");

        Ok(categories.into_iter().map(CategoryDto::from).collect())
    }
}
