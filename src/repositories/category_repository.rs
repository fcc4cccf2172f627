use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::category::{Category, CategoryType};
use crate::repositories::{RepositoryError, Scope, ScopedLookup};

const CATEGORY_COLUMNS: &str =
    "id, user_id, name, category_type, parent_id, is_archived, created_at, updated_at";

/// Trait defining category repository operations
#[async_trait]
pub trait CategoryRepository: ScopedLookup<Category> {
    /// Insert a new category; a taken (user, name, type) triple is a constraint violation
    async fn create(&self, category: Category) -> Result<Category, RepositoryError>;

    /// Whether the user already has a category with this name and type
    async fn exists_with_name(
        &self,
        user_id: Uuid,
        name: &str,
        category_type: CategoryType,
    ) -> Result<bool, RepositoryError>;

    /// Non-archived categories of a user, ordered by type then name
    async fn list_active(&self, user_id: Uuid) -> Result<Vec<Category>, RepositoryError>;
}

/// PostgreSQL implementation of CategoryRepository
pub struct PostgresCategoryRepository {
    pool: PgPool,
}

impl PostgresCategoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ScopedLookup<Category> for PostgresCategoryRepository {
    async fn find_owned(
        &self,
        id: Uuid,
        user_id: Uuid,
        scope: Scope,
    ) -> Result<Option<Category>, RepositoryError> {
        let sql = format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories \
             WHERE id = $1 AND user_id = $2 AND ($3 = FALSE OR is_archived = FALSE)"
        );

        let category = sqlx::query_as::<_, Category>(&sql)
            .bind(id)
            .bind(user_id)
            .bind(scope == Scope::Active)
            .fetch_optional(&self.pool)
            .await?;

        Ok(category)
    }
}

#[async_trait]
impl CategoryRepository for PostgresCategoryRepository {
    async fn create(&self, category: Category) -> Result<Category, RepositoryError> {
        let sql = format!(
            "INSERT INTO categories \
                (id, user_id, name, category_type, parent_id, is_archived, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {CATEGORY_COLUMNS}"
        );

        let created = sqlx::query_as::<_, Category>(&sql)
            .bind(category.id)
            .bind(category.user_id)
            .bind(&category.name)
            .bind(category.category_type)
            .bind(category.parent_id)
            .bind(category.is_archived)
            .bind(category.created_at)
            .bind(category.updated_at)
            .fetch_one(&self.pool)
            .await?;

        Ok(created)
    }

    async fn exists_with_name(
        &self,
        user_id: Uuid,
        name: &str,
        category_type: CategoryType,
    ) -> Result<bool, RepositoryError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (\
                SELECT 1 FROM categories \
                WHERE user_id = $1 AND name = $2 AND category_type = $3)",
        )
        .bind(user_id)
        .bind(name)
        .bind(category_type)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn list_active(&self, user_id: Uuid) -> Result<Vec<Category>, RepositoryError> {
        // 'expense' < 'income' byte-wise, which is the declared enum order
        let sql = format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories \
             WHERE user_id = $1 AND is_archived = FALSE \
             ORDER BY category_type COLLATE \"C\" ASC, name COLLATE \"C\" ASC"
        );

        let categories = sqlx::query_as::<_, Category>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(categories)
    }
}
