//! Organization repository for database operations.
//!
//! Organizations are reference data, read-only to the ledger engine.

use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

use crate::entities::organizations;

/// Organization repository.
#[derive(Debug, Clone)]
pub struct OrganizationRepository {
    db: DatabaseConnection,
}

impl OrganizationRepository {
    /// Creates a new organization repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds an organization by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<organizations::Model>, DbErr> {
        organizations::Entity::find_by_id(id).one(&self.db).await
    }

    /// Finds an organization by code.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_code(&self, code: &str) -> Result<Option<organizations::Model>, DbErr> {
        organizations::Entity::find()
            .filter(organizations::Column::Code.eq(code))
            .one(&self.db)
            .await
    }

    /// Lists all organizations ordered by code.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self) -> Result<Vec<organizations::Model>, DbErr> {
        organizations::Entity::find()
            .order_by_asc(organizations::Column::Code)
            .all(&self.db)
            .await
    }

    /// Checks if a code is already taken.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn code_exists(&self, code: &str) -> Result<bool, DbErr> {
        let count = organizations::Entity::find()
            .filter(organizations::Column::Code.eq(code))
            .count(&self.db)
            .await?;

        Ok(count > 0)
    }

    /// Creates a new organization.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn create(&self, name: &str, code: &str) -> Result<organizations::Model, DbErr> {
        let org = organizations::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            code: Set(code.to_string()),
            created_at: Set(chrono::Utc::now().into()),
        };

        org.insert(&self.db).await
    }
}
