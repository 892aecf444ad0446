//! Item repository for database operations.
//!
//! Items are reference data, read-only to the ledger engine.

use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder, Set};

use crate::entities::items;

/// Item repository.
#[derive(Debug, Clone)]
pub struct ItemRepository {
    db: DatabaseConnection,
}

impl ItemRepository {
    /// Creates a new item repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds an item by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: i64) -> Result<Option<items::Model>, DbErr> {
        items::Entity::find_by_id(id).one(&self.db).await
    }

    /// Finds an item by code.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_code(&self, code: &str) -> Result<Option<items::Model>, DbErr> {
        items::Entity::find()
            .filter(items::Column::Code.eq(code))
            .one(&self.db)
            .await
    }

    /// Lists all items ordered by code.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self) -> Result<Vec<items::Model>, DbErr> {
        items::Entity::find()
            .order_by_asc(items::Column::Code)
            .all(&self.db)
            .await
    }

    /// Creates a new item.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn create(&self, code: &str, name: &str, unit: &str) -> Result<items::Model, DbErr> {
        let item = items::ActiveModel {
            code: Set(code.to_string()),
            name: Set(name.to_string()),
            unit: Set(unit.to_string()),
            created_at: Set(chrono::Utc::now().into()),
            ..Default::default()
        };

        item.insert(&self.db).await
    }
}
