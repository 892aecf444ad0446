//! History repository for the audit trail.

use kardex_core::ledger::{HistoryAction, LedgerError};
use kardex_shared::PageRequest;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use uuid::Uuid;

use crate::entities::stock_histories;

use super::Deadline;

/// History repository for audit-trail reads.
#[derive(Debug, Clone)]
pub struct HistoryRepository {
    db: DatabaseConnection,
}

impl HistoryRepository {
    /// Creates a new history repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a history record by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails or the deadline expires.
    pub async fn find_by_id(
        &self,
        history_id: Uuid,
        deadline: Deadline,
    ) -> Result<Option<stock_histories::Model>, LedgerError> {
        deadline
            .bound(stock_histories::Entity::find_by_id(history_id).one(&self.db))
            .await
    }

    /// Lists history records, newest first, with optional filters.
    ///
    /// Returns the page of records and the total count of matches.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails or the deadline expires.
    pub async fn list(
        &self,
        organization_id: Option<Uuid>,
        item_id: Option<i64>,
        action: Option<HistoryAction>,
        page: &PageRequest,
        deadline: Deadline,
    ) -> Result<(Vec<stock_histories::Model>, u64), LedgerError> {
        let mut query = stock_histories::Entity::find();

        if let Some(organization_id) = organization_id {
            query = query.filter(stock_histories::Column::OrganizationId.eq(organization_id));
        }
        if let Some(item_id) = item_id {
            query = query.filter(stock_histories::Column::ItemId.eq(item_id));
        }
        if let Some(action) = action {
            let action: crate::entities::sea_orm_active_enums::HistoryAction = action.into();
            query = query.filter(stock_histories::Column::Action.eq(action));
        }

        let total = deadline.bound(query.clone().count(&self.db)).await?;

        let records = deadline
            .bound(
                query
                    .order_by_desc(stock_histories::Column::CreatedAt)
                    .offset(page.offset())
                    .limit(page.size())
                    .all(&self.db),
            )
            .await?;

        Ok((records, total))
    }
}
