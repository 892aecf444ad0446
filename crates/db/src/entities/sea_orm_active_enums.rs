//! Database enum mappings and conversions to the core domain types.

use kardex_core::ledger::{EntryKind, HistoryAction as CoreHistoryAction, MovementSource as CoreMovementSource};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Stock entry kind stored in the `stock_entry_kind` enum column.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "stock_entry_kind")]
#[serde(rename_all = "snake_case")]
pub enum StockEntryKind {
    #[sea_orm(string_value = "first_stock")]
    FirstStock,
    #[sea_orm(string_value = "receipt")]
    Receipt,
    #[sea_orm(string_value = "issue")]
    Issue,
    #[sea_orm(string_value = "mutation")]
    Mutation,
    #[sea_orm(string_value = "count")]
    Count,
}

/// Movement source stored in the `movement_source` enum column.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "movement_source")]
#[serde(rename_all = "snake_case")]
pub enum MovementSource {
    #[sea_orm(string_value = "purchase")]
    Purchase,
    #[sea_orm(string_value = "usage")]
    Usage,
    #[sea_orm(string_value = "adjustment")]
    Adjustment,
    #[sea_orm(string_value = "return")]
    Return,
}

/// Audit action stored in the `history_action` enum column.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "history_action")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HistoryAction {
    #[sea_orm(string_value = "CREATE")]
    Create,
    #[sea_orm(string_value = "MUTATION_IN")]
    MutationIn,
    #[sea_orm(string_value = "MUTATION_OUT")]
    MutationOut,
    #[sea_orm(string_value = "COUNT")]
    Count,
    #[sea_orm(string_value = "UPDATE_BEFORE")]
    UpdateBefore,
    #[sea_orm(string_value = "UPDATE_AFTER")]
    UpdateAfter,
    #[sea_orm(string_value = "DELETE_BEFORE")]
    DeleteBefore,
    #[sea_orm(string_value = "ROLLBACK")]
    Rollback,
}

impl From<StockEntryKind> for EntryKind {
    fn from(kind: StockEntryKind) -> Self {
        match kind {
            StockEntryKind::FirstStock => Self::FirstStock,
            StockEntryKind::Receipt => Self::Receipt,
            StockEntryKind::Issue => Self::Issue,
            StockEntryKind::Mutation => Self::Mutation,
            StockEntryKind::Count => Self::Count,
        }
    }
}

impl From<EntryKind> for StockEntryKind {
    fn from(kind: EntryKind) -> Self {
        match kind {
            EntryKind::FirstStock => Self::FirstStock,
            EntryKind::Receipt => Self::Receipt,
            EntryKind::Issue => Self::Issue,
            EntryKind::Mutation => Self::Mutation,
            EntryKind::Count => Self::Count,
        }
    }
}

impl From<MovementSource> for CoreMovementSource {
    fn from(source: MovementSource) -> Self {
        match source {
            MovementSource::Purchase => Self::Purchase,
            MovementSource::Usage => Self::Usage,
            MovementSource::Adjustment => Self::Adjustment,
            MovementSource::Return => Self::Return,
        }
    }
}

impl From<CoreMovementSource> for MovementSource {
    fn from(source: CoreMovementSource) -> Self {
        match source {
            CoreMovementSource::Purchase => Self::Purchase,
            CoreMovementSource::Usage => Self::Usage,
            CoreMovementSource::Adjustment => Self::Adjustment,
            CoreMovementSource::Return => Self::Return,
        }
    }
}

impl From<HistoryAction> for CoreHistoryAction {
    fn from(action: HistoryAction) -> Self {
        match action {
            HistoryAction::Create => Self::Create,
            HistoryAction::MutationIn => Self::MutationIn,
            HistoryAction::MutationOut => Self::MutationOut,
            HistoryAction::Count => Self::Count,
            HistoryAction::UpdateBefore => Self::UpdateBefore,
            HistoryAction::UpdateAfter => Self::UpdateAfter,
            HistoryAction::DeleteBefore => Self::DeleteBefore,
            HistoryAction::Rollback => Self::Rollback,
        }
    }
}

impl From<CoreHistoryAction> for HistoryAction {
    fn from(action: CoreHistoryAction) -> Self {
        match action {
            CoreHistoryAction::Create => Self::Create,
            CoreHistoryAction::MutationIn => Self::MutationIn,
            CoreHistoryAction::MutationOut => Self::MutationOut,
            CoreHistoryAction::Count => Self::Count,
            CoreHistoryAction::UpdateBefore => Self::UpdateBefore,
            CoreHistoryAction::UpdateAfter => Self::UpdateAfter,
            CoreHistoryAction::DeleteBefore => Self::DeleteBefore,
            CoreHistoryAction::Rollback => Self::Rollback,
        }
    }
}
