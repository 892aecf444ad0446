//! Ledger domain types for stock movements and audit history.
//!
//! A ledger partition is the pair `(organization_id, item_id)`. Every stock
//! event is one entry in a partition; entries are totally ordered by
//! `(txn_date, created_at)`.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stock entry kind.
///
/// Delta kinds change the running balance by `amount`; a `Count` entry is a
/// balance assertion that resets the running balance to the counted physical
/// quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// Opening stock for a partition (at most one live entry per partition).
    FirstStock,
    /// Goods received; amount must be positive.
    Receipt,
    /// Goods consumed; amount must be negative.
    Issue,
    /// Inter-organization transfer leg; always created in pairs.
    Mutation,
    /// Physical count (stock opname); asserts the balance absolutely.
    Count,
}

impl EntryKind {
    /// Returns the wire tag for this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FirstStock => "first_stock",
            Self::Receipt => "receipt",
            Self::Issue => "issue",
            Self::Mutation => "mutation",
            Self::Count => "count",
        }
    }

    /// Returns true if this kind applies its `amount` as a delta.
    #[must_use]
    pub const fn is_delta(self) -> bool {
        !matches!(self, Self::Count)
    }
}

impl std::str::FromStr for EntryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "first_stock" => Ok(Self::FirstStock),
            "receipt" => Ok(Self::Receipt),
            "issue" => Ok(Self::Issue),
            "mutation" => Ok(Self::Mutation),
            "count" => Ok(Self::Count),
            other => Err(other.to_string()),
        }
    }
}

/// Business source of a stock movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementSource {
    /// Stock purchased from a supplier.
    Purchase,
    /// Stock consumed internally.
    Usage,
    /// Manual correction.
    Adjustment,
    /// Returned goods.
    Return,
}

/// Audit history action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HistoryAction {
    /// A delta entry was created.
    Create,
    /// Destination leg of a mutation.
    MutationIn,
    /// Source leg of a mutation.
    MutationOut,
    /// A physical count was recorded.
    Count,
    /// Partition tail before an update.
    UpdateBefore,
    /// Partition tail after an update.
    UpdateAfter,
    /// Partition tail before a delete.
    DeleteBefore,
    /// A prior state was restored.
    Rollback,
}

impl std::str::FromStr for HistoryAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CREATE" => Ok(Self::Create),
            "MUTATION_IN" => Ok(Self::MutationIn),
            "MUTATION_OUT" => Ok(Self::MutationOut),
            "COUNT" => Ok(Self::Count),
            "UPDATE_BEFORE" => Ok(Self::UpdateBefore),
            "UPDATE_AFTER" => Ok(Self::UpdateAfter),
            "DELETE_BEFORE" => Ok(Self::DeleteBefore),
            "ROLLBACK" => Ok(Self::Rollback),
            other => Err(other.to_string()),
        }
    }
}

/// Which snapshot column of a history record a rollback restores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotSide {
    /// Restore `data_before`.
    Before,
    /// Restore `data_after`.
    After,
}

impl HistoryAction {
    /// Returns the stored tag for this action.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::MutationIn => "MUTATION_IN",
            Self::MutationOut => "MUTATION_OUT",
            Self::Count => "COUNT",
            Self::UpdateBefore => "UPDATE_BEFORE",
            Self::UpdateAfter => "UPDATE_AFTER",
            Self::DeleteBefore => "DELETE_BEFORE",
            Self::Rollback => "ROLLBACK",
        }
    }

    /// Returns true if this action writes its snapshot into `data_before`.
    ///
    /// All other actions snapshot the resulting state into `data_after`.
    #[must_use]
    pub const fn snapshots_before(self) -> bool {
        matches!(self, Self::UpdateBefore | Self::DeleteBefore)
    }

    /// Returns the snapshot side a rollback of this record restores, or
    /// `None` when the action cannot be rolled back.
    #[must_use]
    pub const fn restore_side(self) -> Option<SnapshotSide> {
        match self {
            Self::Create | Self::MutationIn | Self::MutationOut | Self::Count => {
                Some(SnapshotSide::After)
            }
            Self::UpdateBefore | Self::UpdateAfter | Self::DeleteBefore => {
                Some(SnapshotSide::Before)
            }
            Self::Rollback => None,
        }
    }
}

/// Input for creating a delta entry (`first_stock`, `receipt`, `issue`).
///
/// Mutations and counts have dedicated inputs below.
#[derive(Debug, Clone)]
pub struct CreateEntryInput {
    /// The organization holding the stock.
    pub organization_id: Uuid,
    /// The item being moved.
    pub item_id: i64,
    /// When the movement happened.
    pub txn_date: DateTime<FixedOffset>,
    /// Signed quantity change.
    pub amount: i64,
    /// The entry kind.
    pub kind: EntryKind,
    /// The actor recording the movement.
    pub changed_by: String,
    /// Optional audit reason.
    pub reason: Option<String>,
    /// Optional correlation id.
    pub ref_id: Option<Uuid>,
    /// Optional correlation target.
    pub target_id: Option<Uuid>,
    /// Optional business source tag.
    pub source: Option<MovementSource>,
    /// Optional page code metadata.
    pub page_code: Option<String>,
    /// Optional free-form notes.
    pub notes: Option<String>,
}

/// Input for an inter-organization stock transfer.
#[derive(Debug, Clone)]
pub struct MutationInput {
    /// Source organization.
    pub from_organization_id: Uuid,
    /// Destination organization.
    pub to_organization_id: Uuid,
    /// The item being transferred.
    pub item_id: i64,
    /// Quantity to transfer (at least 1).
    pub quantity: i64,
    /// When the transfer happened.
    pub txn_date: DateTime<FixedOffset>,
    /// The actor recording the transfer.
    pub changed_by: String,
    /// Optional audit reason.
    pub reason: Option<String>,
    /// Optional free-form notes.
    pub notes: Option<String>,
}

/// Input for a physical count (stock opname).
#[derive(Debug, Clone)]
pub struct CountInput {
    /// The organization holding the stock.
    pub organization_id: Uuid,
    /// The item being counted.
    pub item_id: i64,
    /// The counted physical quantity.
    pub physical_qty: i64,
    /// When the count was taken.
    pub txn_date: DateTime<FixedOffset>,
    /// The actor recording the count.
    pub changed_by: String,
    /// Optional audit reason.
    pub reason: Option<String>,
    /// Optional correlation id.
    pub ref_id: Option<Uuid>,
    /// Optional free-form notes.
    pub notes: Option<String>,
}

/// Input for a corrective update of an existing entry.
///
/// For count entries the `amount` is interpreted as the intended difference
/// at the new date, not as a raw delta.
#[derive(Debug, Clone)]
pub struct UpdateEntryInput {
    /// The entry to replace.
    pub entry_id: Uuid,
    /// The corrected transaction date.
    pub txn_date: DateTime<FixedOffset>,
    /// The corrected amount.
    pub amount: i64,
    /// The actor recording the correction.
    pub changed_by: String,
    /// Optional audit reason.
    pub reason: Option<String>,
    /// Optional new correlation target.
    pub target_id: Option<Uuid>,
    /// Optional replacement notes.
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_kind_wire_tags_round_trip() {
        for kind in [
            EntryKind::FirstStock,
            EntryKind::Receipt,
            EntryKind::Issue,
            EntryKind::Mutation,
            EntryKind::Count,
        ] {
            assert_eq!(EntryKind::from_str(kind.as_str()).unwrap(), kind);
        }
        assert!(EntryKind::from_str("opname").is_err());
    }

    #[test]
    fn test_count_is_not_delta() {
        assert!(EntryKind::Receipt.is_delta());
        assert!(EntryKind::Mutation.is_delta());
        assert!(!EntryKind::Count.is_delta());
    }

    #[test]
    fn test_restore_side_selection() {
        assert_eq!(
            HistoryAction::Create.restore_side(),
            Some(SnapshotSide::After)
        );
        assert_eq!(
            HistoryAction::MutationOut.restore_side(),
            Some(SnapshotSide::After)
        );
        assert_eq!(
            HistoryAction::UpdateBefore.restore_side(),
            Some(SnapshotSide::Before)
        );
        assert_eq!(
            HistoryAction::UpdateAfter.restore_side(),
            Some(SnapshotSide::Before)
        );
        assert_eq!(
            HistoryAction::DeleteBefore.restore_side(),
            Some(SnapshotSide::Before)
        );
        assert_eq!(HistoryAction::Rollback.restore_side(), None);
    }

    #[test]
    fn test_snapshot_side_of_actions() {
        assert!(HistoryAction::UpdateBefore.snapshots_before());
        assert!(HistoryAction::DeleteBefore.snapshots_before());
        assert!(!HistoryAction::Create.snapshots_before());
        assert!(!HistoryAction::UpdateAfter.snapshots_before());
        assert!(!HistoryAction::Rollback.snapshots_before());
    }
}
