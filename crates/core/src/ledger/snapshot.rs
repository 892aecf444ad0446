//! Compact snapshot projections stored in history records.
//!
//! A history record captures the live tail of a partition from the trigger
//! date onward as an ordered JSON array. The projection carries only the
//! fields needed to replay the tail; mutation and count auxiliary fields are
//! rehydrated from the tombstoned originals during rollback.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::types::EntryKind;

/// One entry in a history snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotItem {
    /// Id of the snapshotted entry (tombstone key for rehydration).
    pub entry_id: Uuid,
    /// Transaction date, serialized as RFC 3339 with offset.
    pub txn_date: DateTime<FixedOffset>,
    /// Signed amount at snapshot time.
    pub amount: i64,
    /// Cached balance at snapshot time.
    pub balance: i64,
    /// Entry kind wire tag.
    pub kind: EntryKind,
    /// Correlation id, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ref_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_json_shape() {
        let item = SnapshotItem {
            entry_id: Uuid::nil(),
            txn_date: DateTime::parse_from_rfc3339("2024-01-01T10:00:00+07:00").unwrap(),
            amount: -30,
            balance: 70,
            kind: EntryKind::Issue,
            ref_id: None,
        };

        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["kind"], "issue");
        assert_eq!(json["amount"], -30);
        assert_eq!(json["txn_date"], "2024-01-01T10:00:00+07:00");
        assert!(json.get("ref_id").is_none());
    }

    #[test]
    fn test_snapshot_preserves_offset() {
        let item = SnapshotItem {
            entry_id: Uuid::nil(),
            txn_date: DateTime::parse_from_rfc3339("2024-06-01T09:30:00.000123+00:00").unwrap(),
            amount: 10,
            balance: 10,
            kind: EntryKind::Receipt,
            ref_id: Some(Uuid::nil()),
        };

        let text = serde_json::to_string(&item).unwrap();
        let back: SnapshotItem = serde_json::from_str(&text).unwrap();
        assert_eq!(back, item);
    }
}
