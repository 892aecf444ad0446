//! Forward balance replay for a ledger partition tail.
//!
//! The `balance` column is a cache of the prefix scan over a partition. Any
//! edit of a historical entry invalidates that cache from the entry's date
//! onward; replaying the tail from a known pre-tail anchor restores it.
//!
//! Two entry semantics apply during replay:
//! - delta entries advance the running balance by their `amount`;
//! - count entries assert the balance absolutely: the running balance becomes
//!   the counted physical quantity and the entry's `amount` is rewritten to
//!   the difference against the system quantity at that point.

use uuid::Uuid;

use super::types::EntryKind;

/// The mutable projection of a stock entry needed for replay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayEntry {
    /// Entry id, carried through so callers can persist changed rows.
    pub id: Uuid,
    /// The entry kind.
    pub kind: EntryKind,
    /// Signed delta, or the count difference.
    pub amount: i64,
    /// Cached post-entry balance.
    pub balance: i64,
    /// Counted physical quantity (count entries).
    pub physical_qty: Option<i64>,
    /// System quantity at count time (count entries).
    pub system_qty: Option<i64>,
    /// `physical_qty - system_qty` (count entries).
    pub difference: Option<i64>,
}

/// Replays a partition tail forward from `start_balance`, rewriting cached
/// fields in place.
///
/// `tail` must be the live entries of one partition ordered by
/// `(txn_date ASC, created_at ASC)`. Returns the indices of entries whose
/// fields changed, so callers persist only those rows; replaying a tail that
/// is already at its fixed point returns an empty list.
///
/// Count entries missing their stored `physical_qty` are repaired from the
/// cached `balance`, which held the asserted quantity when the count was
/// recorded.
pub fn replay_forward(start_balance: i64, tail: &mut [ReplayEntry]) -> Vec<usize> {
    let mut running = start_balance;
    let mut changed = Vec::new();

    for (index, entry) in tail.iter_mut().enumerate() {
        if entry.kind == EntryKind::Count {
            let physical = entry.physical_qty.unwrap_or(entry.balance);
            let system = running;
            let difference = physical - system;

            let rewritten = ReplayEntry {
                amount: difference,
                balance: physical,
                physical_qty: Some(physical),
                system_qty: Some(system),
                difference: Some(difference),
                ..entry.clone()
            };

            if *entry != rewritten {
                *entry = rewritten;
                changed.push(index);
            }
            running = physical;
        } else {
            running += entry.amount;
            if entry.balance != running {
                entry.balance = running;
                changed.push(index);
            }
        }
    }

    changed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delta(kind: EntryKind, amount: i64, balance: i64) -> ReplayEntry {
        ReplayEntry {
            id: Uuid::new_v4(),
            kind,
            amount,
            balance,
            physical_qty: None,
            system_qty: None,
            difference: None,
        }
    }

    fn count(physical: i64, balance: i64) -> ReplayEntry {
        ReplayEntry {
            id: Uuid::new_v4(),
            kind: EntryKind::Count,
            amount: 0,
            balance,
            physical_qty: Some(physical),
            system_qty: None,
            difference: None,
        }
    }

    #[test]
    fn test_delta_chain_recomputed() {
        // Stored balances are stale after the first amount changed 100 -> 250.
        let mut tail = vec![
            delta(EntryKind::Receipt, 250, 100),
            delta(EntryKind::Issue, -50, 50),
        ];

        let changed = replay_forward(0, &mut tail);

        assert_eq!(changed, vec![0, 1]);
        assert_eq!(tail[0].balance, 250);
        assert_eq!(tail[1].balance, 200);
    }

    #[test]
    fn test_anchor_is_respected() {
        let mut tail = vec![delta(EntryKind::Issue, -20, 0)];

        replay_forward(100, &mut tail);

        assert_eq!(tail[0].balance, 80);
    }

    #[test]
    fn test_count_resets_running_balance() {
        let mut tail = vec![
            delta(EntryKind::Receipt, 100, 100),
            count(120, 0),
            delta(EntryKind::Issue, -10, 0),
        ];

        replay_forward(0, &mut tail);

        assert_eq!(tail[1].system_qty, Some(100));
        assert_eq!(tail[1].difference, Some(20));
        assert_eq!(tail[1].amount, 20);
        assert_eq!(tail[1].balance, 120);
        // Later deltas build on the asserted quantity.
        assert_eq!(tail[2].balance, 110);
    }

    #[test]
    fn test_count_repair_falls_back_to_balance() {
        let mut tail = vec![ReplayEntry {
            id: Uuid::new_v4(),
            kind: EntryKind::Count,
            amount: 0,
            balance: 75,
            physical_qty: None,
            system_qty: None,
            difference: None,
        }];

        replay_forward(50, &mut tail);

        assert_eq!(tail[0].physical_qty, Some(75));
        assert_eq!(tail[0].system_qty, Some(50));
        assert_eq!(tail[0].difference, Some(25));
        assert_eq!(tail[0].balance, 75);
    }

    #[test]
    fn test_fixed_point_is_write_free() {
        let mut tail = vec![
            delta(EntryKind::Receipt, 100, 100),
            count(120, 0),
            delta(EntryKind::Issue, -30, 0),
        ];

        let first = replay_forward(0, &mut tail);
        assert!(!first.is_empty());

        let second = replay_forward(0, &mut tail);
        assert!(second.is_empty(), "second replay must be a no-op");
    }

    #[test]
    fn test_empty_tail() {
        let mut tail: Vec<ReplayEntry> = vec![];
        assert!(replay_forward(40, &mut tail).is_empty());
    }
}
