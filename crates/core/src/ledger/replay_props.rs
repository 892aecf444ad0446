//! Property tests for forward replay.
//!
//! These verify the partition invariants over arbitrary tails:
//! - running-sum balance consistency with count-entry resets
//! - count self-consistency (`difference = physical - system`)
//! - idempotence (a replay at fixed point is write-free)

use proptest::prelude::*;
use uuid::Uuid;

use super::replay::{replay_forward, ReplayEntry};
use super::types::EntryKind;

/// Strategy for one tail entry with arbitrary stale cached fields.
fn entry_strategy() -> impl Strategy<Value = ReplayEntry> {
    let delta = (
        prop_oneof![
            Just(EntryKind::FirstStock),
            Just(EntryKind::Receipt),
            Just(EntryKind::Issue),
            Just(EntryKind::Mutation),
        ],
        -1_000i64..1_000,
        -1_000i64..1_000,
    )
        .prop_map(|(kind, amount, stale_balance)| ReplayEntry {
            id: Uuid::new_v4(),
            kind,
            amount,
            balance: stale_balance,
            physical_qty: None,
            system_qty: None,
            difference: None,
        });

    let count = (0i64..1_000, -1_000i64..1_000, any::<bool>()).prop_map(
        |(physical, stale_balance, has_physical)| ReplayEntry {
            id: Uuid::new_v4(),
            kind: EntryKind::Count,
            amount: 0,
            // A count missing its stored physical quantity repairs from the
            // cached balance, so keep that balance non-degenerate.
            balance: if has_physical { stale_balance } else { physical },
            physical_qty: has_physical.then_some(physical),
            system_qty: None,
            difference: None,
        },
    );

    prop_oneof![4 => delta, 1 => count]
}

fn tail_strategy() -> impl Strategy<Value = Vec<ReplayEntry>> {
    prop::collection::vec(entry_strategy(), 0..40)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// After replay, every entry's balance obeys the delta law, with counts
    /// resetting the running balance to their physical quantity.
    #[test]
    fn prop_balance_consistency(start in -1_000i64..1_000, mut tail in tail_strategy()) {
        replay_forward(start, &mut tail);

        let mut running = start;
        for entry in &tail {
            if entry.kind == EntryKind::Count {
                let physical = entry.physical_qty.expect("replay populates physical_qty");
                prop_assert_eq!(entry.system_qty, Some(running));
                prop_assert_eq!(entry.balance, physical);
                running = physical;
            } else {
                running += entry.amount;
                prop_assert_eq!(entry.balance, running);
            }
        }
    }

    /// Every count entry is self-consistent after replay.
    #[test]
    fn prop_count_self_consistency(start in -1_000i64..1_000, mut tail in tail_strategy()) {
        replay_forward(start, &mut tail);

        for entry in tail.iter().filter(|e| e.kind == EntryKind::Count) {
            let physical = entry.physical_qty.unwrap();
            let system = entry.system_qty.unwrap();
            prop_assert_eq!(entry.difference, Some(physical - system));
            prop_assert_eq!(entry.amount, physical - system);
            prop_assert_eq!(entry.balance, physical);
        }
    }

    /// A second replay with the same anchor reports no changes.
    #[test]
    fn prop_replay_is_idempotent(start in -1_000i64..1_000, mut tail in tail_strategy()) {
        replay_forward(start, &mut tail);
        let second = replay_forward(start, &mut tail);
        prop_assert!(second.is_empty());
    }

    /// The changed-index report is exact: reported entries differ from their
    /// pre-replay state and unreported entries are untouched.
    #[test]
    fn prop_changed_indices_are_exact(start in -1_000i64..1_000, tail in tail_strategy()) {
        let before = tail.clone();
        let mut after = tail;
        let changed = replay_forward(start, &mut after);

        for (index, (old, new)) in before.iter().zip(after.iter()).enumerate() {
            if changed.contains(&index) {
                prop_assert_ne!(old, new);
            } else {
                prop_assert_eq!(old, new);
            }
        }
    }

    /// The final running balance equals the last entry's stored balance.
    #[test]
    fn prop_final_balance_matches_tail_end(start in -1_000i64..1_000, mut tail in tail_strategy()) {
        replay_forward(start, &mut tail);

        let expected = tail.iter().fold(start, |running, entry| {
            if entry.kind == EntryKind::Count {
                entry.physical_qty.unwrap()
            } else {
                running + entry.amount
            }
        });

        let last = tail.last().map_or(start, |entry| entry.balance);
        prop_assert_eq!(last, expected);
    }
}
