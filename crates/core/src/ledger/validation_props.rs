//! Property tests for write-operation guards.

use proptest::prelude::*;

use super::error::LedgerError;
use super::types::EntryKind;
use super::validation::{validate_create, validate_mutation_quantity};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Receipts accept any positive amount and reject any negative amount.
    #[test]
    fn prop_receipt_sign(amount in 1i64..1_000_000) {
        prop_assert!(validate_create(EntryKind::Receipt, amount).is_ok());
        let is_mismatch = matches!(
            validate_create(EntryKind::Receipt, -amount),
            Err(LedgerError::AmountSignMismatch { .. })
        );
        prop_assert!(is_mismatch);
    }

    /// Issues accept any negative amount and reject any positive amount.
    #[test]
    fn prop_issue_sign(amount in 1i64..1_000_000) {
        prop_assert!(validate_create(EntryKind::Issue, -amount).is_ok());
        let is_mismatch = matches!(
            validate_create(EntryKind::Issue, amount),
            Err(LedgerError::AmountSignMismatch { .. })
        );
        prop_assert!(is_mismatch);
    }

    /// First stock accepts any non-zero amount.
    #[test]
    fn prop_first_stock_any_sign(amount in 1i64..1_000_000) {
        prop_assert!(validate_create(EntryKind::FirstStock, amount).is_ok());
        prop_assert!(validate_create(EntryKind::FirstStock, -amount).is_ok());
    }

    /// Zero is rejected regardless of kind.
    #[test]
    fn prop_zero_always_rejected(kind in prop_oneof![
        Just(EntryKind::FirstStock),
        Just(EntryKind::Receipt),
        Just(EntryKind::Issue),
        Just(EntryKind::Mutation),
        Just(EntryKind::Count),
    ]) {
        prop_assert!(matches!(
            validate_create(kind, 0),
            Err(LedgerError::ZeroAmount)
        ));
    }

    /// Mutation quantities below 1 are rejected, 1 and above accepted.
    #[test]
    fn prop_mutation_quantity_floor(quantity in -1_000i64..1_000) {
        let result = validate_mutation_quantity(quantity);
        if quantity >= 1 {
            prop_assert!(result.is_ok());
        } else {
            prop_assert!(matches!(result, Err(LedgerError::InvalidQuantity(q)) if q == quantity));
        }
    }
}
