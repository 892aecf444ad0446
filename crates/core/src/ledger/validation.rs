//! Business rule validation for ledger write operations.

use super::error::LedgerError;
use super::types::EntryKind;

/// Validates a delta-entry creation request.
///
/// Only `first_stock`, `receipt`, and `issue` may be created here; mutations
/// and counts have dedicated entry points. Receipts must be positive, issues
/// negative, and no kind accepts a zero amount.
///
/// # Errors
///
/// Returns a `LedgerError` describing the first violated rule.
pub fn validate_create(kind: EntryKind, amount: i64) -> Result<(), LedgerError> {
    if amount == 0 {
        return Err(LedgerError::ZeroAmount);
    }

    match kind {
        EntryKind::Receipt if amount < 0 => Err(LedgerError::AmountSignMismatch {
            kind,
            expected: "positive",
        }),
        EntryKind::Issue if amount > 0 => Err(LedgerError::AmountSignMismatch {
            kind,
            expected: "negative",
        }),
        EntryKind::Mutation | EntryKind::Count => Err(LedgerError::KindNotCreatable(kind)),
        _ => Ok(()),
    }
}

/// Validates a mutation quantity (must be at least 1).
///
/// # Errors
///
/// Returns `InvalidQuantity` when the quantity is below 1.
pub fn validate_mutation_quantity(quantity: i64) -> Result<(), LedgerError> {
    if quantity < 1 {
        return Err(LedgerError::InvalidQuantity(quantity));
    }
    Ok(())
}

/// Validates that the acting user is identified.
///
/// # Errors
///
/// Returns `MissingActor` when the actor string is empty or whitespace.
pub fn validate_actor(actor: &str) -> Result<(), LedgerError> {
    if actor.trim().is_empty() {
        return Err(LedgerError::MissingActor);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_amount_rejected() {
        assert!(matches!(
            validate_create(EntryKind::Receipt, 0),
            Err(LedgerError::ZeroAmount)
        ));
        assert!(matches!(
            validate_create(EntryKind::FirstStock, 0),
            Err(LedgerError::ZeroAmount)
        ));
    }

    #[test]
    fn test_receipt_must_be_positive() {
        assert!(validate_create(EntryKind::Receipt, 100).is_ok());
        assert!(matches!(
            validate_create(EntryKind::Receipt, -100),
            Err(LedgerError::AmountSignMismatch { .. })
        ));
    }

    #[test]
    fn test_issue_must_be_negative() {
        assert!(validate_create(EntryKind::Issue, -30).is_ok());
        assert!(matches!(
            validate_create(EntryKind::Issue, 30),
            Err(LedgerError::AmountSignMismatch { .. })
        ));
    }

    #[test]
    fn test_first_stock_any_sign() {
        assert!(validate_create(EntryKind::FirstStock, 50).is_ok());
        assert!(validate_create(EntryKind::FirstStock, -50).is_ok());
    }

    #[test]
    fn test_dedicated_kinds_rejected() {
        assert!(matches!(
            validate_create(EntryKind::Mutation, 10),
            Err(LedgerError::KindNotCreatable(EntryKind::Mutation))
        ));
        assert!(matches!(
            validate_create(EntryKind::Count, 10),
            Err(LedgerError::KindNotCreatable(EntryKind::Count))
        ));
    }

    #[test]
    fn test_mutation_quantity_floor() {
        assert!(validate_mutation_quantity(1).is_ok());
        assert!(validate_mutation_quantity(150).is_ok());
        assert!(matches!(
            validate_mutation_quantity(0),
            Err(LedgerError::InvalidQuantity(0))
        ));
        assert!(matches!(
            validate_mutation_quantity(-5),
            Err(LedgerError::InvalidQuantity(-5))
        ));
    }

    #[test]
    fn test_actor_must_be_present() {
        assert!(validate_actor("auditor").is_ok());
        assert!(matches!(validate_actor(""), Err(LedgerError::MissingActor)));
        assert!(matches!(
            validate_actor("   "),
            Err(LedgerError::MissingActor)
        ));
    }
}
