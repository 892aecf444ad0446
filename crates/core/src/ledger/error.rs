//! Ledger error types for validation, conflict, and store errors.

use thiserror::Error;
use uuid::Uuid;

use super::types::EntryKind;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// Entry amount cannot be zero.
    #[error("Entry amount cannot be zero")]
    ZeroAmount,

    /// Amount sign does not match the entry kind.
    #[error("{kind:?} amount must be {expected}")]
    AmountSignMismatch {
        /// The offending kind.
        kind: EntryKind,
        /// Human-readable sign expectation.
        expected: &'static str,
    },

    /// Unknown entry kind tag.
    #[error("Unknown entry kind: {0}")]
    UnknownKind(String),

    /// Kind cannot be created through the generic entry point.
    #[error("{0:?} entries have a dedicated entry point")]
    KindNotCreatable(EntryKind),

    /// Mutation quantity must be at least 1.
    #[error("Mutation quantity must be at least 1, got {0}")]
    InvalidQuantity(i64),

    /// A date parameter could not be parsed.
    #[error("{field} must be an RFC 3339 timestamp or a calendar date")]
    InvalidDate {
        /// The offending parameter name.
        field: &'static str,
    },

    /// Unknown history action tag.
    #[error("Unknown history action: {0}")]
    UnknownAction(String),

    /// Actor must be a non-empty string.
    #[error("Actor must not be empty")]
    MissingActor,

    /// History record has no snapshot on the side a rollback must restore.
    #[error("History record {0} has no snapshot to restore")]
    MissingSnapshot(Uuid),

    // ========== Conflict Errors ==========
    /// A live first-stock entry already exists for the partition.
    #[error("First stock already exists for organization {organization_id}, item {item_id}")]
    FirstStockExists {
        /// The partition's organization.
        organization_id: Uuid,
        /// The partition's item.
        item_id: i64,
    },

    // ========== Business Rule Errors ==========
    /// Source organization does not hold enough stock at the transfer date.
    #[error("Insufficient stock in source organization: available {available}, requested {requested}")]
    InsufficientStock {
        /// Balance at the transfer date.
        available: i64,
        /// Quantity requested.
        requested: i64,
    },

    // ========== Not Found Errors ==========
    /// Stock entry not found.
    #[error("Stock entry not found: {0}")]
    EntryNotFound(Uuid),

    /// History record not found.
    #[error("History record not found: {0}")]
    HistoryNotFound(Uuid),

    // ========== Rollback Errors ==========
    /// History action cannot be rolled back.
    #[error("Rollback is not supported for history action {0}")]
    UnsupportedRollback(String),

    // ========== Store Errors ==========
    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// The caller-supplied deadline expired before a store call completed.
    #[error("Deadline exceeded while waiting on the store")]
    DeadlineExceeded,
}

impl LedgerError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::ZeroAmount => "ZERO_AMOUNT",
            Self::AmountSignMismatch { .. } => "AMOUNT_SIGN_MISMATCH",
            Self::UnknownKind(_) => "UNKNOWN_KIND",
            Self::KindNotCreatable(_) => "KIND_NOT_CREATABLE",
            Self::InvalidQuantity(_) => "INVALID_QUANTITY",
            Self::InvalidDate { .. } => "INVALID_DATE",
            Self::UnknownAction(_) => "UNKNOWN_ACTION",
            Self::MissingActor => "MISSING_ACTOR",
            Self::MissingSnapshot(_) => "MISSING_SNAPSHOT",
            Self::FirstStockExists { .. } => "FIRST_STOCK_EXISTS",
            Self::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            Self::EntryNotFound(_) => "ENTRY_NOT_FOUND",
            Self::HistoryNotFound(_) => "HISTORY_NOT_FOUND",
            Self::UnsupportedRollback(_) => "UNSUPPORTED_ROLLBACK",
            Self::Database(_) => "DATABASE_ERROR",
            Self::DeadlineExceeded => "DEADLINE_EXCEEDED",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - validation errors
            Self::ZeroAmount
            | Self::AmountSignMismatch { .. }
            | Self::UnknownKind(_)
            | Self::KindNotCreatable(_)
            | Self::InvalidQuantity(_)
            | Self::InvalidDate { .. }
            | Self::UnknownAction(_)
            | Self::MissingActor
            | Self::MissingSnapshot(_)
            | Self::UnsupportedRollback(_) => 400,

            // 404 Not Found
            Self::EntryNotFound(_) | Self::HistoryNotFound(_) => 404,

            // 409 Conflict
            Self::FirstStockExists { .. } => 409,

            // 422 Unprocessable - business rule violations
            Self::InsufficientStock { .. } => 422,

            // 500 Internal Server Error
            Self::Database(_) => 500,

            // 504 Gateway Timeout - store deadline expired
            Self::DeadlineExceeded => 504,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(LedgerError::ZeroAmount.error_code(), "ZERO_AMOUNT");
        assert_eq!(
            LedgerError::InsufficientStock {
                available: 10,
                requested: 50,
            }
            .error_code(),
            "INSUFFICIENT_STOCK"
        );
        assert_eq!(
            LedgerError::EntryNotFound(Uuid::nil()).error_code(),
            "ENTRY_NOT_FOUND"
        );
    }

    #[test]
    fn test_http_status_codes() {
        assert_eq!(LedgerError::ZeroAmount.http_status_code(), 400);
        assert_eq!(
            LedgerError::EntryNotFound(Uuid::nil()).http_status_code(),
            404
        );
        assert_eq!(
            LedgerError::FirstStockExists {
                organization_id: Uuid::nil(),
                item_id: 1,
            }
            .http_status_code(),
            409
        );
        assert_eq!(
            LedgerError::InsufficientStock {
                available: 0,
                requested: 1,
            }
            .http_status_code(),
            422
        );
        assert_eq!(
            LedgerError::Database("boom".to_string()).http_status_code(),
            500
        );
        assert_eq!(LedgerError::DeadlineExceeded.http_status_code(), 504);
        assert_eq!(LedgerError::InvalidDate { field: "from" }.http_status_code(), 400);
    }

    #[test]
    fn test_error_display() {
        let err = LedgerError::InsufficientStock {
            available: 350,
            requested: 1000,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock in source organization: available 350, requested 1000"
        );

        let err = LedgerError::UnsupportedRollback("ROLLBACK".to_string());
        assert_eq!(
            err.to_string(),
            "Rollback is not supported for history action ROLLBACK"
        );
    }
}
