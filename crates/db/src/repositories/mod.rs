//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations, hiding
//! the `SeaORM` implementation details from the rest of the application. The
//! ledger repository additionally acts as the transaction coordinator: every
//! write runs inside one database transaction holding a partition lock, and
//! every store round-trip is bounded by the caller-supplied [`Deadline`].

pub mod history;
pub mod item;
pub mod ledger;
pub mod organization;

pub use history::HistoryRepository;
pub use item::ItemRepository;
pub use ledger::LedgerRepository;
pub use organization::OrganizationRepository;

use std::future::Future;
use std::time::Duration;

use kardex_core::ledger::LedgerError;
use sea_orm::DbErr;
use tokio::time::Instant;

/// Maps a database error into the ledger error space.
pub(crate) fn db_err(err: DbErr) -> LedgerError {
    LedgerError::Database(err.to_string())
}

/// Time budget a caller grants one repository operation.
///
/// The budget is absolute: every store round-trip made on the caller's
/// behalf races the same expiry instant, so a slow early query eats into
/// what later queries may spend. Expiry aborts the enclosing database
/// transaction, which rolls back and leaves no entry or history residue.
#[derive(Debug, Clone, Copy, Default)]
pub struct Deadline(Option<Instant>);

impl Deadline {
    /// No time bound.
    #[must_use]
    pub const fn none() -> Self {
        Self(None)
    }

    /// Expires `budget` from now.
    #[must_use]
    pub fn within(budget: Duration) -> Self {
        Self(Some(Instant::now() + budget))
    }

    /// Expires at the given instant.
    #[must_use]
    pub const fn at(instant: Instant) -> Self {
        Self(Some(instant))
    }

    /// Runs one store round-trip under this deadline.
    ///
    /// Returns `DeadlineExceeded` when the expiry instant passes before the
    /// call completes; an unbounded deadline just awaits the call.
    pub(crate) async fn bound<T, F>(self, call: F) -> Result<T, LedgerError>
    where
        F: Future<Output = Result<T, DbErr>>,
    {
        match self.0 {
            Some(expiry) => match tokio::time::timeout_at(expiry, call).await {
                Ok(result) => result.map_err(db_err),
                Err(_) => Err(LedgerError::DeadlineExceeded),
            },
            None => call.await.map_err(db_err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unbounded_deadline_passes_through() {
        let result: Result<i64, LedgerError> = Deadline::none().bound(async { Ok(7) }).await;
        assert_eq!(result.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_expired_deadline_cuts_off_pending_calls() {
        let deadline = Deadline::at(Instant::now() - Duration::from_millis(1));
        let result: Result<(), LedgerError> = deadline
            .bound(async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            })
            .await;
        assert!(matches!(result, Err(LedgerError::DeadlineExceeded)));
    }

    #[tokio::test]
    async fn test_store_errors_survive_the_wrapper() {
        let result: Result<(), LedgerError> = Deadline::none()
            .bound(async { Err(DbErr::Custom("boom".to_string())) })
            .await;
        assert!(matches!(result, Err(LedgerError::Database(_))));
    }
}
