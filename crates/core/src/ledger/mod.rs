//! Append-only stock ledger logic.
//!
//! This module implements the core ledger functionality:
//! - Entry kinds (deltas and physical-count assertions)
//! - Write inputs for the transaction coordinator
//! - Business rule validation
//! - Forward balance replay after corrective edits
//! - History snapshot projections
//! - Error types for ledger operations

pub mod error;
pub mod replay;
pub mod snapshot;
pub mod types;
pub mod validation;

#[cfg(test)]
mod replay_props;
#[cfg(test)]
mod validation_props;

pub use error::LedgerError;
pub use replay::{replay_forward, ReplayEntry};
pub use snapshot::SnapshotItem;
pub use types::{
    CountInput, CreateEntryInput, EntryKind, HistoryAction, MovementSource, MutationInput,
    SnapshotSide, UpdateEntryInput,
};
pub use validation::{validate_actor, validate_create, validate_mutation_quantity};
