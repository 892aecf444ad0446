//! Request payloads for the stock ledger API.

use chrono::{DateTime, FixedOffset};
use kardex_core::ledger::MovementSource;
use kardex_shared::PageRequest;
use serde::Deserialize;
use uuid::Uuid;

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    20
}

/// Payload for creating a delta transaction.
#[derive(Debug, Deserialize)]
pub struct CreateTransactionRequest {
    pub organization_id: Uuid,
    pub item_id: i64,
    pub txn_date: DateTime<FixedOffset>,
    pub amount: i64,
    /// Wire tag: `first_stock`, `receipt`, or `issue`.
    pub kind: String,
    pub changed_by: String,
    pub reason: Option<String>,
    pub ref_id: Option<Uuid>,
    pub target_id: Option<Uuid>,
    pub source: Option<MovementSource>,
    pub page_code: Option<String>,
    pub notes: Option<String>,
}

/// Payload for an inter-organization transfer.
#[derive(Debug, Deserialize)]
pub struct MutationRequest {
    pub from_organization_id: Uuid,
    pub to_organization_id: Uuid,
    pub item_id: i64,
    pub quantity: i64,
    pub txn_date: DateTime<FixedOffset>,
    pub changed_by: String,
    pub reason: Option<String>,
    pub notes: Option<String>,
}

/// Payload for a physical count.
#[derive(Debug, Deserialize)]
pub struct OpnameRequest {
    pub organization_id: Uuid,
    pub item_id: i64,
    pub physical_qty: i64,
    pub txn_date: DateTime<FixedOffset>,
    pub changed_by: String,
    pub reason: Option<String>,
    pub ref_id: Option<Uuid>,
    pub notes: Option<String>,
}

/// Payload for a corrective update.
#[derive(Debug, Deserialize)]
pub struct UpdateTransactionRequest {
    pub entry_id: Uuid,
    pub txn_date: DateTime<FixedOffset>,
    pub amount: i64,
    pub changed_by: String,
    pub reason: Option<String>,
    pub target_id: Option<Uuid>,
    pub notes: Option<String>,
}

/// Payload accompanying a delete.
#[derive(Debug, Deserialize)]
pub struct DeleteTransactionRequest {
    pub changed_by: String,
    pub reason: Option<String>,
}

/// Payload for restoring a prior state from a history record.
#[derive(Debug, Deserialize)]
pub struct RollbackRequest {
    pub history_id: Uuid,
    pub changed_by: String,
    pub reason: Option<String>,
}

/// Query parameters for transaction listings.
///
/// `from` and `to` accept RFC 3339 timestamps or bare dates; bare dates
/// expand to start of day and end of day respectively.
#[derive(Debug, Deserialize)]
pub struct ListTransactionsQuery {
    pub from: Option<String>,
    pub to: Option<String>,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

impl ListTransactionsQuery {
    /// Builds the clamped page window from the query parameters.
    #[must_use]
    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.limit)
    }
}

/// Query parameter for a historical balance lookup.
#[derive(Debug, Deserialize)]
pub struct BalanceAtQuery {
    /// RFC 3339 timestamp, or a bare date meaning end of that day.
    pub date: String,
}

/// Query parameters for audit-trail listings.
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub organization_id: Option<Uuid>,
    pub item_id: Option<i64>,
    /// History action tag, e.g. `CREATE` or `UPDATE_BEFORE`.
    pub action: Option<String>,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

impl HistoryQuery {
    /// Builds the clamped page window from the query parameters.
    #[must_use]
    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.limit)
    }
}
