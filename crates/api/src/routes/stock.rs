//! Stock ledger routes: writes through the transaction coordinator and
//! balance/summary reads.

use std::str::FromStr;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use kardex_core::ledger::{
    CountInput, CreateEntryInput, EntryKind, LedgerError, MutationInput, UpdateEntryInput,
};
use kardex_db::{Deadline, LedgerRepository};
use kardex_shared::types::{parse_from_bound, parse_to_bound};
use kardex_shared::Paginated;

use crate::requests::{
    BalanceAtQuery, CreateTransactionRequest, DeleteTransactionRequest, ListTransactionsQuery,
    MutationRequest, OpnameRequest, RollbackRequest, UpdateTransactionRequest,
};
use crate::AppState;

/// Creates the stock router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/stock/transactions", post(create_transaction))
        .route("/stock/transactions", put(update_transaction))
        .route("/stock/transactions/{entry_id}", delete(delete_transaction))
        .route(
            "/stock/transactions/{org_id}/{item_id}",
            get(list_transactions),
        )
        .route("/stock/mutations", post(create_mutation))
        .route("/stock/opname", post(create_opname))
        .route("/stock/rollback", post(rollback))
        .route("/stock/balance/{org_id}/{item_id}", get(current_balance))
        .route("/stock/balance/{org_id}/{item_id}/at", get(balance_at))
        .route(
            "/stock/summary/organization/{org_id}",
            get(organization_summary),
        )
        .route("/stock/summary/item/{item_id}", get(item_summary))
}

/// Maps a ledger error onto its HTTP response.
pub(crate) fn error_response(err: &LedgerError) -> Response {
    if matches!(err, LedgerError::Database(_)) {
        tracing::error!(error = %err, "Ledger operation failed");
    }

    let status = StatusCode::from_u16(err.http_status_code())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(json!({
            "error": err.error_code(),
            "message": err.to_string()
        })),
    )
        .into_response()
}

/// POST /stock/transactions - Create a first-stock, receipt, or issue entry.
async fn create_transaction(
    State(state): State<AppState>,
    Json(payload): Json<CreateTransactionRequest>,
) -> Response {
    let kind = match EntryKind::from_str(&payload.kind) {
        Ok(kind) => kind,
        Err(tag) => return error_response(&LedgerError::UnknownKind(tag)),
    };

    let ledger = LedgerRepository::new((*state.db).clone());
    let input = CreateEntryInput {
        organization_id: payload.organization_id,
        item_id: payload.item_id,
        txn_date: payload.txn_date,
        amount: payload.amount,
        kind,
        changed_by: payload.changed_by,
        reason: payload.reason,
        ref_id: payload.ref_id,
        target_id: payload.target_id,
        source: payload.source,
        page_code: payload.page_code,
        notes: payload.notes,
    };

    match ledger
        .create_entry(input, Deadline::within(state.request_budget))
        .await
    {
        Ok(entry) => {
            info!(
                entry_id = %entry.id,
                org_id = %entry.organization_id,
                item_id = entry.item_id,
                balance = entry.balance,
                "Stock transaction created"
            );
            (StatusCode::CREATED, Json(entry)).into_response()
        }
        Err(err) => error_response(&err),
    }
}

/// POST /stock/mutations - Transfer stock between organizations.
async fn create_mutation(
    State(state): State<AppState>,
    Json(payload): Json<MutationRequest>,
) -> Response {
    let ledger = LedgerRepository::new((*state.db).clone());
    let input = MutationInput {
        from_organization_id: payload.from_organization_id,
        to_organization_id: payload.to_organization_id,
        item_id: payload.item_id,
        quantity: payload.quantity,
        txn_date: payload.txn_date,
        changed_by: payload.changed_by,
        reason: payload.reason,
        notes: payload.notes,
    };

    match ledger
        .create_mutation(input, Deadline::within(state.request_budget))
        .await
    {
        Ok((outgoing, incoming)) => {
            info!(
                ref_id = ?outgoing.ref_id,
                from_org = %payload.from_organization_id,
                to_org = %payload.to_organization_id,
                quantity = payload.quantity,
                "Stock mutation created"
            );
            (
                StatusCode::CREATED,
                Json(json!({
                    "outgoing": outgoing,
                    "incoming": incoming
                })),
            )
                .into_response()
        }
        Err(err) => error_response(&err),
    }
}

/// POST /stock/opname - Record a physical count.
async fn create_opname(
    State(state): State<AppState>,
    Json(payload): Json<OpnameRequest>,
) -> Response {
    let ledger = LedgerRepository::new((*state.db).clone());
    let input = CountInput {
        organization_id: payload.organization_id,
        item_id: payload.item_id,
        physical_qty: payload.physical_qty,
        txn_date: payload.txn_date,
        changed_by: payload.changed_by,
        reason: payload.reason,
        ref_id: payload.ref_id,
        notes: payload.notes,
    };

    match ledger
        .create_count(input, Deadline::within(state.request_budget))
        .await
    {
        Ok(entry) => {
            info!(
                entry_id = %entry.id,
                physical_qty = ?entry.physical_qty,
                difference = ?entry.difference,
                "Stock opname recorded"
            );
            (StatusCode::CREATED, Json(entry)).into_response()
        }
        Err(err) => error_response(&err),
    }
}

/// PUT /stock/transactions - Correct an existing entry.
async fn update_transaction(
    State(state): State<AppState>,
    Json(payload): Json<UpdateTransactionRequest>,
) -> Response {
    let ledger = LedgerRepository::new((*state.db).clone());
    let input = UpdateEntryInput {
        entry_id: payload.entry_id,
        txn_date: payload.txn_date,
        amount: payload.amount,
        changed_by: payload.changed_by,
        reason: payload.reason,
        target_id: payload.target_id,
        notes: payload.notes,
    };

    match ledger
        .update_entry(input, Deadline::within(state.request_budget))
        .await
    {
        Ok(entry) => {
            info!(
                replaced = %payload.entry_id,
                replacement = %entry.id,
                "Stock transaction updated"
            );
            Json(entry).into_response()
        }
        Err(err) => error_response(&err),
    }
}

/// DELETE /stock/transactions/{entry_id} - Soft-delete an entry.
async fn delete_transaction(
    State(state): State<AppState>,
    Path(entry_id): Path<Uuid>,
    Json(payload): Json<DeleteTransactionRequest>,
) -> Response {
    let ledger = LedgerRepository::new((*state.db).clone());

    match ledger
        .delete_entry(
            entry_id,
            &payload.changed_by,
            payload.reason.as_deref(),
            Deadline::within(state.request_budget),
        )
        .await
    {
        Ok(()) => {
            info!(entry_id = %entry_id, "Stock transaction deleted");
            Json(json!({ "status": "deleted", "entry_id": entry_id })).into_response()
        }
        Err(err) => error_response(&err),
    }
}

/// POST /stock/rollback - Restore a prior state from a history record.
async fn rollback(State(state): State<AppState>, Json(payload): Json<RollbackRequest>) -> Response {
    let ledger = LedgerRepository::new((*state.db).clone());

    match ledger
        .rollback(
            payload.history_id,
            &payload.changed_by,
            payload.reason.as_deref(),
            Deadline::within(state.request_budget),
        )
        .await
    {
        Ok(()) => {
            info!(history_id = %payload.history_id, "Ledger state rolled back");
            Json(json!({ "status": "rolled_back", "history_id": payload.history_id }))
                .into_response()
        }
        Err(err) => error_response(&err),
    }
}

/// GET `/stock/balance/{org_id}/{item_id}` - Current balance.
async fn current_balance(
    State(state): State<AppState>,
    Path((org_id, item_id)): Path<(Uuid, i64)>,
) -> Response {
    let ledger = LedgerRepository::new((*state.db).clone());

    match ledger
        .current_balance(org_id, item_id, Deadline::within(state.request_budget))
        .await
    {
        Ok(balance) => Json(json!({
            "organization_id": org_id,
            "item_id": item_id,
            "balance": balance
        }))
        .into_response(),
        Err(err) => error_response(&err),
    }
}

/// GET `/stock/balance/{org_id}/{item_id}/at?date=...` - Historical balance.
async fn balance_at(
    State(state): State<AppState>,
    Path((org_id, item_id)): Path<(Uuid, i64)>,
    Query(query): Query<BalanceAtQuery>,
) -> Response {
    let Some(at) = parse_to_bound(&query.date) else {
        return error_response(&LedgerError::InvalidDate { field: "date" });
    };

    let ledger = LedgerRepository::new((*state.db).clone());
    match ledger
        .balance_at(org_id, item_id, at, Deadline::within(state.request_budget))
        .await
    {
        Ok(balance) => Json(json!({
            "organization_id": org_id,
            "item_id": item_id,
            "date": at,
            "balance": balance
        }))
        .into_response(),
        Err(err) => error_response(&err),
    }
}

/// GET `/stock/transactions/{org_id}/{item_id}` - Paginated listing, newest
/// first. `from`/`to` accept bare dates, expanded to day boundaries.
async fn list_transactions(
    State(state): State<AppState>,
    Path((org_id, item_id)): Path<(Uuid, i64)>,
    Query(query): Query<ListTransactionsQuery>,
) -> Response {
    let from = match &query.from {
        Some(value) => match parse_from_bound(value) {
            Some(ts) => Some(ts),
            None => return error_response(&LedgerError::InvalidDate { field: "from" }),
        },
        None => None,
    };
    let to = match &query.to {
        Some(value) => match parse_to_bound(value) {
            Some(ts) => Some(ts),
            None => return error_response(&LedgerError::InvalidDate { field: "to" }),
        },
        None => None,
    };

    let window = query.page_request();
    let ledger = LedgerRepository::new((*state.db).clone());
    match ledger
        .list_transactions(
            org_id,
            item_id,
            from,
            to,
            &window,
            Deadline::within(state.request_budget),
        )
        .await
    {
        Ok((entries, total)) => Json(Paginated::of(entries, window, total)).into_response(),
        Err(err) => error_response(&err),
    }
}

/// GET `/stock/summary/organization/{org_id}` - Stock of every item in one
/// organization.
async fn organization_summary(
    State(state): State<AppState>,
    Path(org_id): Path<Uuid>,
) -> Response {
    let ledger = LedgerRepository::new((*state.db).clone());

    match ledger
        .organization_summary(org_id, Deadline::within(state.request_budget))
        .await
    {
        Ok(summary) => Json(json!({ "organization_id": org_id, "items": summary })).into_response(),
        Err(err) => error_response(&err),
    }
}

/// GET `/stock/summary/item/{item_id}` - Stock of one item across all
/// organizations.
async fn item_summary(State(state): State<AppState>, Path(item_id): Path<i64>) -> Response {
    let ledger = LedgerRepository::new((*state.db).clone());

    match ledger
        .item_summary(item_id, Deadline::within(state.request_budget))
        .await
    {
        Ok(summary) => {
            Json(json!({ "item_id": item_id, "organizations": summary })).into_response()
        }
        Err(err) => error_response(&err),
    }
}
