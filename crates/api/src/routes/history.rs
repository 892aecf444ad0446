//! Audit-trail routes.

use std::str::FromStr;

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};

use kardex_core::ledger::{HistoryAction, LedgerError};
use kardex_db::{Deadline, HistoryRepository};
use kardex_shared::Paginated;

use crate::requests::HistoryQuery;
use crate::routes::stock::error_response;
use crate::AppState;

/// Creates the history router.
pub fn routes() -> Router<AppState> {
    Router::new().route("/stock/history", get(list_history))
}

/// GET /stock/history - Paginated audit trail, newest first, with optional
/// organization, item, and action filters.
async fn list_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Response {
    let action = match &query.action {
        Some(tag) => match HistoryAction::from_str(tag) {
            Ok(action) => Some(action),
            Err(tag) => return error_response(&LedgerError::UnknownAction(tag)),
        },
        None => None,
    };

    let window = query.page_request();
    let history = HistoryRepository::new((*state.db).clone());
    match history
        .list(
            query.organization_id,
            query.item_id,
            action,
            &window,
            Deadline::within(state.request_budget),
        )
        .await
    {
        Ok((records, total)) => Json(Paginated::of(records, window, total)).into_response(),
        Err(err) => error_response(&err),
    }
}
