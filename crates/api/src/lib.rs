//! HTTP API layer with Axum routes.
//!
//! This crate provides:
//! - REST API routes for the stock ledger
//! - Request decoding and date-boundary normalization
//! - Error-to-status mapping for ledger errors

pub mod requests;
pub mod routes;

use axum::Router;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// Store-time budget granted to each request's repository work.
    pub request_budget: Duration,
}

/// Creates the main application router.
#[must_use]
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
