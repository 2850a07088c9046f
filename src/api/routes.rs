//! Route configuration.

use crate::api::{handlers, middleware};
use crate::state::AppState;
use axum::Router;
use axum::routing::{get, post};
use std::sync::Arc;


/// Creates the API router.
pub fn create_router(state: Arc<AppState>) -> Router {
    let admin = Router::new()
        .route("/api/admin/run-snapshot", post(handlers::run_snapshot))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::require_admin_key,
        ));

    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // HTML index
        .route("/", get(handlers::home))
        // Snapshots
        .route("/api/chain-snapshots", get(handlers::list_chain_snapshots))
        .route(
            "/api/chain-snapshots/{snapshot_id}",
            get(handlers::get_chain_snapshot),
        )
        // Market data
        .route("/api/quotes", get(handlers::get_quotes))
        // Admin
        .merge(admin)
        .with_state(state)
}
