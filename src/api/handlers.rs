//! API request handlers.

use crate::db::{ChainSnapshotSummary, SnapshotFilter};
use crate::error::{ApiError, ErrorResponse};
use crate::models::{
    HealthResponse, QuotesQuery, QuotesResponse, SnapshotDetailResponse, SnapshotListQuery,
    SnapshotListResponse,
};
use crate::scheduler::RunOutcome;
use crate::snapshot::RunResult;
use crate::state::AppState;
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::response::Html;
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::info;

/// Snapshots shown on the HTML index page.
const HOME_PAGE_ROWS: i64 = 20;

/// Health check endpoint.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    ),
    tag = "Health"
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// HTML page listing the latest snapshots.
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Latest snapshots as HTML", body = String, content_type = "text/html"),
        (status = 500, description = "Database error", body = ErrorResponse)
    ),
    tag = "Snapshots"
)]
pub async fn home(State(state): State<Arc<AppState>>) -> Result<Html<String>, ApiError> {
    let rows = state
        .store
        .latest(HOME_PAGE_ROWS, &SnapshotFilter::default())
        .await?;
    Ok(Html(render_home(&rows)))
}

/// Lists the latest snapshot summaries.
#[utoipa::path(
    get,
    path = "/api/chain-snapshots",
    params(SnapshotListQuery),
    responses(
        (status = 200, description = "Latest snapshots, newest first", body = SnapshotListResponse),
        (status = 500, description = "Database error", body = ErrorResponse)
    ),
    tag = "Snapshots"
)]
pub async fn list_chain_snapshots(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SnapshotListQuery>,
) -> Result<Json<SnapshotListResponse>, ApiError> {
    let rows = state
        .store
        .latest(query.effective_limit(), &query.filter())
        .await?;
    Ok(Json(rows.into()))
}

/// Gets one snapshot with its payload.
#[utoipa::path(
    get,
    path = "/api/chain-snapshots/{snapshot_id}",
    params(
        ("snapshot_id" = i64, Path, description = "Snapshot identifier")
    ),
    responses(
        (status = 200, description = "Snapshot with payload", body = SnapshotDetailResponse),
        (status = 404, description = "Snapshot not found", body = ErrorResponse),
        (status = 500, description = "Database error", body = ErrorResponse)
    ),
    tag = "Snapshots"
)]
pub async fn get_chain_snapshot(
    State(state): State<Arc<AppState>>,
    Path(snapshot_id): Path<i64>,
) -> Result<Json<SnapshotDetailResponse>, ApiError> {
    let row = state
        .store
        .get(snapshot_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("snapshot {}", snapshot_id)))?;
    Ok(Json(row.into()))
}

/// Proxies quotes for the given symbols.
#[utoipa::path(
    get,
    path = "/api/quotes",
    params(QuotesQuery),
    responses(
        (status = 200, description = "Upstream quotes", body = QuotesResponse),
        (status = 400, description = "No symbols given", body = ErrorResponse),
        (status = 502, description = "Market data unavailable", body = ErrorResponse)
    ),
    tag = "Market Data"
)]
pub async fn get_quotes(
    State(state): State<Arc<AppState>>,
    Query(query): Query<QuotesQuery>,
) -> Result<Json<QuotesResponse>, ApiError> {
    let symbols = query.symbol_list();
    if symbols.is_empty() {
        return Err(ApiError::InvalidRequest(
            "symbols must list at least one symbol".to_string(),
        ));
    }

    let response = state.tradier.fetch_quotes(&symbols).await?;
    Ok(Json(QuotesResponse {
        symbols,
        quotes: response.0,
    }))
}

/// Runs a forced snapshot immediately.
#[utoipa::path(
    post,
    path = "/api/admin/run-snapshot",
    responses(
        (status = 200, description = "Run finished", body = RunResult),
        (status = 401, description = "Missing or invalid X-API-Key", body = ErrorResponse),
        (status = 403, description = "Admin endpoint disabled", body = ErrorResponse),
        (status = 409, description = "A run is already in progress", body = ErrorResponse),
        (status = 502, description = "Market data unavailable", body = ErrorResponse),
        (status = 500, description = "Database error", body = ErrorResponse)
    ),
    security(("api_key" = [])),
    tag = "Admin"
)]
pub async fn run_snapshot(
    State(state): State<Arc<AppState>>,
) -> Result<Json<RunResult>, ApiError> {
    info!("Admin triggered forced snapshot run");
    match state.runner.try_run(true).await? {
        RunOutcome::Completed(result) => Ok(Json(result)),
        RunOutcome::Busy => Err(ApiError::RunInProgress),
    }
}

fn render_home(rows: &[ChainSnapshotSummary]) -> String {
    let mut html = String::from(
        "<!doctype html>\n<html><head><meta charset=\"utf-8\"><title>SPX chain snapshots</title></head><body>\n\
         <h1>SPX chain snapshots</h1>\n\
         <table border=\"1\" cellpadding=\"4\">\n\
         <tr><th>id</th><th>ts (UTC)</th><th>underlying</th><th>target DTE</th><th>expiration</th><th>checksum</th></tr>\n",
    );

    for row in rows {
        let _ = writeln!(
            html,
            "<tr><td><a href=\"/api/chain-snapshots/{id}\">{id}</a></td><td>{ts}</td><td>{underlying}</td><td>{dte}</td><td>{exp}</td><td><code>{checksum}</code></td></tr>",
            id = row.snapshot_id,
            ts = row.ts.format("%Y-%m-%d %H:%M:%S"),
            underlying = escape_html(&row.underlying),
            dte = row.target_dte,
            exp = row.expiration,
            checksum = escape_html(&row.checksum.chars().take(12).collect::<String>()),
        );
    }

    if rows.is_empty() {
        html.push_str("<tr><td colspan=\"6\">No snapshots yet.</td></tr>\n");
    }
    html.push_str("</table>\n</body></html>\n");
    html
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
