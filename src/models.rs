//! API request and response models.

use crate::db::{ChainSnapshot, ChainSnapshotSummary, SnapshotFilter};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// Listing size used when `limit` is absent.
pub const DEFAULT_LIST_LIMIT: i64 = 50;

/// Largest accepted listing size.
pub const MAX_LIST_LIMIT: i64 = 500;

/// Health check response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Service version.
    pub version: String,
}

/// Query parameters for the snapshot listing.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SnapshotListQuery {
    /// Number of rows, clamped to 1..=500. Defaults to 50.
    pub limit: Option<i64>,
    /// Only rows for this underlying.
    pub underlying: Option<String>,
    /// Only rows for this requested DTE.
    pub target_dte: Option<i32>,
}

impl SnapshotListQuery {
    /// Requested limit clamped to the accepted range.
    #[must_use]
    pub fn effective_limit(&self) -> i64 {
        self.limit
            .unwrap_or(DEFAULT_LIST_LIMIT)
            .clamp(1, MAX_LIST_LIMIT)
    }

    /// Row filter derived from the query.
    #[must_use]
    pub fn filter(&self) -> SnapshotFilter {
        SnapshotFilter {
            underlying: self
                .underlying
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_uppercase),
            target_dte: self.target_dte,
        }
    }
}

/// Snapshot metadata in listings.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SnapshotSummary {
    /// Snapshot identifier.
    pub snapshot_id: i64,
    /// Run that produced the snapshot.
    pub run_id: Uuid,
    /// Capture time (UTC).
    #[schema(value_type = String, format = DateTime)]
    pub ts: DateTime<Utc>,
    /// Underlying symbol.
    pub underlying: String,
    /// Requested days-to-expiration.
    pub target_dte: i32,
    /// Resolved expiration.
    #[schema(value_type = String, format = Date)]
    pub expiration: NaiveDate,
    /// Payload checksum.
    pub checksum: String,
}

impl From<ChainSnapshotSummary> for SnapshotSummary {
    fn from(row: ChainSnapshotSummary) -> Self {
        Self {
            snapshot_id: row.snapshot_id,
            run_id: row.run_id,
            ts: row.ts,
            underlying: row.underlying,
            target_dte: row.target_dte,
            expiration: row.expiration,
            checksum: row.checksum,
        }
    }
}

/// Snapshot listing response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SnapshotListResponse {
    /// Snapshots, newest first.
    pub items: Vec<SnapshotSummary>,
    /// Number of items returned.
    pub count: usize,
}

impl From<Vec<ChainSnapshotSummary>> for SnapshotListResponse {
    fn from(rows: Vec<ChainSnapshotSummary>) -> Self {
        let items: Vec<SnapshotSummary> = rows.into_iter().map(Into::into).collect();
        Self {
            count: items.len(),
            items,
        }
    }
}

/// Full snapshot including the raw chain payload.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SnapshotDetailResponse {
    /// Snapshot metadata.
    #[serde(flatten)]
    pub summary: SnapshotSummary,
    /// Whether the stored payload still hashes to the stored checksum.
    pub checksum_verified: bool,
    /// Raw chain response.
    #[schema(value_type = Object)]
    pub payload: Value,
}

impl From<ChainSnapshot> for SnapshotDetailResponse {
    fn from(row: ChainSnapshot) -> Self {
        let checksum_verified = row.checksum_matches();
        Self {
            summary: SnapshotSummary {
                snapshot_id: row.snapshot_id,
                run_id: row.run_id,
                ts: row.ts,
                underlying: row.underlying,
                target_dte: row.target_dte,
                expiration: row.expiration,
                checksum: row.checksum,
            },
            checksum_verified,
            payload: row.payload_json.0,
        }
    }
}

/// Query parameters for the quotes proxy.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct QuotesQuery {
    /// Comma-separated symbols, e.g. `SPX,VIX`.
    pub symbols: String,
}

impl QuotesQuery {
    /// Trimmed, upper-cased, non-empty symbols in request order.
    #[must_use]
    pub fn symbol_list(&self) -> Vec<String> {
        self.symbols
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_uppercase)
            .collect()
    }
}

/// Quotes proxy response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct QuotesResponse {
    /// Requested symbols.
    pub symbols: Vec<String>,
    /// Upstream quotes body, passed through unchanged.
    #[schema(value_type = Object)]
    pub quotes: Value,
}
