//! Database row types.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use serde_json::Value;
use sqlx::FromRow;
use sqlx::types::Json;
use uuid::Uuid;

/// Snapshot row without its payload, used for listings.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ChainSnapshotSummary {
    /// Surrogate key.
    pub snapshot_id: i64,
    /// Run that produced the row.
    pub run_id: Uuid,
    /// Capture time.
    pub ts: DateTime<Utc>,
    /// Underlying symbol.
    pub underlying: String,
    /// Requested days-to-expiration.
    pub target_dte: i32,
    /// Resolved expiration date.
    pub expiration: NaiveDate,
    /// Hex SHA-256 of the payload.
    pub checksum: String,
}

/// Full snapshot row.
#[derive(Debug, Clone, FromRow)]
pub struct ChainSnapshot {
    /// Surrogate key.
    pub snapshot_id: i64,
    /// Run that produced the row.
    pub run_id: Uuid,
    /// Capture time.
    pub ts: DateTime<Utc>,
    /// Underlying symbol.
    pub underlying: String,
    /// Requested days-to-expiration.
    pub target_dte: i32,
    /// Resolved expiration date.
    pub expiration: NaiveDate,
    /// Raw chain response.
    pub payload_json: Json<Value>,
    /// Hex SHA-256 of the payload.
    pub checksum: String,
}

impl ChainSnapshot {
    /// Recomputes the checksum from the stored payload and compares it.
    #[must_use]
    pub fn checksum_matches(&self) -> bool {
        crate::snapshot::checksum(&self.payload_json.0) == self.checksum
    }
}

/// Filters for snapshot listings.
#[derive(Debug, Clone, Default)]
pub struct SnapshotFilter {
    /// Only rows for this underlying.
    pub underlying: Option<String>,
    /// Only rows for this requested DTE.
    pub target_dte: Option<i32>,
}
