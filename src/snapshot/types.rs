//! Run summary types produced by the snapshot job.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

/// Why a run ended without fetching any chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Current local time is outside regular trading hours.
    OutsideRth,
    /// The upstream API listed no expirations for the underlying.
    NoExpirations,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OutsideRth => write!(f, "outside_rth"),
            Self::NoExpirations => write!(f, "no_expirations"),
        }
    }
}

/// One persisted snapshot reported back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct InsertedSnapshot {
    /// Storage-assigned identifier.
    pub snapshot_id: i64,
    /// Requested days-to-expiration.
    pub target_dte: u32,
    /// Resolved expiration date.
    #[schema(value_type = String, format = Date)]
    pub expiration: NaiveDate,
    /// Calendar days between the run date and the expiration.
    pub actual_dte_days: i64,
    /// Hex SHA-256 of the chain payload.
    pub checksum: String,
    /// True when tolerance selection missed and the closest expiration was used.
    pub closest_match: bool,
}

/// Structured outcome of one job invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RunResult {
    /// Identifier shared by every row written in this run.
    pub run_id: Uuid,
    /// Whether the run was skipped.
    pub skipped: bool,
    /// Skip reason, when skipped.
    pub reason: Option<SkipReason>,
    /// Run time in the exchange timezone.
    #[schema(value_type = String, format = DateTime)]
    pub run_timestamp: DateTime<FixedOffset>,
    /// Persisted snapshots, in target order.
    pub inserted: Vec<InsertedSnapshot>,
    /// Targets with no expiration within tolerance.
    pub missed: Vec<u32>,
    /// Targets whose chain fetch failed while chain failures are non-fatal.
    pub failed: Vec<u32>,
}

impl RunResult {
    /// A run that stopped before the per-target loop.
    #[must_use]
    pub fn skipped(run_id: Uuid, reason: SkipReason, run_timestamp: DateTime<FixedOffset>) -> Self {
        Self {
            run_id,
            skipped: true,
            reason: Some(reason),
            run_timestamp,
            inserted: Vec::new(),
            missed: Vec::new(),
            failed: Vec::new(),
        }
    }
}

/// Row staged for insertion into `chain_snapshots`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewChainSnapshot {
    /// Run that produced the row.
    pub run_id: Uuid,
    /// Capture time.
    pub ts: DateTime<Utc>,
    /// Underlying symbol.
    pub underlying: String,
    /// Requested days-to-expiration.
    pub target_dte: u32,
    /// Resolved expiration date.
    pub expiration: NaiveDate,
    /// Raw chain response.
    pub payload: Value,
    /// Hex SHA-256 of `payload`.
    pub checksum: String,
}
