//! Snapshot acquisition job.
//!
//! One invocation walks `Gating → FetchingExpirations → per-target
//! {Selecting, FetchingChain, Hashing, Staging} → Committing → Done`, or
//! stops early as skipped. Rows are staged in memory and written in a single
//! transaction after the loop, so no transaction is held across network I/O
//! and a failure anywhere leaves nothing behind.

use crate::db::SnapshotStore;
use crate::snapshot::clock::Clock;
use crate::snapshot::error::JobError;
use crate::snapshot::source::MarketDataSource;
use crate::snapshot::types::{InsertedSnapshot, NewChainSnapshot, RunResult, SkipReason};
use crate::snapshot::{checksum, is_regular_trading_hours, select_closest, select_expiration};
use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

#[cfg(test)]
mod tests;

/// Static inputs of the job.
#[derive(Debug, Clone)]
pub struct JobSettings {
    /// Underlying symbol, e.g. "SPX".
    pub underlying: String,
    /// Target days-to-expiration, processed in this order.
    pub dte_targets: Vec<u32>,
    /// Maximum calendar-day distance between target date and expiration.
    pub tolerance_days: u32,
    /// Exchange timezone used for gating and DTE arithmetic.
    pub timezone: Tz,
    /// Run even outside regular trading hours.
    pub allow_outside_rth: bool,
    /// Fail the whole run when a single chain fetch fails.
    pub abort_on_chain_failure: bool,
}

impl Default for JobSettings {
    fn default() -> Self {
        Self {
            underlying: "SPX".to_string(),
            dte_targets: vec![3, 5, 7],
            tolerance_days: 1,
            timezone: chrono_tz::America::New_York,
            allow_outside_rth: false,
            abort_on_chain_failure: true,
        }
    }
}

/// Periodic option-chain snapshot job.
///
/// Provides no mutual exclusion of its own; overlapping invocations are
/// prevented by [`SnapshotRunner`](crate::scheduler::SnapshotRunner).
pub struct SnapshotJob {
    settings: JobSettings,
    source: Arc<dyn MarketDataSource>,
    store: Arc<dyn SnapshotStore>,
    clock: Arc<dyn Clock>,
}

struct Resolved {
    expiration: NaiveDate,
    closest_match: bool,
}

impl SnapshotJob {
    /// Creates a job from its collaborators.
    #[must_use]
    pub fn new(
        settings: JobSettings,
        source: Arc<dyn MarketDataSource>,
        store: Arc<dyn SnapshotStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            settings,
            source,
            store,
            clock,
        }
    }

    /// Runs one snapshot cycle.
    ///
    /// `force` bypasses the market-hours gate and falls back to the closest
    /// expiration when none lies within tolerance.
    ///
    /// # Errors
    /// [`JobError::DataSourceUnavailable`] when the expirations fetch fails, or
    /// a chain fetch fails while `abort_on_chain_failure` is set.
    /// [`JobError::Persistence`] when the staged rows cannot be committed.
    pub async fn run_once(&self, force: bool) -> Result<RunResult, JobError> {
        let run_id = Uuid::new_v4();
        let now_utc = self.clock.now();
        let now_local: DateTime<Tz> = now_utc.with_timezone(&self.settings.timezone);
        let run_timestamp = now_local.fixed_offset();
        let underlying = self.settings.underlying.as_str();

        if !force && !self.settings.allow_outside_rth && !is_regular_trading_hours(&now_local) {
            info!(
                "snapshot_job: outside RTH; skipping (now={})",
                run_timestamp.to_rfc3339()
            );
            return Ok(RunResult::skipped(run_id, SkipReason::OutsideRth, run_timestamp));
        }

        let expirations = self.source.expirations(underlying).await?;
        if expirations.is_empty() {
            warn!("snapshot_job: no expirations returned for {}", underlying);
            return Ok(RunResult::skipped(run_id, SkipReason::NoExpirations, run_timestamp));
        }

        let today = now_local.date_naive();
        let mut staged: Vec<NewChainSnapshot> = Vec::with_capacity(self.settings.dte_targets.len());
        let mut reports: Vec<(i64, bool)> = Vec::with_capacity(self.settings.dte_targets.len());
        let mut missed = Vec::new();
        let mut failed = Vec::new();

        for &target_dte in &self.settings.dte_targets {
            let Some(resolved) = self.resolve(&expirations, target_dte, today, force) else {
                missed.push(target_dte);
                continue;
            };

            let payload = match self
                .source
                .chain(underlying, resolved.expiration, true)
                .await
            {
                Ok(payload) => payload,
                Err(err) if self.settings.abort_on_chain_failure => return Err(err.into()),
                Err(err) => {
                    warn!(
                        "snapshot_job: chain fetch failed for target_dte={} exp={}: {}",
                        target_dte, resolved.expiration, err
                    );
                    failed.push(target_dte);
                    continue;
                }
            };

            let digest = checksum(&payload);
            reports.push((
                (resolved.expiration - today).num_days(),
                resolved.closest_match,
            ));
            staged.push(NewChainSnapshot {
                run_id,
                ts: now_utc,
                underlying: underlying.to_string(),
                target_dte,
                expiration: resolved.expiration,
                payload,
                checksum: digest,
            });
        }

        let ids = if staged.is_empty() {
            Vec::new()
        } else {
            self.store.insert_snapshots(&staged).await?
        };
        if ids.len() != staged.len() {
            return Err(JobError::Persistence(sqlx::Error::Protocol(format!(
                "store returned {} ids for {} rows",
                ids.len(),
                staged.len()
            ))));
        }

        let inserted: Vec<InsertedSnapshot> = staged
            .into_iter()
            .zip(reports)
            .zip(ids)
            .map(|((row, (actual_dte_days, closest_match)), snapshot_id)| InsertedSnapshot {
                snapshot_id,
                target_dte: row.target_dte,
                expiration: row.expiration,
                actual_dte_days,
                checksum: row.checksum,
                closest_match,
            })
            .collect();

        info!(
            "snapshot_job: run {} stored {} snapshots for {} ({} missed, {} failed)",
            run_id,
            inserted.len(),
            underlying,
            missed.len(),
            failed.len()
        );

        Ok(RunResult {
            run_id,
            skipped: false,
            reason: None,
            run_timestamp,
            inserted,
            missed,
            failed,
        })
    }

    fn resolve(
        &self,
        expirations: &[NaiveDate],
        target_dte: u32,
        today: NaiveDate,
        force: bool,
    ) -> Option<Resolved> {
        if let Some(expiration) =
            select_expiration(expirations, target_dte, today, self.settings.tolerance_days)
        {
            return Some(Resolved {
                expiration,
                closest_match: false,
            });
        }

        if !force {
            warn!(
                "snapshot_job: no expiration found for target_dte={} ({} expirations)",
                target_dte,
                expirations.len()
            );
            return None;
        }

        match select_closest(expirations, target_dte, today) {
            Some(expiration) => {
                warn!(
                    "snapshot_job: no expiration within tolerance for target_dte={}; using closest exp={} (force mode)",
                    target_dte, expiration
                );
                Some(Resolved {
                    expiration,
                    closest_match: true,
                })
            }
            None => {
                warn!("snapshot_job: no expirations available to fall back on");
                None
            }
        }
    }
}
