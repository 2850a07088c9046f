//! Periodic execution of the snapshot job.
//!
//! [`SnapshotRunner`] adds single-flight to [`SnapshotJob`]: the scheduler
//! tick and the admin endpoint share one runner, and a second caller gets
//! [`RunOutcome::Busy`] instead of waiting.

use crate::snapshot::{JobError, RunResult, SnapshotJob};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, error, info, warn};


/// Result of a [`SnapshotRunner::try_run`] call.
#[derive(Debug)]
pub enum RunOutcome {
    /// The job ran to completion (possibly skipped).
    Completed(RunResult),
    /// Another run was in progress; nothing was done.
    Busy,
}

/// Single-flight wrapper around a [`SnapshotJob`].
pub struct SnapshotRunner {
    job: SnapshotJob,
    guard: Mutex<()>,
}

impl SnapshotRunner {
    /// Wraps a job.
    #[must_use]
    pub fn new(job: SnapshotJob) -> Self {
        Self {
            job,
            guard: Mutex::new(()),
        }
    }

    /// Whether a run currently holds the guard.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.guard.try_lock().is_err()
    }

    /// Runs the job unless a run is already in progress.
    ///
    /// # Errors
    /// Propagates the job's [`JobError`].
    pub async fn try_run(&self, force: bool) -> Result<RunOutcome, JobError> {
        let Ok(_permit) = self.guard.try_lock() else {
            debug!("scheduler: run requested while another is in progress");
            return Ok(RunOutcome::Busy);
        };

        self.job.run_once(force).await.map(RunOutcome::Completed)
    }
}

/// Spawns the periodic scheduler task.
///
/// The first tick fires immediately when `run_on_startup` is set, otherwise
/// one full `period` elapses first. Failed runs are logged and the loop
/// continues; late ticks are delayed rather than bunched.
pub fn spawn_scheduler(
    runner: Arc<SnapshotRunner>,
    period: Duration,
    run_on_startup: bool,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            "Starting snapshot scheduler with {}s interval (run_on_startup={})",
            period.as_secs(),
            run_on_startup
        );

        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        if !run_on_startup {
            ticker.tick().await;
        }

        loop {
            ticker.tick().await;

            match runner.try_run(false).await {
                Ok(RunOutcome::Completed(result)) if result.skipped => {
                    debug!(
                        "scheduler: run {} skipped ({})",
                        result.run_id,
                        result
                            .reason
                            .map(|r| r.to_string())
                            .unwrap_or_default()
                    );
                }
                Ok(RunOutcome::Completed(result)) => {
                    debug!(
                        "scheduler: run {} inserted {} snapshots",
                        result.run_id,
                        result.inserted.len()
                    );
                }
                Ok(RunOutcome::Busy) => {
                    warn!("scheduler: previous run still in progress; tick skipped");
                }
                Err(e) => {
                    error!("scheduler: snapshot run failed: {}", e);
                }
            }
        }
    })
}
