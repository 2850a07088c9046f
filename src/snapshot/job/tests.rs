//! Unit tests for the snapshot job.

use super::*;
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde_json::{Value, json};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tradier_client::Error as ClientError;

// ============================================================================
// Fakes
// ============================================================================

#[derive(Default)]
struct FakeSource {
    expirations: Vec<NaiveDate>,
    fail_expirations: bool,
    fail_chain_for: Vec<NaiveDate>,
    expiration_calls: AtomicUsize,
    chain_calls: Mutex<Vec<(String, NaiveDate, bool)>>,
}

#[async_trait]
impl MarketDataSource for FakeSource {
    async fn expirations(&self, _symbol: &str) -> Result<Vec<NaiveDate>, ClientError> {
        self.expiration_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_expirations {
            return Err(ClientError::RetriesExhausted {
                attempts: 5,
                last: Box::new(ClientError::from_status(503, String::new())),
            });
        }
        Ok(self.expirations.clone())
    }

    async fn chain(
        &self,
        symbol: &str,
        expiration: NaiveDate,
        include_greeks: bool,
    ) -> Result<Value, ClientError> {
        self.chain_calls
            .lock()
            .unwrap()
            .push((symbol.to_string(), expiration, include_greeks));
        if self.fail_chain_for.contains(&expiration) {
            return Err(ClientError::from_status(500, "boom".to_string()));
        }
        Ok(json!({
            "options": {"option": [{"symbol": symbol, "expiration_date": expiration.to_string()}]}
        }))
    }
}

#[derive(Default)]
struct FakeStore {
    rows: Mutex<Vec<NewChainSnapshot>>,
    insert_calls: AtomicUsize,
    fail: bool,
    drop_last_id: bool,
}

#[async_trait]
impl SnapshotStore for FakeStore {
    async fn insert_snapshots(&self, rows: &[NewChainSnapshot]) -> Result<Vec<i64>, sqlx::Error> {
        self.insert_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(sqlx::Error::PoolTimedOut);
        }
        let mut stored = self.rows.lock().unwrap();
        let start = stored.len() as i64;
        stored.extend(rows.iter().cloned());
        let mut ids: Vec<i64> = (1..=rows.len() as i64).map(|i| start + i).collect();
        if self.drop_last_id {
            ids.pop();
        }
        Ok(ids)
    }
}

fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn feb_expirations() -> Vec<NaiveDate> {
    vec![d("2026-02-05"), d("2026-02-06"), d("2026-02-09")]
}

/// Tuesday 2026-02-03 10:15 New York (15:15 UTC).
fn tuesday_mid_session() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 2, 3, 15, 15, 0).unwrap()
}

/// Sunday 2026-02-08 12:00 New York.
fn sunday_noon() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 2, 8, 17, 0, 0).unwrap()
}

fn job_with(
    settings: JobSettings,
    source: Arc<FakeSource>,
    store: Arc<FakeStore>,
    now: DateTime<Utc>,
) -> SnapshotJob {
    SnapshotJob::new(settings, source, store, Arc::new(crate::snapshot::FixedClock(now)))
}

// ============================================================================
// Gating
// ============================================================================

#[tokio::test]
async fn test_outside_rth_skips_without_io() {
    let source = Arc::new(FakeSource {
        expirations: feb_expirations(),
        ..Default::default()
    });
    let store = Arc::new(FakeStore::default());
    let job = job_with(JobSettings::default(), source.clone(), store.clone(), sunday_noon());

    let result = job.run_once(false).await.unwrap();

    assert!(result.skipped);
    assert_eq!(result.reason, Some(SkipReason::OutsideRth));
    assert!(result.inserted.is_empty());
    assert_eq!(source.expiration_calls.load(Ordering::SeqCst), 0);
    assert!(source.chain_calls.lock().unwrap().is_empty());
    assert_eq!(store.insert_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_outside_rth_override_runs() {
    let source = Arc::new(FakeSource {
        expirations: vec![d("2026-02-11"), d("2026-02-13"), d("2026-02-15")],
        ..Default::default()
    });
    let store = Arc::new(FakeStore::default());
    let settings = JobSettings {
        allow_outside_rth: true,
        ..Default::default()
    };
    let job = job_with(settings, source.clone(), store.clone(), sunday_noon());

    let result = job.run_once(false).await.unwrap();

    assert!(!result.skipped);
    assert_eq!(result.inserted.len(), 3);
}

#[tokio::test]
async fn test_force_bypasses_gate() {
    let source = Arc::new(FakeSource {
        expirations: vec![d("2026-02-11")],
        ..Default::default()
    });
    let store = Arc::new(FakeStore::default());
    let job = job_with(JobSettings::default(), source.clone(), store.clone(), sunday_noon());

    let result = job.run_once(true).await.unwrap();

    assert!(!result.skipped);
    assert_eq!(source.expiration_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_skip_result_serializes_reason() {
    let job = job_with(
        JobSettings::default(),
        Arc::new(FakeSource::default()),
        Arc::new(FakeStore::default()),
        sunday_noon(),
    );

    let result = job.run_once(false).await.unwrap();
    let json = serde_json::to_value(&result).unwrap();

    assert_eq!(json["skipped"], true);
    assert_eq!(json["reason"], "outside_rth");
    assert_eq!(json["inserted"], json!([]));
    assert!(json["run_timestamp"].as_str().unwrap().ends_with("-05:00"));
}

// ============================================================================
// Expirations
// ============================================================================

#[tokio::test]
async fn test_no_expirations_skips() {
    let source = Arc::new(FakeSource::default());
    let store = Arc::new(FakeStore::default());
    let job = job_with(JobSettings::default(), source.clone(), store.clone(), tuesday_mid_session());

    let result = job.run_once(false).await.unwrap();

    assert!(result.skipped);
    assert_eq!(result.reason, Some(SkipReason::NoExpirations));
    assert!(source.chain_calls.lock().unwrap().is_empty());
    assert_eq!(store.insert_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_expirations_failure_is_fatal() {
    let source = Arc::new(FakeSource {
        fail_expirations: true,
        ..Default::default()
    });
    let store = Arc::new(FakeStore::default());
    let job = job_with(JobSettings::default(), source, store.clone(), tuesday_mid_session());

    let err = job.run_once(false).await.unwrap_err();

    assert!(matches!(err, JobError::DataSourceUnavailable(_)));
    assert_eq!(store.insert_calls.load(Ordering::SeqCst), 0);
}

// ============================================================================
// Per-target Loop
// ============================================================================

#[tokio::test]
async fn test_selection_and_staging() {
    let source = Arc::new(FakeSource {
        expirations: feb_expirations(),
        ..Default::default()
    });
    let store = Arc::new(FakeStore::default());
    let settings = JobSettings {
        dte_targets: vec![3, 10, 2],
        ..Default::default()
    };
    let job = job_with(settings, source.clone(), store.clone(), tuesday_mid_session());

    let result = job.run_once(false).await.unwrap();

    assert!(!result.skipped);
    assert_eq!(result.reason, None);
    assert_eq!(result.missed, vec![10]);
    assert!(result.failed.is_empty());

    let targets: Vec<(u32, NaiveDate, i64)> = result
        .inserted
        .iter()
        .map(|i| (i.target_dte, i.expiration, i.actual_dte_days))
        .collect();
    assert_eq!(
        targets,
        vec![(3, d("2026-02-06"), 3), (2, d("2026-02-05"), 2)]
    );
    assert!(result.inserted.iter().all(|i| !i.closest_match));
    assert_eq!(
        result.inserted.iter().map(|i| i.snapshot_id).collect::<Vec<_>>(),
        vec![1, 2]
    );

    let calls = source.chain_calls.lock().unwrap();
    assert_eq!(calls.len(), 2);
    assert!(calls.iter().all(|(symbol, _, greeks)| symbol == "SPX" && *greeks));

    assert_eq!(store.insert_calls.load(Ordering::SeqCst), 1);
    let rows = store.rows.lock().unwrap();
    assert_eq!(rows.len(), 2);
    for (row, inserted) in rows.iter().zip(&result.inserted) {
        assert_eq!(row.run_id, result.run_id);
        assert_eq!(row.ts, tuesday_mid_session());
        assert_eq!(row.checksum, checksum(&row.payload));
        assert_eq!(row.checksum, inserted.checksum);
    }
}

#[tokio::test]
async fn test_shared_expiration_across_targets() {
    let source = Arc::new(FakeSource {
        expirations: vec![d("2026-02-06")],
        ..Default::default()
    });
    let store = Arc::new(FakeStore::default());
    let settings = JobSettings {
        dte_targets: vec![3, 4],
        ..Default::default()
    };
    let job = job_with(settings, source, store.clone(), tuesday_mid_session());

    let result = job.run_once(false).await.unwrap();

    assert_eq!(result.inserted.len(), 2);
    assert!(result.inserted.iter().all(|i| i.expiration == d("2026-02-06")));
    assert_eq!(result.inserted[0].checksum, result.inserted[1].checksum);
}

#[tokio::test]
async fn test_force_uses_closest_match() {
    let source = Arc::new(FakeSource {
        expirations: feb_expirations(),
        ..Default::default()
    });
    let store = Arc::new(FakeStore::default());
    let settings = JobSettings {
        dte_targets: vec![10],
        ..Default::default()
    };
    let job = job_with(settings, source, store, tuesday_mid_session());

    let result = job.run_once(true).await.unwrap();

    assert!(result.missed.is_empty());
    assert_eq!(result.inserted.len(), 1);
    assert_eq!(result.inserted[0].expiration, d("2026-02-09"));
    assert_eq!(result.inserted[0].actual_dte_days, 6);
    assert!(result.inserted[0].closest_match);
}

#[tokio::test]
async fn test_all_targets_missed_opens_no_transaction() {
    let source = Arc::new(FakeSource {
        expirations: vec![d("2026-03-20")],
        ..Default::default()
    });
    let store = Arc::new(FakeStore::default());
    let job = job_with(JobSettings::default(), source, store.clone(), tuesday_mid_session());

    let result = job.run_once(false).await.unwrap();

    assert!(!result.skipped);
    assert!(result.inserted.is_empty());
    assert_eq!(result.missed, vec![3, 5, 7]);
    assert_eq!(store.insert_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_local_date_used_for_dte() {
    // 2026-02-04 03:30 UTC is still Tuesday 2026-02-03 22:30 in New York.
    let late_utc = Utc.with_ymd_and_hms(2026, 2, 4, 3, 30, 0).unwrap();
    let source = Arc::new(FakeSource {
        expirations: feb_expirations(),
        ..Default::default()
    });
    let settings = JobSettings {
        dte_targets: vec![3],
        tolerance_days: 0,
        ..Default::default()
    };
    let job = job_with(settings, source, Arc::new(FakeStore::default()), late_utc);

    let result = job.run_once(true).await.unwrap();

    assert_eq!(result.inserted[0].expiration, d("2026-02-06"));
    assert!(!result.inserted[0].closest_match);
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn test_chain_failure_aborts_without_writes() {
    let source = Arc::new(FakeSource {
        expirations: feb_expirations(),
        fail_chain_for: vec![d("2026-02-09")],
        ..Default::default()
    });
    let store = Arc::new(FakeStore::default());
    let settings = JobSettings {
        dte_targets: vec![3, 6],
        ..Default::default()
    };
    let job = job_with(settings, source, store.clone(), tuesday_mid_session());

    let err = job.run_once(false).await.unwrap_err();

    assert!(matches!(err, JobError::DataSourceUnavailable(_)));
    assert_eq!(store.insert_calls.load(Ordering::SeqCst), 0);
    assert!(store.rows.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_chain_failure_tolerated_when_configured() {
    let source = Arc::new(FakeSource {
        expirations: feb_expirations(),
        fail_chain_for: vec![d("2026-02-09")],
        ..Default::default()
    });
    let store = Arc::new(FakeStore::default());
    let settings = JobSettings {
        dte_targets: vec![6, 3],
        abort_on_chain_failure: false,
        ..Default::default()
    };
    let job = job_with(settings, source, store.clone(), tuesday_mid_session());

    let result = job.run_once(false).await.unwrap();

    assert_eq!(result.failed, vec![6]);
    assert_eq!(result.inserted.len(), 1);
    assert_eq!(result.inserted[0].target_dte, 3);
    assert_eq!(store.rows.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_persistence_failure_is_fatal() {
    let source = Arc::new(FakeSource {
        expirations: feb_expirations(),
        ..Default::default()
    });
    let store = Arc::new(FakeStore {
        fail: true,
        ..Default::default()
    });
    let job = job_with(JobSettings::default(), source, store.clone(), tuesday_mid_session());

    let err = job.run_once(false).await.unwrap_err();

    assert!(matches!(err, JobError::Persistence(_)));
    assert_eq!(store.insert_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_missing_ids_from_store_are_fatal() {
    let source = Arc::new(FakeSource {
        expirations: feb_expirations(),
        ..Default::default()
    });
    let store = Arc::new(FakeStore {
        drop_last_id: true,
        ..Default::default()
    });
    let job = job_with(JobSettings::default(), source, store, tuesday_mid_session());

    let err = job.run_once(false).await.unwrap_err();

    match err {
        JobError::Persistence(sqlx::Error::Protocol(msg)) => {
            assert_eq!(msg, "store returned 2 ids for 3 rows");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
