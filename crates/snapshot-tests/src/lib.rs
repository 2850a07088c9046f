//! End-to-end test support for the snapshot pipeline.
//!
//! Tests run the real [`TradierClient`] against a `wiremock` server standing
//! in for Tradier, and the real [`SnapshotJob`] against an [`InMemoryStore`]
//! and a [`FixedClock`]. No database or network access is needed.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde_json::{Value, json};
use spx_snapshot_backend::db::SnapshotStore;
use spx_snapshot_backend::snapshot::{FixedClock, JobSettings, NewChainSnapshot, SnapshotJob};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tradier_client::{ClientConfig, RetryPolicy, TradierClient};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Access token the mock server expects.
pub const TEST_TOKEN: &str = "test-token";

/// Snapshot store that keeps rows in memory and assigns sequential ids.
#[derive(Default)]
pub struct InMemoryStore {
    rows: Mutex<Vec<(i64, NewChainSnapshot)>>,
    commits: AtomicUsize,
    fail: AtomicBool,
}

impl InMemoryStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every later insert fail.
    pub fn fail_inserts(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    /// Committed rows with their ids.
    #[must_use]
    pub fn rows(&self) -> Vec<(i64, NewChainSnapshot)> {
        self.rows.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// Number of successful insert calls.
    #[must_use]
    pub fn commits(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SnapshotStore for InMemoryStore {
    async fn insert_snapshots(&self, rows: &[NewChainSnapshot]) -> Result<Vec<i64>, sqlx::Error> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(sqlx::Error::PoolTimedOut);
        }
        let mut stored = self
            .rows
            .lock()
            .map_err(|e| sqlx::Error::Protocol(e.to_string()))?;
        let mut ids = Vec::with_capacity(rows.len());
        for row in rows {
            let id = stored.len() as i64 + 1;
            stored.push((id, row.clone()));
            ids.push(id);
        }
        self.commits.fetch_add(1, Ordering::SeqCst);
        Ok(ids)
    }
}

/// Parses `YYYY-MM-DD`.
///
/// # Panics
/// Panics on malformed input; test fixtures only.
#[must_use]
pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap_or_else(|e| panic!("bad date {s}: {e}"))
}

/// UTC instant for a New York wall-clock time.
///
/// # Panics
/// Panics if the local time does not exist.
#[must_use]
pub fn new_york(y: i32, m: u32, d: u32, hh: u32, mm: u32, ss: u32) -> DateTime<Utc> {
    chrono_tz::America::New_York
        .with_ymd_and_hms(y, m, d, hh, mm, ss)
        .single()
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(|| panic!("ambiguous New York time"))
}

/// Client pointed at `server` with millisecond backoff.
///
/// # Panics
/// Panics if the client cannot be built.
#[must_use]
pub fn test_client(server: &MockServer, max_attempts: u32) -> TradierClient {
    TradierClient::new(ClientConfig {
        base_url: format!("{}/v1", server.uri()),
        access_token: TEST_TOKEN.to_string(),
        lookup_timeout: Duration::from_secs(5),
        chain_timeout: Duration::from_secs(5),
        retry: RetryPolicy {
            max_attempts,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(4),
        },
    })
    .unwrap_or_else(|e| panic!("client: {e}"))
}

/// Job wired to the mock server, the given store and a fixed clock.
#[must_use]
pub fn test_job(
    server: &MockServer,
    store: Arc<InMemoryStore>,
    now: DateTime<Utc>,
    settings: JobSettings,
) -> SnapshotJob {
    SnapshotJob::new(
        settings,
        Arc::new(test_client(server, 3)),
        store,
        Arc::new(FixedClock(now)),
    )
}

/// Expirations body in Tradier's shape.
#[must_use]
pub fn expirations_body(dates: &[&str]) -> Value {
    json!({"expirations": {"date": dates}})
}

/// A small chain body for `expiration`.
#[must_use]
pub fn chain_body(symbol: &str, expiration: &str) -> Value {
    json!({
        "options": {
            "option": [
                {
                    "symbol": format!("{symbol}W-C-6000"),
                    "underlying": symbol,
                    "strike": 6000.0,
                    "option_type": "call",
                    "expiration_date": expiration,
                    "bid": 12.3,
                    "ask": 12.9,
                    "greeks": {"delta": 0.51, "gamma": 0.002, "mid_iv": 0.14}
                },
                {
                    "symbol": format!("{symbol}W-P-6000"),
                    "underlying": symbol,
                    "strike": 6000.0,
                    "option_type": "put",
                    "expiration_date": expiration,
                    "bid": 11.8,
                    "ask": 12.4,
                    "greeks": {"delta": -0.49, "gamma": 0.002, "mid_iv": 0.15}
                }
            ]
        }
    })
}

/// Mounts the expirations endpoint for `symbol`.
pub async fn mount_expirations(server: &MockServer, symbol: &str, dates: &[&str]) {
    Mock::given(method("GET"))
        .and(path("/v1/markets/options/expirations"))
        .and(query_param("symbol", symbol))
        .and(header("authorization", format!("Bearer {TEST_TOKEN}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(expirations_body(dates)))
        .mount(server)
        .await;
}

/// Mounts the chain endpoint for one expiration and returns the body served.
pub async fn mount_chain(server: &MockServer, symbol: &str, expiration: &str) -> Value {
    let body = chain_body(symbol, expiration);
    Mock::given(method("GET"))
        .and(path("/v1/markets/options/chains"))
        .and(query_param("symbol", symbol))
        .and(query_param("expiration", expiration))
        .and(query_param("greeks", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(server)
        .await;
    body
}
