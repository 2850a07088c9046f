//! # SPX Snapshot Backend - Option Chain Capture Service
//!
//! Periodically captures the SPX option chain for a few target
//! days-to-expiration from the [Tradier](https://documentation.tradier.com/)
//! market-data API, stores each chain verbatim in PostgreSQL together with a
//! SHA-256 checksum, and serves the stored history over REST. Built with
//! [Axum](https://crates.io/crates/axum) and documented via
//! [utoipa](https://crates.io/crates/utoipa).
//!
//! ## Key Features
//!
//! - **Scheduled capture**: one run every `snapshot.interval_minutes`,
//!   gated to regular trading hours (09:30-16:00 America/New_York, Mon-Fri).
//!
//! - **DTE targeting**: for each target DTE the nearest listed expiration
//!   within a tolerance window is chosen.
//!
//! - **Integrity**: payloads are hashed over a canonical JSON form, so the
//!   checksum can be recomputed from the stored row at any time.
//!
//! - **All-or-nothing writes**: every row of a run is committed in one
//!   transaction.
//!
//! - **Single-flight**: the scheduler and the admin trigger never overlap.
//!
//! ## Module Structure
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`snapshot`] | Selection, checksum, market hours and the run orchestrator |
//! | [`scheduler`] | Single-flight runner and periodic task |
//! | [`db`] | Connection pool, migrations and snapshot store |
//! | [`api`] | Route handlers, admin middleware and router |
//! | [`config`] | TOML configuration with environment overrides |
//! | [`error`] | API error types with `IntoResponse` implementation |
//! | [`models`] | Request/response DTOs with OpenAPI schemas |
//! | [`state`] | Application state management |
//!
//! ## API Endpoints
//!
//! | Method | Endpoint | Description |
//! |--------|----------|-------------|
//! | GET | `/health` | Health check |
//! | GET | `/` | HTML list of the latest snapshots |
//! | GET | `/api/chain-snapshots` | Latest snapshot summaries |
//! | GET | `/api/chain-snapshots/{snapshot_id}` | One snapshot with payload |
//! | GET | `/api/quotes?symbols=SPX,VIX` | Live quotes proxy |
//! | POST | `/api/admin/run-snapshot` | Forced run (`X-API-Key`) |
//!
//! ## Example Usage
//!
//! ```bash
//! export DATABASE_URL=postgres://localhost/spx
//! export TRADIER_ACCESS_TOKEN=...
//! export ADMIN_API_KEY=change-me
//! cargo run
//!
//! curl http://localhost:8000/api/chain-snapshots?limit=5
//! curl -X POST -H "X-API-Key: change-me" http://localhost:8000/api/admin/run-snapshot
//! ```
//!
//! Swagger UI is served at `/swagger-ui/`.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod scheduler;
pub mod snapshot;
pub mod state;
