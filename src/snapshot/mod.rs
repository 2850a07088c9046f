//! Option-chain snapshot capture.
//!
//! | Module | Description |
//! |--------|-------------|
//! | `selector` | Expiration choice for a target DTE |
//! | `checksum` | Canonical SHA-256 of a chain payload |
//! | `market_hours` | Regular-trading-hours gate |
//! | `job` | Orchestration of one snapshot run |

mod checksum;
mod clock;
mod error;
mod job;
mod market_hours;
mod selector;
mod source;
mod types;

pub use checksum::{canonical_bytes, canonicalize, checksum};
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::JobError;
pub use job::{JobSettings, SnapshotJob};
pub use market_hours::{RTH_CLOSE, RTH_OPEN, is_regular_trading_hours};
pub use selector::{day_distance, select_closest, select_expiration, target_date};
pub use source::MarketDataSource;
pub use types::{InsertedSnapshot, NewChainSnapshot, RunResult, SkipReason};
