//! HTTP client library for the Tradier market-data API.
//!
//! This crate provides a typed client for the three endpoints the snapshot
//! service consumes: option expirations, option chains and quotes. Every call
//! carries bearer-token authorization, a per-call timeout and the shared
//! [`RetryPolicy`] (5 attempts, exponential backoff from 0.5s capped at 8s).
//!
//! # Example
//!
//! ```no_run
//! use tradier_client::{ClientConfig, TradierClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), tradier_client::Error> {
//!     let client = TradierClient::new(ClientConfig {
//!         access_token: "my-token".into(),
//!         ..Default::default()
//!     })?;
//!
//!     let expirations = client.fetch_expirations("SPX").await?;
//!     for date in expirations.dates() {
//!         println!("{}", date);
//!     }
//!
//!     Ok(())
//! }
//! ```

mod client;
mod error;
mod retry;
mod types;

pub use client::{ClientConfig, DEFAULT_BASE_URL, TradierClient};
pub use error::Error;
pub use retry::RetryPolicy;
pub use types::*;
