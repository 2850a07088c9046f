//! Market data seam between the snapshot job and the upstream client.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::Value;
use tracing::info;
use tradier_client::{Error, TradierClient};

/// Upstream calls the snapshot job depends on.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Sorted, de-duplicated expirations listed for `symbol`.
    async fn expirations(&self, symbol: &str) -> Result<Vec<NaiveDate>, Error>;

    /// Raw option chain for `symbol` expiring on `expiration`.
    async fn chain(
        &self,
        symbol: &str,
        expiration: NaiveDate,
        include_greeks: bool,
    ) -> Result<Value, Error>;
}

#[async_trait]
impl MarketDataSource for TradierClient {
    async fn expirations(&self, symbol: &str) -> Result<Vec<NaiveDate>, Error> {
        Ok(self.fetch_expirations(symbol).await?.dates())
    }

    async fn chain(
        &self,
        symbol: &str,
        expiration: NaiveDate,
        include_greeks: bool,
    ) -> Result<Value, Error> {
        let expiration = expiration.format("%Y-%m-%d").to_string();
        let chain = self
            .fetch_chain(symbol, &expiration, include_greeks)
            .await?;
        info!(
            "snapshot_job: fetched {} contracts for {} exp={}",
            chain.contract_count(),
            symbol,
            expiration
        );
        Ok(chain.into_payload())
    }
}
