//! HTTP client for the Tradier market-data API.

use crate::error::Error;
use crate::retry::RetryPolicy;
use crate::types::{ChainResponse, ExpirationsResponse, QuotesResponse};
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;


/// Default Tradier sandbox endpoint.
pub const DEFAULT_BASE_URL: &str = "https://sandbox.tradier.com/v1";

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the API (e.g., "https://api.tradier.com/v1").
    pub base_url: String,
    /// Bearer access token.
    pub access_token: String,
    /// Timeout for expirations and quotes lookups.
    pub lookup_timeout: Duration,
    /// Timeout for chain fetches, whose payloads are much larger.
    pub chain_timeout: Duration,
    /// Retry budget applied to every call.
    pub retry: RetryPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            access_token: String::new(),
            lookup_timeout: Duration::from_secs(30),
            chain_timeout: Duration::from_secs(60),
            retry: RetryPolicy::default(),
        }
    }
}

/// HTTP client for the Tradier market-data endpoints.
#[derive(Debug, Clone)]
pub struct TradierClient {
    client: Client,
    base_url: Url,
    lookup_timeout: Duration,
    chain_timeout: Duration,
    retry: RetryPolicy,
}

impl TradierClient {
    /// Creates a new client with the given configuration.
    ///
    /// # Errors
    /// Returns error if the base URL or token is invalid, or the HTTP client
    /// cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self, Error> {
        // A trailing slash makes `Url::join` append instead of replace.
        let base_url = Url::parse(&format!("{}/", config.base_url.trim_end_matches('/')))?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.access_token))
            .map_err(|e| Error::InvalidConfig(format!("invalid access token: {}", e)))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let client = Client::builder().default_headers(headers).build()?;

        Ok(Self {
            client,
            base_url,
            lookup_timeout: config.lookup_timeout,
            chain_timeout: config.chain_timeout,
            retry: config.retry,
        })
    }

    /// Creates a client for `base_url` with default timeouts and retries.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn with_token(base_url: &str, access_token: &str) -> Result<Self, Error> {
        Self::new(ClientConfig {
            base_url: base_url.to_string(),
            access_token: access_token.to_string(),
            ..Default::default()
        })
    }

    /// Base URL requests are resolved against.
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    // ========================================================================
    // Options
    // ========================================================================

    /// Lists option expirations for `symbol`.
    ///
    /// # Errors
    /// Returns error if every attempt fails or the request is rejected.
    pub async fn fetch_expirations(&self, symbol: &str) -> Result<ExpirationsResponse, Error> {
        let url = self.endpoint("markets/options/expirations", &[("symbol", symbol)])?;
        self.retry
            .run("fetch_expirations", || {
                self.get_json(url.clone(), self.lookup_timeout)
            })
            .await
    }

    /// Fetches the option chain for `symbol` expiring on `expiration` (YYYY-MM-DD).
    ///
    /// # Errors
    /// Returns error if every attempt fails or the request is rejected.
    pub async fn fetch_chain(
        &self,
        symbol: &str,
        expiration: &str,
        include_greeks: bool,
    ) -> Result<ChainResponse, Error> {
        let greeks = if include_greeks { "true" } else { "false" };
        let url = self.endpoint(
            "markets/options/chains",
            &[
                ("symbol", symbol),
                ("expiration", expiration),
                ("greeks", greeks),
            ],
        )?;
        self.retry
            .run("fetch_chain", || {
                self.get_json(url.clone(), self.chain_timeout)
            })
            .await
    }

    // ========================================================================
    // Quotes
    // ========================================================================

    /// Fetches quotes for a list of symbols.
    ///
    /// # Errors
    /// Returns error if every attempt fails or the request is rejected.
    pub async fn fetch_quotes(&self, symbols: &[String]) -> Result<QuotesResponse, Error> {
        let joined = symbols.join(",");
        let url = self.endpoint("markets/quotes", &[("symbols", joined.as_str())])?;
        self.retry
            .run("fetch_quotes", || {
                self.get_json(url.clone(), self.lookup_timeout)
            })
            .await
    }

    // ========================================================================
    // Internal Helpers
    // ========================================================================

    fn endpoint(&self, path: &str, query: &[(&str, &str)]) -> Result<Url, Error> {
        let mut url = self.base_url.join(path)?;
        url.query_pairs_mut().extend_pairs(query);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url, timeout: Duration) -> Result<T, Error> {
        debug!("GET {}", url);
        let resp = self.client.get(url).timeout(timeout).send().await?;
        self.handle_response(resp).await
    }

    async fn handle_response<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, Error> {
        let status = resp.status();

        if status.is_success() {
            let bytes = resp.bytes().await?;
            Ok(serde_json::from_slice(&bytes)?)
        } else {
            let text = resp.text().await.unwrap_or_default();
            Err(Error::from_status(status.as_u16(), text))
        }
    }
}
