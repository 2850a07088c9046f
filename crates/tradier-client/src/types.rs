//! Response types for the Tradier market-data endpoints.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;


// ============================================================================
// Expirations
// ============================================================================

/// Response of `GET /markets/options/expirations`.
///
/// Tradier answers `{"expirations": {"date": [...]}}`, `{"expirations": null}`
/// when nothing is listed, and a bare string when only one date exists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpirationsResponse {
    /// Wrapper object, absent or null when no expirations are listed.
    #[serde(default)]
    pub expirations: Option<ExpirationDates>,
}

/// Inner `expirations` object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpirationDates {
    /// Raw date entries as returned upstream.
    #[serde(default)]
    pub date: OneOrMany,
}

/// A JSON field that may hold a single value or a list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    /// A list of values.
    Many(Vec<Value>),
    /// A single value.
    One(Value),
}

impl Default for OneOrMany {
    fn default() -> Self {
        Self::Many(Vec::new())
    }
}

impl ExpirationsResponse {
    /// Builds a response from ISO-8601 date strings.
    #[must_use]
    pub fn from_dates<S: AsRef<str>>(dates: &[S]) -> Self {
        Self {
            expirations: Some(ExpirationDates {
                date: OneOrMany::Many(
                    dates
                        .iter()
                        .map(|d| Value::String(d.as_ref().to_string()))
                        .collect(),
                ),
            }),
        }
    }

    /// Parsed expiration dates, sorted ascending without duplicates.
    ///
    /// Entries that are not `YYYY-MM-DD` strings are dropped.
    #[must_use]
    pub fn dates(&self) -> Vec<NaiveDate> {
        let raw: Vec<&Value> = match self.expirations.as_ref().map(|e| &e.date) {
            Some(OneOrMany::Many(values)) => values.iter().collect(),
            Some(OneOrMany::One(value)) => vec![value],
            None => Vec::new(),
        };

        let mut dates: Vec<NaiveDate> = raw
            .into_iter()
            .filter_map(Value::as_str)
            .filter_map(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok())
            .collect();
        dates.sort_unstable();
        dates.dedup();
        dates
    }
}

// ============================================================================
// Chains
// ============================================================================

/// Response of `GET /markets/options/chains`, kept as the raw JSON document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChainResponse(pub Value);

impl ChainResponse {
    /// Raw JSON payload.
    #[must_use]
    pub fn payload(&self) -> &Value {
        &self.0
    }

    /// Consumes the response and returns the raw JSON payload.
    #[must_use]
    pub fn into_payload(self) -> Value {
        self.0
    }

    /// Number of option contracts in the chain.
    #[must_use]
    pub fn contract_count(&self) -> usize {
        match self.0.pointer("/options/option") {
            Some(Value::Array(items)) => items.len(),
            Some(Value::Object(_)) => 1,
            _ => 0,
        }
    }
}

// ============================================================================
// Quotes
// ============================================================================

/// Response of `GET /markets/quotes`, kept as the raw JSON document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuotesResponse(pub Value);

impl QuotesResponse {
    /// Raw JSON payload.
    #[must_use]
    pub fn payload(&self) -> &Value {
        &self.0
    }

    /// Quote objects contained in the response.
    #[must_use]
    pub fn quotes(&self) -> Vec<&Value> {
        match self.0.pointer("/quotes/quote") {
            Some(Value::Array(items)) => items.iter().collect(),
            Some(quote @ Value::Object(_)) => vec![quote],
            _ => Vec::new(),
        }
    }

    /// Last trade price for `symbol`, if quoted.
    #[must_use]
    pub fn last_price(&self, symbol: &str) -> Option<f64> {
        self.quotes()
            .into_iter()
            .find(|q| q.get("symbol").and_then(Value::as_str) == Some(symbol))
            .and_then(|q| q.get("last"))
            .and_then(Value::as_f64)
    }
}
