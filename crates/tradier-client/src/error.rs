//! Error types for the Tradier client.

use thiserror::Error;


/// Client error types.
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP request failed before a response was received.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body could not be decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid base URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Client configuration is unusable.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Credentials were rejected (401/403).
    #[error("Unauthorized ({status}): {message}")]
    Unauthorized {
        /// HTTP status code.
        status: u16,
        /// Response body.
        message: String,
    },

    /// Request was rejected as invalid (4xx other than auth, 408 and 429).
    #[error("Request rejected ({status}): {message}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Response body.
        message: String,
    },

    /// Upstream returned a transient error status.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body.
        message: String,
    },

    /// The retry budget was spent without a successful response.
    #[error("Data source unavailable after {attempts} attempts: {last}")]
    RetriesExhausted {
        /// Number of attempts made.
        attempts: u32,
        /// Error returned by the final attempt.
        last: Box<Error>,
    },
}

impl Error {
    /// Classifies an HTTP status code returned by the upstream API.
    #[must_use]
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            401 | 403 => Error::Unauthorized { status, message },
            408 | 429 => Error::Api { status, message },
            400..=499 => Error::Rejected { status, message },
            _ => Error::Api { status, message },
        }
    }

    /// Returns true when another attempt may succeed.
    ///
    /// Transport failures (connect, timeout, broken body) and transient
    /// statuses are retried. Auth failures, validation errors and
    /// undecodable payloads are not.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Http(err) => !err.is_decode() && !err.is_builder(),
            Error::Api { .. } => true,
            Error::Json(_)
            | Error::InvalidUrl(_)
            | Error::InvalidConfig(_)
            | Error::Unauthorized { .. }
            | Error::Rejected { .. }
            | Error::RetriesExhausted { .. } => false,
        }
    }

    /// HTTP status carried by this error, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Unauthorized { status, .. }
            | Error::Rejected { status, .. }
            | Error::Api { status, .. } => Some(*status),
            Error::Http(err) => err.status().map(|s| s.as_u16()),
            Error::RetriesExhausted { last, .. } => last.status(),
            Error::Json(_) | Error::InvalidUrl(_) | Error::InvalidConfig(_) => None,
        }
    }
}
