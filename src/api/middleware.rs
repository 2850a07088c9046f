//! API middleware for admin authentication.

use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::warn;

/// Header name for API key.
pub const API_KEY_HEADER: &str = "X-API-Key";

/// SHA-256 digest of the configured admin key.
///
/// Candidates are hashed before comparison, so the check never depends on
/// the length or a common prefix of the secret.
#[derive(Clone)]
pub struct AdminKey([u8; 32]);

impl AdminKey {
    /// Hashes the raw key.
    #[must_use]
    pub fn new(raw: &str) -> Self {
        Self(Self::hash_key(raw))
    }

    fn hash_key(key: &str) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(key.as_bytes());
        hasher.finalize().into()
    }

    /// Whether `candidate` is the configured key.
    #[must_use]
    pub fn verify(&self, candidate: &str) -> bool {
        let digest = Self::hash_key(candidate);
        digest
            .iter()
            .zip(self.0.iter())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }
}

impl std::fmt::Debug for AdminKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AdminKey(..)")
    }
}

/// Admin authentication middleware.
///
/// Returns 403 when no admin key is configured and 401 when the
/// `X-API-Key` header is missing or wrong.
pub async fn require_admin_key(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let Some(ref admin_key) = state.admin_key else {
        return ApiError::Forbidden("admin endpoints are disabled".to_string()).into_response();
    };

    let presented = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok());

    match presented {
        Some(key) if admin_key.verify(key) => next.run(request).await,
        _ => {
            warn!("Rejected admin request to {}", request.uri().path());
            ApiError::Unauthorized.into_response()
        }
    }
}
