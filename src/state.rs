//! Application state management.

use crate::api::middleware::AdminKey;
use crate::config::AdminConfig;
use crate::db::{DatabasePool, PgSnapshotStore};
use crate::scheduler::SnapshotRunner;
use std::sync::Arc;
use tradier_client::TradierClient;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Snapshot read access.
    pub store: PgSnapshotStore,
    /// Single-flight snapshot runner shared with the scheduler.
    pub runner: Arc<SnapshotRunner>,
    /// Market data client used by the quotes proxy.
    pub tradier: Arc<TradierClient>,
    /// Digest of the configured admin key, if any.
    pub admin_key: Option<AdminKey>,
}

impl AppState {
    /// Creates the application state.
    #[must_use]
    pub fn new(
        admin: &AdminConfig,
        db: &DatabasePool,
        runner: Arc<SnapshotRunner>,
        tradier: Arc<TradierClient>,
    ) -> Self {
        Self {
            store: PgSnapshotStore::new(db),
            runner,
            tradier,
            admin_key: admin.api_key.as_deref().map(AdminKey::new),
        }
    }
}
