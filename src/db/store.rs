//! Snapshot persistence.

use crate::db::{ChainSnapshot, ChainSnapshotSummary, DatabasePool, SnapshotFilter};
use crate::snapshot::NewChainSnapshot;
use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::debug;

/// Write seam used by the snapshot job.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Inserts every row in one transaction and returns the assigned ids in
    /// input order. Either all rows are committed or none are.
    async fn insert_snapshots(&self, rows: &[NewChainSnapshot]) -> Result<Vec<i64>, sqlx::Error>;
}

/// PostgreSQL-backed snapshot store.
#[derive(Debug, Clone)]
pub struct PgSnapshotStore {
    pool: PgPool,
}

impl PgSnapshotStore {
    /// Creates a store on top of an existing pool.
    #[must_use]
    pub fn new(db: &DatabasePool) -> Self {
        Self {
            pool: db.pool().clone(),
        }
    }

    /// Latest snapshot summaries, newest first.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn latest(
        &self,
        limit: i64,
        filter: &SnapshotFilter,
    ) -> Result<Vec<ChainSnapshotSummary>, sqlx::Error> {
        let mut builder = QueryBuilder::<Postgres>::new(
            "SELECT snapshot_id, run_id, ts, underlying, target_dte, expiration, checksum \
             FROM chain_snapshots WHERE TRUE",
        );
        if let Some(ref underlying) = filter.underlying {
            builder.push(" AND underlying = ").push_bind(underlying);
        }
        if let Some(target_dte) = filter.target_dte {
            builder.push(" AND target_dte = ").push_bind(target_dte);
        }
        builder
            .push(" ORDER BY ts DESC, snapshot_id DESC LIMIT ")
            .push_bind(limit);

        builder
            .build_query_as::<ChainSnapshotSummary>()
            .fetch_all(&self.pool)
            .await
    }

    /// Full snapshot row by id.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn get(&self, snapshot_id: i64) -> Result<Option<ChainSnapshot>, sqlx::Error> {
        sqlx::query_as::<_, ChainSnapshot>(
            r#"
            SELECT snapshot_id, run_id, ts, underlying, target_dte, expiration, payload_json, checksum
            FROM chain_snapshots
            WHERE snapshot_id = $1
            "#,
        )
        .bind(snapshot_id)
        .fetch_optional(&self.pool)
        .await
    }
}

#[async_trait]
impl SnapshotStore for PgSnapshotStore {
    async fn insert_snapshots(&self, rows: &[NewChainSnapshot]) -> Result<Vec<i64>, sqlx::Error> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let target_dtes = rows
            .iter()
            .map(|row| i32::try_from(row.target_dte))
            .collect::<Result<Vec<i32>, _>>()
            .map_err(|e| sqlx::Error::Encode(Box::new(e)))?;

        let mut builder = QueryBuilder::<Postgres>::new(
            "INSERT INTO chain_snapshots \
             (run_id, ts, underlying, target_dte, expiration, payload_json, checksum) ",
        );
        builder.push_values(rows.iter().zip(target_dtes), |mut b, (row, target_dte)| {
            b.push_bind(row.run_id)
                .push_bind(row.ts)
                .push_bind(&row.underlying)
                .push_bind(target_dte)
                .push_bind(row.expiration)
                .push_bind(Json(&row.payload))
                .push_bind(&row.checksum);
        });
        builder.push(" RETURNING snapshot_id");

        let mut tx = self.pool.begin().await?;
        let mut ids: Vec<i64> = builder
            .build_query_scalar()
            .fetch_all(&mut *tx)
            .await?;
        tx.commit().await?;

        // The sequence hands out ids in VALUES order; RETURNING order is not guaranteed.
        ids.sort_unstable();

        debug!("Committed {} chain snapshots", ids.len());
        Ok(ids)
    }
}
