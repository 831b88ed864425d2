//! # Schema Migrations
//!
//! The SQL under `migrations/sqlite/` is compiled into the binary and applied
//! on [`Database::new`](crate::Database::new) or by `stockroom migrate`.
//!
//! ```text
//! migrations/sqlite/
//! └── 001_initial_schema.sql   master data, stock ledger, sequences,
//!                              transactions + lines, CHECK constraints
//!
//! _sqlx_migrations  (bookkeeping, created by the first run)
//!   version │ description     │ success │ checksum
//!   ────────┼─────────────────┼─────────┼─────────
//!         1 │ initial schema  │       1 │ ...
//! ```
//!
//! New changes go in a new `NNN_description.sql`; applied files are never
//! edited, since the checksum is verified on every run. The writer depends on
//! the `stock_levels` CHECK constraints, so later migrations must keep them.

use std::collections::BTreeSet;

use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Embedded migrations compared with what the database has recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatus {
    pub total: usize,
    pub applied: usize,
    /// Embedded versions not yet applied, ascending.
    pub pending: Vec<i64>,
}

impl MigrationStatus {
    pub fn is_current(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Applies every pending migration in version order. Idempotent.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    let before = migration_status(pool).await?;
    if before.is_current() {
        debug!(applied = before.applied, "Schema is current");
        return Ok(());
    }

    info!(pending = ?before.pending, "Applying migrations");
    MIGRATOR.run(pool).await?;
    info!(count = before.pending.len(), "Migrations applied");
    Ok(())
}

/// Reads the bookkeeping table. A database that was never migrated has no
/// such table and reports everything as pending; any other failure is an
/// error.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<MigrationStatus> {
    let has_table: bool = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = '_sqlx_migrations'",
    )
    .fetch_one(pool)
    .await?
        != 0;

    let applied: BTreeSet<i64> = if has_table {
        sqlx::query_scalar::<_, i64>("SELECT version FROM _sqlx_migrations WHERE success = 1")
            .fetch_all(pool)
            .await?
            .into_iter()
            .collect()
    } else {
        BTreeSet::new()
    };

    let mut pending: Vec<i64> = MIGRATOR
        .iter()
        .map(|m| m.version)
        .filter(|v| !applied.contains(v))
        .collect();
    pending.sort_unstable();

    Ok(MigrationStatus {
        total: MIGRATOR.iter().count(),
        applied: applied.len(),
        pending,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    #[tokio::test]
    async fn test_fresh_database_reports_everything_pending() {
        let db = Database::new(DbConfig::in_memory().run_migrations(false))
            .await
            .unwrap();

        let status = migration_status(db.pool()).await.unwrap();
        assert_eq!(status.total, 1);
        assert_eq!(status.applied, 0);
        assert_eq!(status.pending, vec![1]);
        assert!(!status.is_current());
    }

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.run_migrations().await.unwrap();

        let status = migration_status(db.pool()).await.unwrap();
        assert_eq!(status.applied, 1);
        assert!(status.is_current());
    }

    #[tokio::test]
    async fn test_status_propagates_query_failures() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.close().await;

        assert!(migration_status(db.pool()).await.is_err());
    }
}
