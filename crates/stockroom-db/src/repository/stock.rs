//! # Stock Ledger Repository
//!
//! Reads and writes of `stock_levels`, one row per (item, location).
//!
//! ## Write Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  StagedMutation { expected_version: Some(7), new_reserved: 6, .. }      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  UPDATE stock_levels                                                    │
//! │     SET quantity_on_hand = ?, quantity_reserved = ?, version = 8, ...  │
//! │   WHERE item_id = ? AND location_id = ? AND version = 7                 │
//! │       │                                                                 │
//! │       ├── 1 row  ──► applied                                            │
//! │       └── 0 rows ──► DbError::Conflict (someone else wrote the row)     │
//! │                                                                         │
//! │  StagedMutation { expected_version: None, .. }                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  INSERT INTO stock_levels ... (duplicate key ──► DbError::Conflict)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The CHECK constraints on the table reject any row with
//! `reserved > on_hand` no matter who writes it.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::{debug, warn};

use crate::error::{DbError, DbResult};
use stockroom_core::{StagedMutation, StockLevel};

const STOCK_COLUMNS: &str =
    "item_id, location_id, quantity_on_hand, quantity_reserved, version, updated_at";

/// Repository for the stock ledger.
#[derive(Debug, Clone)]
pub struct StockRepository {
    pool: SqlitePool,
}

impl StockRepository {
    /// Creates a new StockRepository.
    pub fn new(pool: SqlitePool) -> Self {
        StockRepository { pool }
    }

    /// Reads one stock row.
    pub async fn get(&self, item_id: &str, location_id: &str) -> DbResult<Option<StockLevel>> {
        let sql = format!(
            "SELECT {STOCK_COLUMNS} FROM stock_levels WHERE item_id = ?1 AND location_id = ?2"
        );
        let level = sqlx::query_as::<_, StockLevel>(&sql)
            .bind(item_id)
            .bind(location_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(level)
    }

    /// Reads the rows for many items at one location in one query.
    ///
    /// Keyed by item id; items without a row are absent.
    pub async fn find_for_items<'a, I>(
        &self,
        location_id: &str,
        item_ids: I,
    ) -> DbResult<HashMap<String, StockLevel>>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let ids: BTreeSet<&str> = item_ids.into_iter().collect();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT ");
        qb.push(STOCK_COLUMNS);
        qb.push(" FROM stock_levels WHERE location_id = ");
        qb.push_bind(location_id);
        qb.push(" AND item_id IN (");
        let mut separated = qb.separated(", ");
        for id in &ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");

        let levels: Vec<StockLevel> = qb.build_query_as().fetch_all(&self.pool).await?;

        debug!(
            location_id = %location_id,
            requested = ids.len(),
            found = levels.len(),
            "Bulk stock lookup"
        );
        Ok(levels
            .into_iter()
            .map(|l| (l.item_id.clone(), l))
            .collect())
    }

    /// Sets absolute quantities for a row, creating it if needed.
    ///
    /// For seeding and stock counts; the transaction path never calls this.
    pub async fn set_level(
        &self,
        item_id: &str,
        location_id: &str,
        on_hand: i64,
        reserved: i64,
    ) -> DbResult<StockLevel> {
        debug!(item_id, location_id, on_hand, reserved, "Setting stock level");

        let sql = format!(
            r#"
            INSERT INTO stock_levels ({STOCK_COLUMNS})
            VALUES (?1, ?2, ?3, ?4, 1, ?5)
            ON CONFLICT (item_id, location_id) DO UPDATE SET
                quantity_on_hand = excluded.quantity_on_hand,
                quantity_reserved = excluded.quantity_reserved,
                version = stock_levels.version + 1,
                updated_at = excluded.updated_at
            RETURNING {STOCK_COLUMNS}
            "#
        );
        let level = sqlx::query_as::<_, StockLevel>(&sql)
            .bind(item_id)
            .bind(location_id)
            .bind(on_hand)
            .bind(reserved)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await?;
        Ok(level)
    }
}

/// Applies one staged mutation on the writer's connection.
///
/// Runs inside the writer's database transaction; a `Conflict` here makes
/// the writer roll the whole unit back.
pub(crate) async fn apply_mutation(
    conn: &mut SqliteConnection,
    mutation: &StagedMutation,
    now: DateTime<Utc>,
) -> DbResult<()> {
    let row_id = format!("{}@{}", mutation.item_id, mutation.location_id);

    match mutation.expected_version {
        Some(expected) => {
            let result = sqlx::query(
                r#"
                UPDATE stock_levels
                SET quantity_on_hand = ?1,
                    quantity_reserved = ?2,
                    version = ?3,
                    updated_at = ?4
                WHERE item_id = ?5 AND location_id = ?6 AND version = ?7
                "#,
            )
            .bind(mutation.new_on_hand)
            .bind(mutation.new_reserved)
            .bind(mutation.new_version())
            .bind(now)
            .bind(&mutation.item_id)
            .bind(&mutation.location_id)
            .bind(expected)
            .execute(&mut *conn)
            .await?;

            if result.rows_affected() == 0 {
                warn!(row = %row_id, expected_version = expected, "Stock row version mismatch");
                return Err(DbError::conflict("stock level", row_id));
            }
        }
        None => {
            let inserted = sqlx::query(
                r#"
                INSERT INTO stock_levels (
                    item_id, location_id, quantity_on_hand, quantity_reserved, version, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )
            .bind(&mutation.item_id)
            .bind(&mutation.location_id)
            .bind(mutation.new_on_hand)
            .bind(mutation.new_reserved)
            .bind(mutation.new_version())
            .bind(now)
            .execute(&mut *conn)
            .await;

            match inserted {
                Ok(_) => {}
                Err(e) => {
                    let err = DbError::from(e);
                    if err.is_unique_violation_on("stock_levels") {
                        warn!(row = %row_id, "Stock row appeared after snapshot");
                        return Err(DbError::conflict("stock level", row_id));
                    }
                    return Err(err);
                }
            }
        }
    }

    Ok(())
}
