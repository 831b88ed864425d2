//! # Transaction Writer
//!
//! Persists one transaction (header, lines, stock mutations) as a single
//! SQLite transaction.
//!
//! ## Unit of Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │   1. next_sequence(kind, date)          ── upsert, takes write lock     │
//! │   2. INSERT header (number = PFX-YYYYMMDD-NNNN)                         │
//! │        └─ number taken? bump the sequence once and retry                │
//! │   3. stock mutations (compare-and-swap on version)                      │
//! │        └─ version moved? ──► Conflict, ROLLBACK                         │
//! │   4. INSERT lines 1..=N                                                 │
//! │        └─ stage() returns here: PendingWrite                            │
//! │  COMMIT                     ◄── PendingWrite::commit                    │
//! │                                                                         │
//! │  Any error, or dropping the stage future or the PendingWrite ──►        │
//! │  ROLLBACK                                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Staging and committing are separate calls so a caller can bound the
//! statements by a deadline without also bounding COMMIT. A commit future
//! dropped midway may still have landed, so `commit` should be awaited to
//! completion.
//!
//! The unit of work contains writes only. The bulk reads already happened on
//! other pooled connections under the stock row locks, so SQLite's single
//! writer lock is held just for these statements.

use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction as DbTransaction};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::stock::apply_mutation;
use crate::repository::transaction::{insert_header, insert_line, next_sequence};
use stockroom_core::numbering::format_transaction_number;
use stockroom_core::{
    StagedStock, StockLevel, Transaction, TransactionDraft, TransactionHeader, TransactionLine,
};

/// What a successful write produced.
#[derive(Debug, Clone)]
pub struct WriteOutcome {
    pub transaction: Transaction,
    /// Post-commit rows for every touched (item, location), in item order.
    pub stock_levels: Vec<StockLevel>,
    /// Transaction numbers regenerated after a collision (0 or 1).
    pub number_retries: u32,
}

/// A unit of work with every statement executed and COMMIT not yet issued.
/// Dropping it rolls the whole write back.
pub struct PendingWrite {
    tx: DbTransaction<'static, Sqlite>,
    outcome: WriteOutcome,
}

impl std::fmt::Debug for PendingWrite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingWrite")
            .field("transaction_number", &self.transaction_number())
            .finish_non_exhaustive()
    }
}

impl PendingWrite {
    pub fn transaction_number(&self) -> &str {
        &self.outcome.transaction.header.transaction_number
    }

    /// Issues COMMIT and hands back what was written.
    pub async fn commit(self) -> DbResult<WriteOutcome> {
        let PendingWrite { tx, outcome } = self;
        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        debug!(
            number = %outcome.transaction.header.transaction_number,
            lines = outcome.transaction.lines.len(),
            stock_rows = outcome.stock_levels.len(),
            "Unit of work committed"
        );
        Ok(outcome)
    }
}

/// Writes drafts and their staged stock mutations atomically.
#[derive(Debug, Clone)]
pub struct TransactionWriter {
    pool: SqlitePool,
}

impl TransactionWriter {
    pub fn new(pool: SqlitePool) -> Self {
        TransactionWriter { pool }
    }

    /// Commits `draft` together with `staged`, or nothing at all.
    pub async fn write(&self, draft: &TransactionDraft, staged: &StagedStock) -> DbResult<WriteOutcome> {
        self.stage(draft, staged).await?.commit().await
    }

    /// Runs every statement of the write inside an open transaction.
    pub async fn stage(&self, draft: &TransactionDraft, staged: &StagedStock) -> DbResult<PendingWrite> {
        let now = Utc::now();
        let transaction_id = Uuid::new_v4().to_string();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        // 1-2. number + header, with one regeneration on collision
        let mut number_retries = 0;
        let header = loop {
            let sequence = next_sequence(&mut tx, draft.kind, draft.transaction_date).await?;
            let number = format_transaction_number(draft.kind, draft.transaction_date, sequence);
            let header = build_header(&transaction_id, number, draft, now);

            match insert_header(&mut tx, &header).await {
                Ok(()) => break header,
                Err(e) if e.is_unique_violation_on("transaction_number") => {
                    if number_retries > 0 {
                        warn!(number = %header.transaction_number, "Transaction number collided twice");
                        return Err(DbError::conflict("transaction number", header.transaction_number));
                    }
                    warn!(number = %header.transaction_number, "Transaction number taken, regenerating");
                    number_retries += 1;
                }
                Err(e) => return Err(e),
            }
        };

        debug!(number = %header.transaction_number, "Header inserted");

        // 3. stock
        for mutation in &staged.mutations {
            apply_mutation(&mut tx, mutation, now).await?;
        }

        // 4. lines
        let lines: Vec<TransactionLine> = draft
            .lines
            .iter()
            .map(|line| TransactionLine {
                id: Uuid::new_v4().to_string(),
                transaction_id: transaction_id.clone(),
                line_number: line.line_number,
                item_id: line.item_id.clone(),
                quantity: line.quantity,
                unit_price_cents: line.unit_price_cents,
                tax_rate_bps: line.tax_rate_bps,
                discount_cents: line.discount_cents,
                subtotal_cents: line.subtotal_cents,
                tax_cents: line.tax_cents,
                line_total_cents: line.line_total_cents,
                condition: line.condition,
                created_at: now,
            })
            .collect();
        for line in &lines {
            insert_line(&mut tx, line).await?;
        }

        let stock_levels = staged
            .mutations
            .iter()
            .map(|m| {
                let mut level = m.to_level();
                level.updated_at = now;
                level
            })
            .collect();

        Ok(PendingWrite {
            tx,
            outcome: WriteOutcome {
                transaction: Transaction { header, lines },
                stock_levels,
                number_retries,
            },
        })
    }
}

fn build_header(
    id: &str,
    transaction_number: String,
    draft: &TransactionDraft,
    now: chrono::DateTime<Utc>,
) -> TransactionHeader {
    TransactionHeader {
        id: id.to_string(),
        transaction_number,
        kind: draft.kind,
        status: draft.status,
        location_id: draft.location_id.clone(),
        counterparty_id: draft.counterparty_id.clone(),
        transaction_date: draft.transaction_date,
        subtotal_cents: draft.totals.subtotal.cents(),
        discount_cents: draft.totals.discount.cents(),
        tax_cents: draft.totals.tax.cents(),
        total_cents: draft.totals.total.cents(),
        paid_amount_cents: draft.paid_amount_cents,
        rental: draft.rental.clone(),
        notes: draft.notes.clone(),
        created_at: now,
        updated_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::NaiveDate;
    use std::collections::HashMap;
    use stockroom_core::{
        allocate, validate_batch, Counterparty, CreateTransactionRequest, Item, ItemStatus,
        LineRequest, Location, StockLevel, TransactionKind, TransactionStatus,
    };

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 15).unwrap()
    }

    async fn seeded() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.locations()
            .insert(&Location {
                id: "loc-1".into(),
                name: "Main".into(),
            })
            .await
            .unwrap();
        db.customers()
            .insert(&Counterparty {
                id: "cust-1".into(),
                name: "Dana".into(),
            })
            .await
            .unwrap();
        db.items()
            .insert(&Item {
                id: "drill".into(),
                name: "Drill".into(),
                is_rentable: true,
                is_saleable: false,
                status: ItemStatus::Active,
            })
            .await
            .unwrap();
        db.stock().set_level("drill", "loc-1", 10, 0).await.unwrap();
        db
    }

    fn rental(qty: i64) -> CreateTransactionRequest {
        CreateTransactionRequest {
            kind: TransactionKind::Rental,
            counterparty_id: "cust-1".into(),
            location_id: "loc-1".into(),
            transaction_date: date(),
            items: vec![LineRequest::new("drill", qty, 1500)],
            expected_return_date: None,
            paid_amount_cents: None,
            notes: None,
        }
    }

    async fn prepare(
        db: &Database,
        req: &CreateTransactionRequest,
    ) -> (TransactionDraft, StagedStock) {
        let items = db.items().find_many(["drill"]).await.unwrap();
        let stock: HashMap<String, StockLevel> =
            db.stock().find_for_items("loc-1", ["drill"]).await.unwrap();
        let batch = validate_batch(req.kind, &req.location_id, &req.items, &items, &stock).unwrap();
        let staged = allocate(&batch).unwrap();
        (TransactionDraft::build(req, &batch), staged)
    }

    #[tokio::test]
    async fn test_write_commits_everything() {
        let db = seeded().await;
        let (draft, staged) = prepare(&db, &rental(4)).await;

        let outcome = db.writer().write(&draft, &staged).await.unwrap();
        let header = &outcome.transaction.header;
        assert_eq!(header.transaction_number, "REN-20260115-0001");
        assert_eq!(header.status, TransactionStatus::InProgress);
        assert_eq!(outcome.number_retries, 0);
        assert_eq!(outcome.stock_levels[0].quantity_reserved, 4);

        let stored = db
            .transactions()
            .get_by_number("REN-20260115-0001")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.lines.len(), 1);
        assert_eq!(stored.header.counterparty_id, "cust-1");
        assert_eq!(stored.header.total_cents, 6000);

        let level = db.stock().get("drill", "loc-1").await.unwrap().unwrap();
        assert_eq!(level.quantity_reserved, 4);
        assert_eq!(level.version, 2);
    }

    #[tokio::test]
    async fn test_stale_snapshot_rolls_back() {
        let db = seeded().await;
        let (draft, staged) = prepare(&db, &rental(4)).await;

        // someone moves the row on after the snapshot was taken
        db.stock().set_level("drill", "loc-1", 10, 1).await.unwrap();

        let err = db.writer().write(&draft, &staged).await.unwrap_err();
        assert!(matches!(err, DbError::Conflict { .. }));

        assert_eq!(db.transactions().count().await.unwrap(), 0);
        let level = db.stock().get("drill", "loc-1").await.unwrap().unwrap();
        assert_eq!(level.quantity_reserved, 1);

        // the counter rolled back with everything else
        let (draft, staged) = prepare(&db, &rental(1)).await;
        let outcome = db.writer().write(&draft, &staged).await.unwrap();
        assert_eq!(outcome.transaction.header.transaction_number, "REN-20260115-0001");
    }

    #[tokio::test]
    async fn test_dropped_pending_write_leaves_nothing() {
        let db = seeded().await;
        let (draft, staged) = prepare(&db, &rental(4)).await;

        let pending = db.writer().stage(&draft, &staged).await.unwrap();
        assert_eq!(pending.transaction_number(), "REN-20260115-0001");
        drop(pending);

        assert_eq!(db.transactions().count().await.unwrap(), 0);
        let level = db.stock().get("drill", "loc-1").await.unwrap().unwrap();
        assert_eq!(level.quantity_reserved, 0);
        assert_eq!(level.version, 1);

        let outcome = db.writer().write(&draft, &staged).await.unwrap();
        assert_eq!(outcome.transaction.header.transaction_number, "REN-20260115-0001");
    }

    #[tokio::test]
    async fn test_taken_number_is_regenerated_once() {
        let db = seeded().await;

        // a header carrying the number the counter will hand out next,
        // written without touching the counter
        let (draft, _) = prepare(&db, &rental(1)).await;
        let squatter = build_header("squatter", "REN-20260115-0001".into(), &draft, Utc::now());
        let mut conn = db.pool().acquire().await.unwrap();
        insert_header(&mut conn, &squatter).await.unwrap();
        drop(conn);

        let (draft, staged) = prepare(&db, &rental(2)).await;
        let outcome = db.writer().write(&draft, &staged).await.unwrap();
        assert_eq!(outcome.number_retries, 1);
        assert_eq!(outcome.transaction.header.transaction_number, "REN-20260115-0002");
    }
}
