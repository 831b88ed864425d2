//! # Transaction Processor
//!
//! Runs one request through validation, allocation and the write, holding
//! the stock rows it touches for the whole pass.
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create_rental / create_purchase ──► process(CreateTransactionRequest)  │
//! │                                                                         │
//! │  RECEIVED                                                               │
//! │     │                                                                   │
//! │  VALIDATING                                                             │
//! │     ├─ request fields (ids, dates, notes, line count)                   │
//! │     ├─ counterparty + location exist                                    │
//! │     ├─ lock (item, location) rows, sorted        ◄── held until the end │
//! │     ├─ items.find_many(ids)            one query                        │
//! │     ├─ stock.find_for_items(loc, ids)  one query                        │
//! │     └─ validate_batch ──────────────────────────► VALIDATION_FAILED     │
//! │     │                                                                   │
//! │  ALLOCATING                                                             │
//! │     └─ allocate(batch) ─────────────────────────► ALLOCATION_FAILED     │
//! │     │                                                                   │
//! │  WRITING                                                                │
//! │     ├─ TransactionWriter::stage ────────────────► WRITE_FAILED          │
//! │     │        ─ ─ ─ ─ deadline checked here ─ ─ ─ ─                      │
//! │     └─ PendingWrite::commit ────────────────────► WRITE_FAILED          │
//! │     │                                                                   │
//! │  COMMITTED                                                              │
//! │                                                                         │
//! │  request_timeout elapsed before COMMIT ──► current stage's failure      │
//! │  state, the open write rolls back and the row locks are released.       │
//! │  Once COMMIT is issued the request always reports its real outcome.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing is retried here. A failed request left no trace in storage, so
//! the caller can simply resubmit it.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info, warn};

use stockroom_core::numbering::validate_transaction_number;
use stockroom_core::{
    allocate, validate_batch, validate_request, CreateTransactionRequest, ProcessingState,
    PurchaseRequest, RentalRequest, StockLevel, Transaction, TransactionDraft, TransactionHeader,
    TransactionKind,
};
use stockroom_db::{Database, PendingWrite, StockLockSet};

use crate::config::{EngineConfig, ProcessingSettings};
use crate::error::{EngineError, ProcessFailure, TransactionError};
use crate::metrics::ProcessorMetrics;

/// A committed request.
#[derive(Debug, Clone, Serialize)]
pub struct CommittedTransaction {
    pub transaction: Transaction,
    /// Post-commit level of every touched (item, location), in item order.
    pub stock_levels: Vec<StockLevel>,
    pub state: ProcessingState,
    /// Transaction numbers regenerated after a collision (0 or 1).
    pub number_retries: u32,
}

impl CommittedTransaction {
    pub fn transaction_number(&self) -> &str {
        &self.transaction.header.transaction_number
    }

    pub fn stock_level(&self, item_id: &str) -> Option<&StockLevel> {
        self.stock_levels.iter().find(|l| l.item_id == item_id)
    }
}

pub type ProcessResult = Result<CommittedTransaction, ProcessFailure>;

/// Creates rentals and purchases. Cheap to clone; clones share the
/// database, the row locks and the metrics.
#[derive(Debug, Clone)]
pub struct TransactionProcessor {
    db: Database,
    settings: ProcessingSettings,
    metrics: Arc<ProcessorMetrics>,
}

impl TransactionProcessor {
    pub fn new(db: Database, settings: ProcessingSettings) -> Self {
        TransactionProcessor {
            db,
            settings,
            metrics: Arc::new(ProcessorMetrics::new()),
        }
    }

    /// Opens (and migrates) the configured database.
    pub async fn connect(config: &EngineConfig) -> Result<Self, EngineError> {
        let db = Database::new(config.to_db_config()?).await?;
        Ok(Self::new(db, config.processing.clone()))
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn settings(&self) -> &ProcessingSettings {
        &self.settings
    }

    pub fn metrics(&self) -> &ProcessorMetrics {
        &self.metrics
    }

    // =========================================================================
    // Entry Points
    // =========================================================================

    pub async fn create_rental(&self, req: RentalRequest) -> ProcessResult {
        self.process(req.into()).await
    }

    pub async fn create_purchase(&self, req: PurchaseRequest) -> ProcessResult {
        self.process(req.into()).await
    }

    /// Runs one request to a terminal state within `request_timeout`.
    pub async fn process(&self, req: CreateTransactionRequest) -> ProcessResult {
        let started = Instant::now();
        self.metrics.record_received();

        let progress = Progress::default();
        let timeout = self.settings.request_timeout();
        let deadline = tokio::time::Instant::now() + timeout;

        let result = match tokio::time::timeout_at(deadline, self.prepare(&req, &progress)).await {
            Ok(Ok(prepared)) if tokio::time::Instant::now() >= deadline => {
                // staged but never committed
                drop(prepared);
                Err(self.timed_out(&req, &progress, timeout))
            }
            Ok(Ok(prepared)) => self.commit(prepared, &progress).await,
            Ok(Err(failure)) => Err(failure),
            // the prepare future is gone: its write rolled back, its locks are free
            Err(_) => Err(self.timed_out(&req, &progress, timeout)),
        };

        match &result {
            Ok(committed) => {
                self.metrics.record_committed(started.elapsed(), committed.number_retries);
                let header = &committed.transaction.header;
                info!(
                    transaction_number = %header.transaction_number,
                    kind = %header.kind,
                    lines = committed.transaction.lines.len(),
                    total_cents = header.total_cents,
                    "Transaction committed"
                );
            }
            Err(failure) => {
                self.metrics.record_failure(failure.state);
                warn!(
                    kind = %req.kind,
                    state = %failure.state,
                    error_kind = %failure.kind(),
                    lines = failure.error.line_errors().len(),
                    "Transaction rejected: {}",
                    failure.error
                );
            }
        }

        result
    }

    fn timed_out(
        &self,
        req: &CreateTransactionRequest,
        progress: &Progress,
        timeout: Duration,
    ) -> ProcessFailure {
        let state = progress.terminal_failure();
        self.metrics.record_timeout();
        warn!(
            kind = %req.kind,
            state = %state,
            timeout_ms = timeout.as_millis() as u64,
            "Request timed out"
        );
        ProcessFailure::new(state, TransactionError::TimedOut(timeout))
    }

    /// Everything up to (not including) COMMIT. Runs under the deadline.
    async fn prepare(
        &self,
        req: &CreateTransactionRequest,
        progress: &Progress,
    ) -> Result<Prepared, ProcessFailure> {
        progress.advance(ProcessingState::Validating)?;

        validate_request(req, self.settings.max_lines)
            .map_err(|e| progress.fail(TransactionError::InvalidRequest(e)))?;
        self.check_references(req)
            .await
            .map_err(|e| progress.fail(e))?;

        let item_ids: BTreeSet<&str> = req.items.iter().map(|l| l.item_id.as_str()).collect();
        // owned Vec iterators (not `iter().copied()`) keep this future provably `Send`
        let item_ids: Vec<&str> = item_ids.into_iter().collect();
        let locks = self
            .db
            .locks()
            .lock_items(&req.location_id, item_ids.clone())
            .await;
        debug!(rows = locks.keys().len(), "Stock rows locked");

        let items = self
            .db
            .items()
            .find_many(item_ids.clone())
            .await
            .map_err(|e| progress.fail(e.into()))?;
        self.metrics.record_storage_read();

        let stock = self
            .db
            .stock()
            .find_for_items(&req.location_id, item_ids.clone())
            .await
            .map_err(|e| progress.fail(e.into()))?;
        self.metrics.record_storage_read();

        let batch = validate_batch(req.kind, &req.location_id, &req.items, &items, &stock)
            .map_err(|errors| progress.fail(TransactionError::Rejected(errors)))?;

        progress.advance(ProcessingState::Allocating)?;
        let staged = allocate(&batch).map_err(|e| progress.fail(e.into()))?;
        let draft = TransactionDraft::build(req, &batch);

        progress.advance(ProcessingState::Writing)?;
        let pending = self
            .db
            .writer()
            .stage(&draft, &staged)
            .await
            .map_err(|e| progress.fail(e.into()))?;

        Ok(Prepared { pending, locks })
    }

    /// Issues COMMIT. Not bounded by the deadline: a COMMIT cut short may
    /// still land, and the caller must then hear about it.
    async fn commit(&self, prepared: Prepared, progress: &Progress) -> ProcessResult {
        let Prepared { pending, locks } = prepared;
        let outcome = pending
            .commit()
            .await
            .map_err(|e| progress.fail(e.into()))?;
        let state = progress.advance(ProcessingState::Committed)?;
        drop(locks);

        Ok(CommittedTransaction {
            transaction: outcome.transaction,
            stock_levels: outcome.stock_levels,
            state,
            number_retries: outcome.number_retries,
        })
    }

    /// The counterparty for the kind and the location must both exist.
    async fn check_references(&self, req: &CreateTransactionRequest) -> Result<(), TransactionError> {
        let role = req.kind.counterparty_role();

        let found = self
            .db
            .counterparties(role)
            .exists(&req.counterparty_id)
            .await?;
        self.metrics.record_storage_read();
        if !found {
            return Err(TransactionError::not_found(role.as_str(), &req.counterparty_id));
        }

        let found = self.db.locations().exists(&req.location_id).await?;
        self.metrics.record_storage_read();
        if !found {
            return Err(TransactionError::not_found("Location", &req.location_id));
        }

        Ok(())
    }

    // =========================================================================
    // Read-back
    // =========================================================================

    pub async fn get_transaction(&self, id: &str) -> Result<Transaction, TransactionError> {
        self.db
            .transactions()
            .get_by_id(id)
            .await?
            .ok_or_else(|| TransactionError::not_found("Transaction", id))
    }

    /// A malformed number is rejected before any lookup.
    pub async fn get_by_number(&self, number: &str) -> Result<Transaction, TransactionError> {
        validate_transaction_number(number)?;
        self.db
            .transactions()
            .get_by_number(number)
            .await?
            .ok_or_else(|| TransactionError::not_found("Transaction", number))
    }

    pub async fn list_transactions(
        &self,
        kind: TransactionKind,
        date: NaiveDate,
    ) -> Result<Vec<TransactionHeader>, TransactionError> {
        Ok(self.db.transactions().list_by_date(kind, date).await?)
    }

    /// Current level of a row; a pair that never held stock reads as empty.
    pub async fn stock_level(
        &self,
        item_id: &str,
        location_id: &str,
    ) -> Result<StockLevel, TransactionError> {
        let level = self.db.stock().get(item_id, location_id).await?;
        Ok(level.unwrap_or_else(|| StockLevel::empty(item_id, location_id)))
    }
}

/// A staged write and the row locks guarding it.
struct Prepared {
    pending: PendingWrite,
    locks: StockLockSet,
}

// =============================================================================
// Progress
// =============================================================================

/// The state of one in-flight request, readable after a timeout dropped it.
#[derive(Debug, Default)]
struct Progress(Mutex<ProcessingState>);

impl Progress {
    fn current(&self) -> ProcessingState {
        *self.0.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn advance(&self, next: ProcessingState) -> Result<ProcessingState, ProcessFailure> {
        let mut state = self.0.lock().unwrap_or_else(|p| p.into_inner());
        match state.advance(next) {
            Ok(advanced) => {
                debug!(from = %*state, to = %advanced, "State transition");
                *state = advanced;
                Ok(advanced)
            }
            Err(e) => {
                tracing::error!(error = %e, "Illegal processing transition");
                Err(ProcessFailure::new(
                    *state,
                    TransactionError::Internal(e.to_string()),
                ))
            }
        }
    }

    /// Moves to the current stage's failure state and wraps `error`.
    fn fail(&self, error: TransactionError) -> ProcessFailure {
        let mut state = self.0.lock().unwrap_or_else(|p| p.into_inner());
        let terminal = failure_of(*state);
        debug!(from = %*state, to = %terminal, "State transition");
        *state = terminal;
        ProcessFailure::new(terminal, error)
    }

    fn terminal_failure(&self) -> ProcessingState {
        failure_of(self.current())
    }
}

fn failure_of(state: ProcessingState) -> ProcessingState {
    match state.fail() {
        Ok(terminal) => terminal,
        // nothing has been looked at yet
        Err(_) if state == ProcessingState::Received => ProcessingState::ValidationFailed,
        Err(_) => state,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_fails_into_the_current_stage() {
        let progress = Progress::default();
        progress.advance(ProcessingState::Validating).unwrap();
        progress.advance(ProcessingState::Allocating).unwrap();

        let failure = progress.fail(TransactionError::Internal("boom".into()));
        assert_eq!(failure.state, ProcessingState::AllocationFailed);
        assert_eq!(progress.current(), ProcessingState::AllocationFailed);
    }

    #[test]
    fn test_progress_refuses_skipping_stages() {
        let progress = Progress::default();
        let failure = progress.advance(ProcessingState::Writing).unwrap_err();
        assert!(matches!(failure.error, TransactionError::Internal(_)));
        assert_eq!(progress.current(), ProcessingState::Received);
    }

    #[test]
    fn test_timeout_before_validation_counts_as_validation_failure() {
        assert_eq!(failure_of(ProcessingState::Received), ProcessingState::ValidationFailed);
        assert_eq!(failure_of(ProcessingState::Writing), ProcessingState::WriteFailed);
    }
}
